//! Generic record store over a MongoDB collection
//!
//! One adapter per entity type, sharing the CRUD core. Semantics:
//! - `list` returns an id -> record map and treats an unreadable document as
//!   a fatal "document not found" error rather than skipping it
//! - `create` validates, stamps timestamps, and seeds the contributor list
//! - `update` validates, requires the target to exist, merges fields, and
//!   moves the editing user to the end of the contributor list
//! - `delete` is delete-if-exists and never fails on a missing id
//! - natural-key lookups come in two shapes: single-result (last snapshot
//!   match wins) and multi-result; they are distinct named operations

use bson::{doc, oid::ObjectId, DateTime};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::schemas::{
    merge_contributors, CurationDoc, GeneDoc, PrecurationDoc, RecordData, RecordDocument,
};
use crate::db::{MongoClient, MongoCollection};
use crate::schema::FieldSchema;
use crate::types::{CuratorError, Record, Result};
use crate::validation::validate_or_message;

/// Store adapter for gene records
pub type GeneStore = RecordStore<GeneDoc>;
/// Store adapter for precuration records
pub type PrecurationStore = RecordStore<PrecurationDoc>;
/// Store adapter for curation records
pub type CurationStore = RecordStore<CurationDoc>;

/// CRUD adapter for one record collection
pub struct RecordStore<T: RecordDocument> {
    collection: MongoCollection<T>,
}

impl<T: RecordDocument> RecordStore<T> {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo.collection::<T>(T::COLLECTION).await?,
        })
    }

    fn not_found() -> CuratorError {
        CuratorError::NotFound(format!("{} document not found", T::LABEL))
    }

    /// Fetch all records as an id -> record map
    pub async fn list(&self) -> Result<BTreeMap<String, Value>> {
        let docs = self.collection.find_many(doc! {}).await?;

        let mut records = BTreeMap::new();
        for item in docs {
            let id = item.id().ok_or_else(Self::not_found)?;
            records.insert(id.to_hex(), item.record().to_json(Some(id)));
        }

        Ok(records)
    }

    /// Fetch a single record by id
    pub async fn get(&self, id: &str) -> Result<Value> {
        let item = self.fetch(id).await?;
        Ok(item.record().to_json(item.id()))
    }

    /// Validate and persist a new record; returns the new document id
    pub async fn create(&self, data: Record, user_id: &str, schema: &FieldSchema) -> Result<String> {
        validate_or_message(&data, schema).map_err(CuratorError::Validation)?;

        let mut record = RecordData::from_fields(data);
        record.users = vec![user_id.to_string()];

        let id = self.collection.insert_one(T::from_record(record)).await?;
        debug!("created {} {}", T::ENTITY, id.to_hex());
        Ok(id.to_hex())
    }

    /// Validate and merge updated fields over an existing record
    pub async fn update(
        &self,
        id: &str,
        data: Record,
        user_id: &str,
        schema: &FieldSchema,
    ) -> Result<()> {
        validate_or_message(&data, schema).map_err(CuratorError::Validation)?;

        let mut item = self.fetch(id).await?;
        let oid = item.id().ok_or_else(Self::not_found)?;

        let record = item.record_mut();
        record.merge_fields(data);
        record.users = merge_contributors(std::mem::take(&mut record.users), user_id);
        record.updated_at = Some(DateTime::now());

        self.collection.replace_one(doc! { "_id": oid }, item).await
    }

    /// Remove a record if it exists; succeeds on a missing or malformed id
    pub async fn delete(&self, id: &str) -> Result<()> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(());
        };
        self.collection.delete_one(doc! { "_id": oid }).await
    }

    /// Mark a record approved by the given user
    pub async fn approve(&self, id: &str, user_id: &str) -> Result<Value> {
        let mut item = self.fetch(id).await?;
        let oid = item.id().ok_or_else(Self::not_found)?;

        let record = item.record_mut();
        record.approved_by = merge_contributors(std::mem::take(&mut record.approved_by), user_id);
        record.approved_at = Some(DateTime::now());
        record.updated_at = Some(DateTime::now());

        let json = record.to_json(Some(oid));
        self.collection
            .replace_one(doc! { "_id": oid }, item)
            .await?;
        Ok(json)
    }

    /// Look up a single record by approved symbol, falling back to HGNC ID.
    /// The last match in the snapshot wins, mirroring the original lookup.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Value>> {
        let mut found = self
            .collection
            .find_many(doc! { "approved_symbol": identifier })
            .await?
            .pop();

        if found.is_none() {
            found = self
                .collection
                .find_many(doc! { "hgnc_id": identifier })
                .await?
                .pop();
        }

        Ok(found.map(|item| item.record().to_json(item.id())))
    }

    /// Look up all records matching an approved symbol or HGNC ID
    pub async fn find_all_by_identifier(&self, identifier: &str) -> Result<Vec<Value>> {
        let mut matches = self
            .collection
            .find_many(doc! { "approved_symbol": identifier })
            .await?;
        matches.extend(
            self.collection
                .find_many(doc! { "hgnc_id": identifier })
                .await?,
        );

        Ok(matches
            .into_iter()
            .map(|item| item.record().to_json(item.id()))
            .collect())
    }

    async fn fetch(&self, id: &str) -> Result<T> {
        let oid = ObjectId::parse_str(id).map_err(|_| Self::not_found())?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(Self::not_found)
    }
}

impl RecordStore<CurationDoc> {
    /// Whether a curation with the same (approved_symbol, disease,
    /// inheritance) triple already exists.
    ///
    /// This is a pre-write query; two writers racing past it can both
    /// succeed. The backing index is deliberately non-unique so the store
    /// behaves as documented rather than masking the race.
    pub async fn duplicate_exists(
        &self,
        approved_symbol: &str,
        disease: &str,
        inheritance: &str,
    ) -> Result<bool> {
        let found = self
            .collection
            .find_one(doc! {
                "approved_symbol": approved_symbol,
                "disease": disease,
                "inheritance": inheritance,
            })
            .await?;
        Ok(found.is_some())
    }

    /// Create a curation, refusing when the natural-key triple is taken
    pub async fn create_unique(
        &self,
        data: Record,
        user_id: &str,
        schema: &FieldSchema,
    ) -> Result<String> {
        validate_or_message(&data, schema).map_err(CuratorError::Validation)?;

        let (symbol, disease, inheritance) = curation_natural_key(&data);

        if self
            .duplicate_exists(&symbol, &disease, &inheritance)
            .await?
        {
            return Err(CuratorError::Duplicate(
                "A curation with the same symbol, disease, and inheritance already exists."
                    .to_string(),
            ));
        }

        self.create(data, user_id, schema).await
    }
}

/// The uniqueness triple for a curation record
pub fn curation_natural_key(data: &Record) -> (String, String, String) {
    let field = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    (
        field("approved_symbol"),
        field("disease"),
        field("inheritance"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // CRUD paths against MongoDB are exercised by integration environments;
    // the pure pieces (validation, contributor merge, payload mapping) are
    // covered in their own modules. The natural-key triple that drives the
    // curation duplicate guard is pure and covered here.

    fn curation(symbol: &str, disease: &str, inheritance: &str) -> Record {
        let mut data = Record::new();
        data.insert("approved_symbol".to_string(), json!(symbol));
        data.insert("disease".to_string(), json!(disease));
        data.insert("inheritance".to_string(), json!(inheritance));
        data
    }

    #[test]
    fn test_identical_triples_collide() {
        let a = curation("PKD1", "MONDO:0004691", "AD");
        let b = curation("PKD1", "MONDO:0004691", "AD");
        assert_eq!(curation_natural_key(&a), curation_natural_key(&b));
    }

    #[test]
    fn test_differing_inheritance_does_not_collide() {
        let a = curation("PKD1", "MONDO:0004691", "AD");
        let b = curation("PKD1", "MONDO:0004691", "AR");
        assert_ne!(curation_natural_key(&a), curation_natural_key(&b));
    }

    #[test]
    fn test_missing_key_fields_map_to_empty() {
        let data = Record::new();
        assert_eq!(
            curation_natural_key(&data),
            (String::new(), String::new(), String::new())
        );
    }
}
