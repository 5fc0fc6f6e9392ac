//! Curation document schema
//!
//! A curation is the detailed clinical evidence record and final verdict for
//! a gene-disease relationship. Uniqueness over (approved_symbol, disease,
//! inheritance) is enforced by a pre-write query in the store, not by a
//! unique index; the compound index here only serves the lookup.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutTimestamps};
use crate::db::schemas::{RecordData, RecordDocument};
use crate::schema::EntityType;

/// Collection name for curations
pub const CURATION_COLLECTION: &str = "curations";

/// Curation document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CurationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Schema fields and system fields
    #[serde(flatten)]
    pub record: RecordData,
}

impl IntoIndexes for CurationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "approved_symbol": 1, "disease": 1, "inheritance": 1 },
                Some(
                    IndexOptions::builder()
                        .name("natural_key_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "hgnc_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("hgnc_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutTimestamps for CurationDoc {
    fn set_created_at(&mut self, at: DateTime) {
        self.record.created_at = Some(at);
    }

    fn set_updated_at(&mut self, at: DateTime) {
        self.record.updated_at = Some(at);
    }
}

impl RecordDocument for CurationDoc {
    const COLLECTION: &'static str = CURATION_COLLECTION;
    const ENTITY: EntityType = EntityType::Curation;
    const LABEL: &'static str = "Curation";

    fn from_record(record: RecordData) -> Self {
        Self { _id: None, record }
    }

    fn id(&self) -> Option<ObjectId> {
        self._id
    }

    fn record(&self) -> &RecordData {
        &self.record
    }

    fn record_mut(&mut self) -> &mut RecordData {
        &mut self.record
    }
}
