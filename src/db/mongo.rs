//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::StreamExt;
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::info;

use crate::types::CuratorError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for documents carrying creation/update timestamps
pub trait MutTimestamps {
    fn set_created_at(&mut self, at: DateTime);
    fn set_updated_at(&mut self, at: DateTime);
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, CuratorError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| CuratorError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| CuratorError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, CuratorError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, CuratorError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        // Apply indexes
        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), CuratorError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| CuratorError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping creation and update timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, CuratorError>
    where
        T: MutTimestamps,
    {
        let now = DateTime::now();
        item.set_created_at(now);
        item.set_updated_at(now);

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| CuratorError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| CuratorError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, CuratorError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| CuratorError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter.
    ///
    /// Unlike a best-effort scan, a document that cannot be read back
    /// mid-iteration is surfaced as an error to the caller.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, CuratorError> {
        let mut cursor = self
            .inner
            .find(filter)
            .await
            .map_err(|e| CuratorError::Database(format!("Find failed: {}", e)))?;

        let mut results = Vec::new();
        while let Some(item) = cursor.next().await {
            results.push(item.map_err(|e| {
                CuratorError::Database(format!("Error reading document: {}", e))
            })?);
        }

        Ok(results)
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, CuratorError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| CuratorError::Database(format!("Update failed: {}", e)))
    }

    /// Replace one document wholesale
    pub async fn replace_one(&self, filter: Document, replacement: T) -> Result<(), CuratorError> {
        self.inner
            .replace_one(filter, replacement)
            .await
            .map_err(|e| CuratorError::Database(format!("Replace failed: {}", e)))?;

        Ok(())
    }

    /// Delete one document; succeeds whether or not a document matched
    pub async fn delete_one(&self, filter: Document) -> Result<(), CuratorError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| CuratorError::Database(format!("Delete failed: {}", e)))?;

        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance
    // See docker-compose.dev.yml for local testing
}
