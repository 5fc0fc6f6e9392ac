//! Precuration document schema
//!
//! A precuration is the preliminary lump/split classification for a gene,
//! referencing its gene by natural key (approved symbol or HGNC ID).

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutTimestamps};
use crate::db::schemas::{RecordData, RecordDocument};
use crate::schema::EntityType;

/// Collection name for precurations
pub const PRECURATION_COLLECTION: &str = "precurations";

/// Precuration document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PrecurationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Schema fields and system fields
    #[serde(flatten)]
    pub record: RecordData,
}

impl IntoIndexes for PrecurationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "approved_symbol": 1 },
                Some(
                    IndexOptions::builder()
                        .name("approved_symbol_index".to_string())
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

impl MutTimestamps for PrecurationDoc {
    fn set_created_at(&mut self, at: DateTime) {
        self.record.created_at = Some(at);
    }

    fn set_updated_at(&mut self, at: DateTime) {
        self.record.updated_at = Some(at);
    }
}

impl RecordDocument for PrecurationDoc {
    const COLLECTION: &'static str = PRECURATION_COLLECTION;
    const ENTITY: EntityType = EntityType::Precuration;
    const LABEL: &'static str = "Precuration";

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
