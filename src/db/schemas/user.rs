//! User document schema
//!
//! Stores user credentials and the role label consumed by route guards.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, MutTimestamps};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// User email address, the login identifier
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Assigned role
    #[serde(default)]
    pub role: Role,

    /// When the user registered
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// When the user record was last updated
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(email: String, password_hash: String, role: Role) -> Self {
        Self {
            _id: None,
            email,
            password_hash,
            role,
            created_at: None,
            updated_at: None,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutTimestamps for UserDoc {
    fn set_created_at(&mut self, at: DateTime) {
        self.created_at = Some(at);
    }

    fn set_updated_at(&mut self, at: DateTime) {
        self.updated_at = Some(at);
    }
}
