//! User store adapter
//!
//! Registration, login lookup, and the admin management surface.

use bson::{doc, oid::ObjectId, DateTime};
use tracing::info;

use crate::auth::Role;
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{CuratorError, Result};

/// CRUD adapter for the users collection
pub struct UserStore {
    collection: MongoCollection<UserDoc>,
}

impl UserStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo.collection::<UserDoc>(USER_COLLECTION).await?,
        })
    }

    fn not_found() -> CuratorError {
        CuratorError::NotFound("User document not found".to_string())
    }

    /// Number of registered users; drives default role assignment
    pub async fn count(&self) -> Result<u64> {
        self.collection
            .inner()
            .count_documents(doc! {})
            .await
            .map_err(|e| CuratorError::Database(format!("Count failed: {}", e)))
    }

    /// Register a new user; the email must be unused
    pub async fn create(&self, email: &str, password_hash: &str, role: Role) -> Result<String> {
        if self.find_by_email(email).await?.is_some() {
            return Err(CuratorError::Duplicate(
                "A user with this email already exists.".to_string(),
            ));
        }

        let user = UserDoc::new(email.to_string(), password_hash.to_string(), role);
        let id = self.collection.insert_one(user).await?;
        info!("registered user {} with role {}", email, role);
        Ok(id.to_hex())
    }

    /// Fetch all users
    pub async fn list(&self) -> Result<Vec<UserDoc>> {
        self.collection.find_many(doc! {}).await
    }

    /// Fetch a user by id
    pub async fn get(&self, id: &str) -> Result<UserDoc> {
        let oid = ObjectId::parse_str(id).map_err(|_| Self::not_found())?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(Self::not_found)
    }

    /// Look up a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    /// Change a user's role
    pub async fn update_role(&self, id: &str, role: Role) -> Result<()> {
        let oid = ObjectId::parse_str(id).map_err(|_| Self::not_found())?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$set": {
                        "role": role.as_str(),
                        "updatedAt": DateTime::now(),
                    }
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Self::not_found());
        }
        Ok(())
    }

    /// Remove a user if present
    pub async fn delete(&self, id: &str) -> Result<()> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(());
        };
        self.collection.delete_one(doc! { "_id": oid }).await
    }
}
