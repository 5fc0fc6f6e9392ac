//! Shared record document payload
//!
//! All three curated collections persist the same shape: schema-driven
//! fields at the top level of the document, plus system fields (timestamps,
//! contributor list, approval stamps, workflow generation markers).

use bson::{oid::ObjectId, DateTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::db::mongo::{IntoIndexes, MutTimestamps};
use crate::schema::EntityType;
use crate::types::Record;

/// Record payload common to genes, precurations, and curations
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RecordData {
    /// Schema-driven fields, stored flat on the document
    #[serde(flatten)]
    pub fields: Record,

    /// When the record was created
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// When the record was last updated
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// Contributor identifiers, most recent editor last, no duplicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,

    /// Identifiers of users who approved this record
    #[serde(rename = "approvedBy", default, skip_serializing_if = "Vec::is_empty")]
    pub approved_by: Vec<String>,

    /// When the record was approved
    #[serde(rename = "approvedAt", skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime>,

    /// Version of the workflow configuration the record was produced under
    #[serde(
        rename = "workflowConfigVersionUsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub workflow_config_version_used: Option<String>,

    /// Name of the workflow configuration the record was produced under
    #[serde(
        rename = "workflowConfigNameUsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub workflow_config_name_used: Option<String>,
}

impl RecordData {
    /// Build a payload from client-supplied fields, pulling the system
    /// fields the client is allowed to set out of the map. Timestamps and
    /// the contributor list are always store-assigned.
    pub fn from_fields(mut fields: Record) -> Self {
        fields.remove("id");
        fields.remove("createdAt");
        fields.remove("updatedAt");
        fields.remove("users");
        fields.remove("approvedBy");
        fields.remove("approvedAt");

        let workflow_config_version_used = take_string(&mut fields, "workflowConfigVersionUsed");
        let workflow_config_name_used = take_string(&mut fields, "workflowConfigNameUsed");

        Self {
            fields,
            workflow_config_version_used,
            workflow_config_name_used,
            ..Default::default()
        }
    }

    /// Merge updated fields over this payload, preserving system fields
    pub fn merge_fields(&mut self, updates: Record) {
        let incoming = RecordData::from_fields(updates);
        for (key, value) in incoming.fields {
            self.fields.insert(key, value);
        }
        if incoming.workflow_config_version_used.is_some() {
            self.workflow_config_version_used = incoming.workflow_config_version_used;
        }
        if incoming.workflow_config_name_used.is_some() {
            self.workflow_config_name_used = incoming.workflow_config_name_used;
        }
    }

    /// JSON representation for the API, with timestamps as RFC 3339 strings
    pub fn to_json(&self, id: Option<ObjectId>) -> Value {
        let mut out = self.fields.clone();

        if let Some(id) = id {
            out.insert("id".to_string(), Value::String(id.to_hex()));
        }
        if let Some(at) = self.created_at {
            out.insert("createdAt".to_string(), datetime_json(at));
        }
        if let Some(at) = self.updated_at {
            out.insert("updatedAt".to_string(), datetime_json(at));
        }
        if !self.users.is_empty() {
            out.insert(
                "users".to_string(),
                Value::Array(self.users.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.approved_by.is_empty() {
            out.insert(
                "approvedBy".to_string(),
                Value::Array(
                    self.approved_by
                        .iter()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ),
            );
        }
        if let Some(at) = self.approved_at {
            out.insert("approvedAt".to_string(), datetime_json(at));
        }
        if let Some(version) = &self.workflow_config_version_used {
            out.insert(
                "workflowConfigVersionUsed".to_string(),
                Value::String(version.clone()),
            );
        }
        if let Some(name) = &self.workflow_config_name_used {
            out.insert(
                "workflowConfigNameUsed".to_string(),
                Value::String(name.clone()),
            );
        }

        Value::Object(out)
    }
}

fn take_string(fields: &mut Record, key: &str) -> Option<String> {
    fields
        .remove(key)
        .and_then(|v| v.as_str().map(|s| s.to_string()))
}

fn datetime_json(at: DateTime) -> Value {
    at.try_to_rfc3339_string()
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// Merge a contributor into an ordered contributor list: remove the user if
/// already present, then append, so the most recent editor is always last
/// and the list stays duplicate-free.
pub fn merge_contributors(mut users: Vec<String>, user: &str) -> Vec<String> {
    users.retain(|u| u != user);
    users.push(user.to_string());
    users
}

/// A persisted record document bound to a specific collection
pub trait RecordDocument:
    Serialize + DeserializeOwned + Unpin + Send + Sync + Clone + IntoIndexes + MutTimestamps
{
    /// Collection the documents live in
    const COLLECTION: &'static str;

    /// Entity type the collection stores
    const ENTITY: EntityType;

    /// Capitalized label used in error messages
    const LABEL: &'static str;

    fn from_record(record: RecordData) -> Self;
    fn id(&self) -> Option<ObjectId>;
    fn record(&self) -> &RecordData;
    fn record_mut(&mut self) -> &mut RecordData;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_contributors_moves_editor_to_end() {
        let users = vec!["u1".to_string(), "u2".to_string()];
        assert_eq!(merge_contributors(users, "u1"), vec!["u2", "u1"]);
    }

    #[test]
    fn test_merge_contributors_appends_new_editor() {
        let users = vec!["u1".to_string()];
        assert_eq!(merge_contributors(users, "u2"), vec!["u1", "u2"]);
    }

    #[test]
    fn test_merge_contributors_from_empty() {
        assert_eq!(merge_contributors(vec![], "u1"), vec!["u1"]);
    }

    #[test]
    fn test_from_fields_strips_store_assigned_keys() {
        let mut fields = Record::new();
        fields.insert("approved_symbol".to_string(), json!("PKD1"));
        fields.insert("createdAt".to_string(), json!("2024-01-01"));
        fields.insert("users".to_string(), json!(["someone"]));
        fields.insert("workflowConfigNameUsed".to_string(), json!("Kidney"));

        let record = RecordData::from_fields(fields);
        assert_eq!(record.fields.get("approved_symbol"), Some(&json!("PKD1")));
        assert!(record.fields.get("createdAt").is_none());
        assert!(record.users.is_empty());
        assert_eq!(record.workflow_config_name_used.as_deref(), Some("Kidney"));
    }

    #[test]
    fn test_merge_fields_overwrites_and_keeps_rest() {
        let mut base = Record::new();
        base.insert("approved_symbol".to_string(), json!("PKD1"));
        base.insert("comment".to_string(), json!("old"));
        let mut record = RecordData::from_fields(base);
        record.users = vec!["u1".to_string()];

        let mut updates = Record::new();
        updates.insert("comment".to_string(), json!("new"));
        record.merge_fields(updates);

        assert_eq!(record.fields.get("approved_symbol"), Some(&json!("PKD1")));
        assert_eq!(record.fields.get("comment"), Some(&json!("new")));
        assert_eq!(record.users, vec!["u1"]);
    }

    #[test]
    fn test_to_json_includes_id_and_users() {
        let mut fields = Record::new();
        fields.insert("approved_symbol".to_string(), json!("PKD1"));
        let mut record = RecordData::from_fields(fields);
        record.users = vec!["u1".to_string()];

        let id = ObjectId::new();
        let json = record.to_json(Some(id));
        assert_eq!(json["id"], json!(id.to_hex()));
        assert_eq!(json["approved_symbol"], json!("PKD1"));
        assert_eq!(json["users"], json!(["u1"]));
    }
}
