//! Field schema registry
//!
//! Declarative per-entity field definitions: label, data format, validation
//! constraints, display visibility, grouping metadata, and optional nested
//! schemas for embedded sub-objects. Schemas are pure, static, versioned
//! data; workflow generations coexist so historical records remain
//! interpretable under the schema version that produced them.

mod field;
mod registry;

pub use field::{FieldDefinition, FieldFormat, FieldGroup, FieldOption, FieldSchema};
pub use registry::{EntityType, SchemaRegistry, WorkflowSchemas};
