//! Record store adapters
//!
//! Per-entity CRUD over the MongoDB collections. Create and update run the
//! validation engine and refuse to persist on violations; edits maintain the
//! contributor list; curations carry a natural-key duplicate guard.

mod records;
mod users;

pub use records::{
    curation_natural_key, CurationStore, GeneStore, PrecurationStore, RecordStore,
};
pub use users::UserStore;
