//! Database schemas for gene-curator
//!
//! MongoDB document structures for the three record collections and users.

mod curation;
mod gene;
mod precuration;
mod record;
mod user;

pub use curation::{CurationDoc, CURATION_COLLECTION};
pub use gene::{GeneDoc, GENE_COLLECTION};
pub use precuration::{PrecurationDoc, PRECURATION_COLLECTION};
pub use record::{merge_contributors, RecordData, RecordDocument};
pub use user::{UserDoc, USER_COLLECTION};
