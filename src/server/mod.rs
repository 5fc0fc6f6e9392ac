//! HTTP server for gene-curator

mod http;

pub use http::{run, AppState};
