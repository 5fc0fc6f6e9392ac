//! Health and version endpoints

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::{json_response, FullBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    workflow: String,
    workflow_version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    version: &'static str,
    git_commit: &'static str,
    built_at: &'static str,
}

/// GET /health - liveness probe
pub fn health_check(state: Arc<AppState>) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            database: if state.mongo.is_some() {
                "connected"
            } else {
                "unavailable"
            },
            workflow: state.workflow.name.clone(),
            workflow_version: state.workflow.version.clone(),
        },
    )
}

/// GET /version - deployment verification
pub fn version_info() -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: env!("GIT_COMMIT_SHORT"),
            built_at: env!("BUILD_TIMESTAMP"),
        },
    )
}
