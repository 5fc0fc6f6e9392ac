//! Workflow configuration and engine endpoints
//!
//! ## Endpoints
//!
//! - `GET /workflow` - The active workflow configuration
//! - `GET /workflow/stages/{name}` - One stage's configuration
//! - `POST /workflow/prefill` - Seed a partial record for a target stage
//! - `POST /workflow/decisions` - Evaluate decision rules for a record,
//!   threading the caller's per-form decision state
//!
//! The engine endpoints are pure: they read and return records and state
//! without touching the store, so a form can drive them on every edit.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::routes::{
    error_response, json_response, not_found_response, parse_json_body, FullBody,
};
use crate::server::AppState;
use crate::types::Record;
use crate::workflow::{
    apply_prefill, evaluate_decision_rules, register_decision_change, DecisionState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrefillRequest {
    source_record: Record,
    target_stage: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrefillResponse {
    record: Record,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionRequest {
    record: Record,
    stage: String,
    #[serde(default)]
    state: DecisionState,
    /// Set when the curator just edited a decision field by hand
    changed_field: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecisionResponse {
    record: Record,
    state: DecisionState,
}

/// Main handler for /workflow/* routes
pub async fn handle_workflow_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let subpath = path.strip_prefix("/workflow").unwrap_or("").to_string();

    match (req.method().clone(), subpath.as_str()) {
        (Method::GET, "") | (Method::GET, "/") => {
            json_response(StatusCode::OK, state.workflow.as_ref())
        }

        (Method::GET, p) if p.starts_with("/stages/") => {
            let name = p.trim_start_matches("/stages/");
            match state.workflow.get_stage(name) {
                Some(stage) => json_response(StatusCode::OK, stage),
                None => error_response(
                    StatusCode::NOT_FOUND,
                    &format!("Unknown workflow stage '{name}'"),
                    Some("NOT_FOUND"),
                ),
            }
        }

        (Method::POST, "/prefill") => handle_prefill(req, state).await,
        (Method::POST, "/decisions") => handle_decisions(req, state).await,

        _ => not_found_response(),
    }
}

/// POST /workflow/prefill
async fn handle_prefill(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: PrefillRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    if state.workflow.get_stage(&body.target_stage).is_none() {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown workflow stage '{}'", body.target_stage),
            Some("NOT_FOUND"),
        );
    }

    let record = apply_prefill(&state.workflow, &body.source_record, &body.target_stage);
    json_response(StatusCode::OK, &PrefillResponse { record })
}

/// POST /workflow/decisions
async fn handle_decisions(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: DecisionRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let Some(stage) = state.workflow.get_stage(&body.stage) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown workflow stage '{}'", body.stage),
            Some("NOT_FOUND"),
        );
    };

    let mut decision_state = body.state;
    let record = match body.changed_field {
        Some(field) => register_decision_change(stage, &body.record, &field, &mut decision_state),
        None => evaluate_decision_rules(stage, &body.record, &mut decision_state),
    };

    json_response(
        StatusCode::OK,
        &DecisionResponse {
            record,
            state: decision_state,
        },
    )
}
