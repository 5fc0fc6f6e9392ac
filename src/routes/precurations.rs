//! Precuration record endpoints
//!
//! ## Endpoints
//!
//! - `GET /precurations` - All precurations as an id -> record map
//! - `POST /precurations` - Create a precuration (decision rules applied)
//! - `GET /precurations/lookup/{identifier}` - Find by symbol or HGNC ID
//! - `GET /precurations/{id}` - Get one precuration
//! - `PUT /precurations/{id}` - Update (decision rules applied)
//! - `DELETE /precurations/{id}` - Delete (idempotent)
//!
//! Create and update pass the record through the stage's decision rules
//! before validation and persistence, so a threshold met by the submitted
//! assessment fields fills the decision without the curator setting it.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::routes::{
    authenticate, curator_error_response, error_response, json_response, not_found_response,
    parse_json_body, require_curator, require_mongo, FullBody, SuccessResponse,
};
use crate::schema::EntityType;
use crate::server::AppState;
use crate::store::PrecurationStore;
use crate::types::Record;
use crate::workflow::{evaluate_decision_rules, DecisionState};

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: String,
}

/// Main handler for /precurations/* routes
pub async fn handle_precurations_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let method = req.method().clone();
    let subpath = path.strip_prefix("/precurations").unwrap_or("").to_string();

    match (method, subpath.as_str()) {
        (Method::GET, "") | (Method::GET, "/") => handle_list(req, state).await,
        (Method::POST, "") | (Method::POST, "/") => handle_create(req, state).await,

        (Method::GET, p) if p.starts_with("/lookup/") => {
            let raw = p.trim_start_matches("/lookup/");
            let identifier = urlencoding::decode(raw)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| raw.to_string());
            handle_lookup(req, state, &identifier).await
        }

        (Method::GET, p) => {
            let id = p.trim_start_matches('/').to_string();
            handle_get(req, state, &id).await
        }
        (Method::PUT, p) => {
            let id = p.trim_start_matches('/').to_string();
            handle_update(req, state, &id).await
        }
        (Method::DELETE, p) => {
            let id = p.trim_start_matches('/').to_string();
            handle_delete(req, state, &id).await
        }

        _ => not_found_response(),
    }
}

async fn open_store(state: &AppState) -> Result<PrecurationStore, Response<FullBody>> {
    let mongo = require_mongo(state)?;
    PrecurationStore::new(mongo)
        .await
        .map_err(|e| curator_error_response(&e))
}

/// Run the precuration stage's decision rules over submitted fields and
/// stamp the workflow generation markers when the client left them unset
fn prepare(data: Record, state: &AppState) -> Record {
    let mut data = match state.workflow.get_stage("precuration") {
        Some(stage) => {
            let mut decision_state = DecisionState::default();
            evaluate_decision_rules(stage, &data, &mut decision_state)
        }
        None => data,
    };

    if !data.contains_key("workflowConfigNameUsed") {
        data.insert(
            "workflowConfigNameUsed".to_string(),
            Value::String(state.workflow.name.clone()),
        );
    }
    if !data.contains_key("workflowConfigVersionUsed") {
        data.insert(
            "workflowConfigVersionUsed".to_string(),
            Value::String(state.workflow.version.clone()),
        );
    }

    data
}

/// GET /precurations
async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.list().await {
        Ok(precurations) => json_response(StatusCode::OK, &precurations),
        Err(e) => curator_error_response(&e),
    }
}

/// POST /precurations
async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let claims = match require_curator(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let data: Record = match parse_json_body(req).await {
        Ok(d) => d,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let data = prepare(data, &state);
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let schema = state.registry.get_schema(EntityType::Precuration);

    match store.create(data, &claims.identifier, schema).await {
        Ok(id) => {
            info!("precuration {} created by {}", id, claims.identifier);
            json_response(StatusCode::CREATED, &CreatedResponse { id })
        }
        Err(e) => curator_error_response(&e),
    }
}

/// GET /precurations/lookup/{identifier}
async fn handle_lookup(
    req: Request<Incoming>,
    state: Arc<AppState>,
    identifier: &str,
) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.find_by_identifier(identifier).await {
        Ok(Some(precuration)) => json_response(StatusCode::OK, &precuration),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Precuration not found",
            Some("NOT_FOUND"),
        ),
        Err(e) => curator_error_response(&e),
    }
}

/// GET /precurations/{id}
async fn handle_get(req: Request<Incoming>, state: Arc<AppState>, id: &str) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.get(id).await {
        Ok(precuration) => json_response(StatusCode::OK, &precuration),
        Err(e) => curator_error_response(&e),
    }
}

/// PUT /precurations/{id}
async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<FullBody> {
    let claims = match require_curator(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let data: Record = match parse_json_body(req).await {
        Ok(d) => d,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let data = prepare(data, &state);
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let schema = state.registry.get_schema(EntityType::Precuration);

    match store.update(id, data, &claims.identifier, schema).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &SuccessResponse {
                success: true,
                message: "Precuration updated".to_string(),
            },
        ),
        Err(e) => curator_error_response(&e),
    }
}

/// DELETE /precurations/{id}
async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<FullBody> {
    let claims = match require_curator(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.delete(id).await {
        Ok(()) => {
            info!("precuration {} deleted by {}", id, claims.identifier);
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Precuration deleted".to_string(),
                },
            )
        }
        Err(e) => curator_error_response(&e),
    }
}
