//! Curation record endpoints
//!
//! ## Endpoints
//!
//! - `GET /curations` - All curations as an id -> record map
//! - `POST /curations` - Create a curation (natural-key duplicate guard)
//! - `GET /curations/statistics` - Aggregate statistics
//! - `GET /curations/lookup/{identifier}` - All records matching a symbol
//!   or HGNC ID (multi-result lookup)
//! - `GET /curations/{id}` - Get one curation
//! - `PUT /curations/{id}` - Update a curation
//! - `DELETE /curations/{id}` - Delete (idempotent)
//! - `POST /curations/{id}/approve` - Stamp approval

use chrono::{Duration, Utc};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::routes::{
    authenticate, curator_error_response, error_response, json_response, not_found_response,
    parse_json_body, require_curator, require_mongo, FullBody, SuccessResponse,
};
use crate::schema::EntityType;
use crate::server::AppState;
use crate::store::CurationStore;
use crate::types::Record;

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: String,
}

/// Aggregate curation statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsResponse {
    total_curations: usize,
    curations_by_verdict: BTreeMap<String, usize>,
    curations_by_decision: BTreeMap<String, usize>,
    approved_count: usize,
    recent_additions: usize,
}

/// Main handler for /curations/* routes
pub async fn handle_curations_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let method = req.method().clone();
    let subpath = path.strip_prefix("/curations").unwrap_or("").to_string();

    match (method, subpath.as_str()) {
        (Method::GET, "") | (Method::GET, "/") => handle_list(req, state).await,
        (Method::POST, "") | (Method::POST, "/") => handle_create(req, state).await,
        (Method::GET, "/statistics") => handle_statistics(req, state).await,

        (Method::GET, p) if p.starts_with("/lookup/") => {
            let raw = p.trim_start_matches("/lookup/");
            let identifier = urlencoding::decode(raw)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| raw.to_string());
            handle_lookup(req, state, &identifier).await
        }

        (Method::POST, p) if p.ends_with("/approve") => {
            let id = p
                .strip_prefix('/')
                .and_then(|s| s.strip_suffix("/approve"))
                .unwrap_or("")
                .to_string();
            handle_approve(req, state, &id).await
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

async fn open_store(state: &AppState) -> Result<CurationStore, Response<FullBody>> {
    let mongo = require_mongo(state)?;
    CurationStore::new(mongo)
        .await
        .map_err(|e| curator_error_response(&e))
}

/// Stamp the workflow generation markers when the client left them unset
fn prepare(mut data: Record, state: &AppState) -> Record {
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

/// GET /curations
async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.list().await {
        Ok(curations) => json_response(StatusCode::OK, &curations),
        Err(e) => curator_error_response(&e),
    }
}

/// POST /curations
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
    let schema = state.registry.get_schema(EntityType::Curation);

    match store.create_unique(data, &claims.identifier, schema).await {
        Ok(id) => {
            info!("curation {} created by {}", id, claims.identifier);
            json_response(StatusCode::CREATED, &CreatedResponse { id })
        }
        Err(e) => curator_error_response(&e),
    }
}

/// GET /curations/statistics
async fn handle_statistics(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let curations = match store.list().await {
        Ok(c) => c,
        Err(e) => return curator_error_response(&e),
    };

    let thirty_days_ago = Utc::now() - Duration::days(30);
    let mut by_verdict: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_decision: BTreeMap<String, usize> = BTreeMap::new();
    let mut approved_count = 0;
    let mut recent_additions = 0;

    for record in curations.values() {
        if let Some(verdict) = record.get("verdict").and_then(Value::as_str) {
            if !verdict.is_empty() {
                *by_verdict.entry(verdict.to_string()).or_default() += 1;
            }
        }
        if let Some(decision) = record.get("decision").and_then(Value::as_str) {
            if !decision.is_empty() {
                *by_decision.entry(decision.to_string()).or_default() += 1;
            }
        }
        if record.get("approvedAt").is_some() {
            approved_count += 1;
        }
        if let Some(created) = record
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        {
            if created.with_timezone(&Utc) >= thirty_days_ago {
                recent_additions += 1;
            }
        }
    }

    json_response(
        StatusCode::OK,
        &StatisticsResponse {
            total_curations: curations.len(),
            curations_by_verdict: by_verdict,
            curations_by_decision: by_decision,
            approved_count,
            recent_additions,
        },
    )
}

/// GET /curations/lookup/{identifier} - multi-result lookup
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

    match store.find_all_by_identifier(identifier).await {
        Ok(curations) => json_response(StatusCode::OK, &curations),
        Err(e) => curator_error_response(&e),
    }
}

/// GET /curations/{id}
async fn handle_get(req: Request<Incoming>, state: Arc<AppState>, id: &str) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.get(id).await {
        Ok(curation) => json_response(StatusCode::OK, &curation),
        Err(e) => curator_error_response(&e),
    }
}

/// PUT /curations/{id}
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
    let schema = state.registry.get_schema(EntityType::Curation);

    match store.update(id, data, &claims.identifier, schema).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &SuccessResponse {
                success: true,
                message: "Curation updated".to_string(),
            },
        ),
        Err(e) => curator_error_response(&e),
    }
}

/// DELETE /curations/{id}
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
            info!("curation {} deleted by {}", id, claims.identifier);
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Curation deleted".to_string(),
                },
            )
        }
        Err(e) => curator_error_response(&e),
    }
}

/// POST /curations/{id}/approve
async fn handle_approve(
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

    match store.approve(id, &claims.identifier).await {
        Ok(curation) => {
            info!("curation {} approved by {}", id, claims.identifier);
            json_response(StatusCode::OK, &curation)
        }
        Err(e) => curator_error_response(&e),
    }
}
