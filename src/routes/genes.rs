//! Gene record endpoints
//!
//! ## Endpoints
//!
//! - `GET /genes` - All genes as an id -> record map
//! - `POST /genes` - Create a gene record
//! - `GET /genes/lookup/{identifier}` - Find by approved symbol or HGNC ID
//! - `GET /genes/{id}` - Get one gene
//! - `PUT /genes/{id}` - Update a gene
//! - `DELETE /genes/{id}` - Delete a gene (idempotent)

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::routes::{
    authenticate, curator_error_response, error_response, json_response, not_found_response,
    parse_json_body, require_curator, require_mongo, FullBody, SuccessResponse,
};
use crate::schema::EntityType;
use crate::server::AppState;
use crate::store::GeneStore;
use crate::types::Record;

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: String,
}

/// Main handler for /genes/* routes
pub async fn handle_genes_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let method = req.method().clone();
    let subpath = path.strip_prefix("/genes").unwrap_or("").to_string();

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

async fn open_store(state: &AppState) -> Result<GeneStore, Response<FullBody>> {
    let mongo = require_mongo(state)?;
    GeneStore::new(mongo).await.map_err(|e| curator_error_response(&e))
}

/// GET /genes
async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.list().await {
        Ok(genes) => json_response(StatusCode::OK, &genes),
        Err(e) => curator_error_response(&e),
    }
}

/// POST /genes
async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let claims = match require_curator(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let data: Record = match parse_json_body(req).await {
        Ok(d) => d,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let schema = state.registry.get_schema(EntityType::Gene);

    match store.create(data, &claims.identifier, schema).await {
        Ok(id) => {
            info!("gene {} created by {}", id, claims.identifier);
            json_response(StatusCode::CREATED, &CreatedResponse { id })
        }
        Err(e) => curator_error_response(&e),
    }
}

/// GET /genes/lookup/{identifier}
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
        Ok(Some(gene)) => json_response(StatusCode::OK, &gene),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Gene not found", Some("NOT_FOUND")),
        Err(e) => curator_error_response(&e),
    }
}

/// GET /genes/{id}
async fn handle_get(req: Request<Incoming>, state: Arc<AppState>, id: &str) -> Response<FullBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }
    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.get(id).await {
        Ok(gene) => json_response(StatusCode::OK, &gene),
        Err(e) => curator_error_response(&e),
    }
}

/// PUT /genes/{id}
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

    let store = match open_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let schema = state.registry.get_schema(EntityType::Gene);

    match store.update(id, data, &claims.identifier, schema).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &SuccessResponse {
                success: true,
                message: "Gene updated".to_string(),
            },
        ),
        Err(e) => curator_error_response(&e),
    }
}

/// DELETE /genes/{id}
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
            info!("gene {} deleted by {}", id, claims.identifier);
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "Gene deleted".to_string(),
                },
            )
        }
        Err(e) => curator_error_response(&e),
    }
}
