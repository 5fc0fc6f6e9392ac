//! Field schema endpoints
//!
//! ## Endpoints
//!
//! - `GET /schemas` - Current workflow generation with all entity schemas
//! - `GET /schemas/{entity}` - Field schema for one entity type

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use crate::routes::{error_response, json_response, not_found_response, FullBody};
use crate::schema::EntityType;
use crate::server::AppState;

/// Main handler for /schemas/* routes
pub async fn handle_schemas_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let subpath = path.strip_prefix("/schemas").unwrap_or("");

    match (req.method().clone(), subpath) {
        (Method::GET, "") | (Method::GET, "/") => {
            json_response(StatusCode::OK, state.registry.current())
        }

        (Method::GET, p) => {
            let name = p.trim_start_matches('/');
            match EntityType::parse(name) {
                Some(entity) => json_response(StatusCode::OK, state.registry.get_schema(entity)),
                None => error_response(
                    StatusCode::NOT_FOUND,
                    &format!("Unknown entity type '{name}'"),
                    Some("NOT_FOUND"),
                ),
            }
        }

        _ => not_found_response(),
    }
}
