//! Admin API endpoints for user management
//!
//! ## Endpoints
//!
//! - `GET /admin/users` - List users
//! - `GET /admin/users/{id}` - Get user details
//! - `PUT /admin/users/{id}/role` - Change role
//! - `DELETE /admin/users/{id}` - Delete user
//!
//! All endpoints require a role with admin-panel access.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Role;
use crate::db::schemas::UserDoc;
use crate::routes::{
    curator_error_response, error_response, json_response, not_found_response, parse_json_body,
    require_admin, require_mongo, FullBody, SuccessResponse,
};
use crate::server::AppState;
use crate::store::UserStore;

/// User summary for the admin panel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    id: String,
    email: String,
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<UserSummary>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    role: String,
}

fn user_to_summary(user: &UserDoc) -> UserSummary {
    UserSummary {
        id: user._id.map(|o| o.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        role: user.role.to_string(),
        created_at: user.created_at.and_then(|d| d.try_to_rfc3339_string().ok()),
        updated_at: user.updated_at.and_then(|d| d.try_to_rfc3339_string().ok()),
    }
}

/// Main handler for /admin/users/* routes
pub async fn handle_admin_users_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let method = req.method().clone();
    let subpath = path.strip_prefix("/admin/users").unwrap_or("");

    match (method, subpath) {
        (Method::GET, "") | (Method::GET, "/") => handle_list_users(req, state).await,

        (Method::GET, p) => {
            let id = p.trim_start_matches('/');
            handle_get_user(req, state, id).await
        }

        (Method::PUT, p) if p.ends_with("/role") => {
            let id = p
                .strip_prefix('/')
                .and_then(|s| s.strip_suffix("/role"))
                .unwrap_or("");
            handle_update_role(req, state, id).await
        }

        (Method::DELETE, p) => {
            let id = p.trim_start_matches('/');
            handle_delete_user(req, state, id).await
        }

        _ => not_found_response(),
    }
}

/// GET /admin/users - List users
async fn handle_list_users(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    if let Err(resp) = require_admin(&req, &state) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let store = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return curator_error_response(&e),
    };

    match store.list().await {
        Ok(users) => {
            let summaries: Vec<UserSummary> = users.iter().map(user_to_summary).collect();
            json_response(
                StatusCode::OK,
                &UsersResponse {
                    total: summaries.len(),
                    users: summaries,
                },
            )
        }
        Err(e) => {
            warn!("Error listing users: {}", e);
            curator_error_response(&e)
        }
    }
}

/// GET /admin/users/{id} - Get user details
async fn handle_get_user(
    req: Request<Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<FullBody> {
    if let Err(resp) = require_admin(&req, &state) {
        return resp;
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let store = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return curator_error_response(&e),
    };

    match store.get(user_id).await {
        Ok(user) => json_response(StatusCode::OK, &user_to_summary(&user)),
        Err(e) => curator_error_response(&e),
    }
}

/// PUT /admin/users/{id}/role - Change a user's role
async fn handle_update_role(
    req: Request<Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<FullBody> {
    let admin_claims = match require_admin(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: UpdateRoleRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let Some(role) = Role::parse(&body.role) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid role. Must be admin, curator, or viewer",
            Some("INVALID_ROLE"),
        );
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let store = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return curator_error_response(&e),
    };

    match store.update_role(user_id, role).await {
        Ok(()) => {
            info!(
                "Role for user {} changed to {} by admin {}",
                user_id, role, admin_claims.identifier
            );
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: format!("Role updated to {role}"),
                },
            )
        }
        Err(e) => curator_error_response(&e),
    }
}

/// DELETE /admin/users/{id} - Delete user
async fn handle_delete_user(
    req: Request<Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<FullBody> {
    let admin_claims = match require_admin(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let store = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return curator_error_response(&e),
    };

    match store.delete(user_id).await {
        Ok(()) => {
            info!("User {} deleted by admin {}", user_id, admin_claims.identifier);
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: "User deleted".to_string(),
                },
            )
        }
        Err(e) => curator_error_response(&e),
    }
}
