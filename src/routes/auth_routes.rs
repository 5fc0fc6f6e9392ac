//! Authentication endpoints
//!
//! ## Endpoints
//!
//! - `POST /auth/register` - Create an account; the first registered user
//!   becomes admin, later ones start as viewer
//! - `POST /auth/login` - Verify credentials and issue a JWT

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{default_role_for_registration, hash_password, verify_password};
use crate::routes::{
    error_response, get_jwt_validator, json_response, not_found_response, parse_json_body,
    require_mongo, FullBody,
};
use crate::server::AppState;
use crate::store::UserStore;
use crate::types::CuratorError;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    user_id: String,
    email: String,
    role: String,
}

/// Main handler for /auth/* routes
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    match (req.method().clone(), path) {
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        _ => not_found_response(),
    }
}

/// POST /auth/register
async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: email, password",
            None,
        );
    }

    if body.password.len() < 8 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
            Some("WEAK_PASSWORD"),
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let users = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return internal_error("open user store", &e),
    };

    let existing = match users.count().await {
        Ok(n) => n,
        Err(e) => return internal_error("count users", &e),
    };
    let role = default_role_for_registration(existing);

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return internal_error("hash password", &e),
    };

    let user_id = match users.create(&body.email, &password_hash, role).await {
        Ok(id) => id,
        Err(CuratorError::Duplicate(msg)) => {
            return error_response(StatusCode::CONFLICT, &msg, Some("DUPLICATE"))
        }
        Err(e) => return internal_error("create user", &e),
    };

    info!("user {} registered as {}", body.email, role);

    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };
    match jwt.generate_token(&user_id, &body.email, role) {
        Ok(token) => json_response(
            StatusCode::CREATED,
            &AuthResponse {
                token,
                user_id,
                email: body.email,
                role: role.to_string(),
            },
        ),
        Err(e) => internal_error("sign token", &e),
    }
}

/// POST /auth/login
async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, None),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let users = match UserStore::new(mongo).await {
        Ok(s) => s,
        Err(e) => return internal_error("open user store", &e),
    };

    let user = match users.find_by_email(&body.email).await {
        Ok(Some(u)) => u,
        Ok(None) => return invalid_credentials(),
        Err(e) => return internal_error("find user", &e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => return internal_error("verify password", &e),
    }

    let user_id = user._id.map(|o| o.to_hex()).unwrap_or_default();
    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };
    match jwt.generate_token(&user_id, &user.email, user.role) {
        Ok(token) => json_response(
            StatusCode::OK,
            &AuthResponse {
                token,
                user_id,
                email: user.email,
                role: user.role.to_string(),
            },
        ),
        Err(e) => internal_error("sign token", &e),
    }
}

fn invalid_credentials() -> Response<FullBody> {
    error_response(
        StatusCode::UNAUTHORIZED,
        "Invalid email or password",
        Some("INVALID_CREDENTIALS"),
    )
}

fn internal_error(context: &str, error: &CuratorError) -> Response<FullBody> {
    warn!("Failed to {}: {}", context, error);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal error",
        Some("INTERNAL"),
    )
}
