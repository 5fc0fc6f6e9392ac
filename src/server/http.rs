//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling; requests are routed by
//! method and path prefix.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::schema::SchemaRegistry;
use crate::types::CuratorError;
use crate::workflow::{kidney_genetics_workflow, WorkflowConfig};

type FullBody = Full<Bytes>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    /// Versioned field schema registry
    pub registry: Arc<SchemaRegistry>,
    /// Active workflow stage configuration
    pub workflow: Arc<WorkflowConfig>,
}

impl AppState {
    /// Build application state, checking workflow/schema integrity up front
    pub fn new(args: Args, mongo: Option<MongoClient>) -> Result<Self, CuratorError> {
        let registry = Arc::new(SchemaRegistry::builtin());
        let workflow = Arc::new(kidney_genetics_workflow());
        workflow.validate(registry.current())?;

        Ok(Self {
            args,
            mongo,
            registry,
            workflow,
        })
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), CuratorError> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| CuratorError::Config(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!("HTTP server listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<FullBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // Authentication
        (_, p) if p.starts_with("/auth") => {
            routes::handle_auth_request(req, Arc::clone(&state), &path).await
        }

        // Admin user management
        (_, p) if p.starts_with("/admin/users") => {
            routes::handle_admin_users_request(req, Arc::clone(&state), &path).await
        }

        // Record collections
        (_, p) if p.starts_with("/genes") => {
            routes::handle_genes_request(req, Arc::clone(&state), &path).await
        }
        (_, p) if p.starts_with("/precurations") => {
            routes::handle_precurations_request(req, Arc::clone(&state), &path).await
        }
        (_, p) if p.starts_with("/curations") => {
            routes::handle_curations_request(req, Arc::clone(&state), &path).await
        }

        // Schema registry and workflow engine
        (_, p) if p.starts_with("/schemas") => {
            routes::handle_schemas_request(req, Arc::clone(&state), &path).await
        }
        (_, p) if p.starts_with("/workflow") => {
            routes::handle_workflow_request(req, Arc::clone(&state), &path).await
        }

        _ => routes::error_response(
            StatusCode::NOT_FOUND,
            &format!("No route for {}", path),
            Some("NOT_FOUND"),
        ),
    };

    Ok(with_cors(response))
}

fn preflight_response() -> Response<FullBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .header(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn with_cors(mut response: Response<FullBody>) -> Response<FullBody> {
    response.headers_mut().insert(
        "Access-Control-Allow-Origin",
        hyper::header::HeaderValue::from_static("*"),
    );
    response
}
