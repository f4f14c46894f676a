use crate::config::{AppState, ServerConfig, SERVICE_NAME};
use crate::sse;
use anyhow::Result;
use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use noodleseed_mcp::{SessionError, SessionRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config)?);
    let registry = state.registry.clone();
    let transport = state.config.transport.clone();

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on {}", addr);
    tracing::info!("SSE endpoint: GET {}", transport.sse_path);
    tracing::info!("Message endpoint: POST {}?sessionId=...", transport.messages_path);
    tracing::info!("Health check: GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let transport = &state.config.transport;

    Router::new()
        .route("/", get(handlers::index).fallback(not_found))
        .route("/health", get(health_check).fallback(not_found))
        // CORS is scoped to the transport routes; preflight anywhere else is a 404
        .route(
            &transport.sse_path,
            get(sse::open_stream).fallback(not_found).layer(cors()),
        )
        .route(
            &transport.messages_path,
            post(handlers::submit_message).fallback(not_found).layer(cors()),
        )
        .fallback(not_found)
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(handlers::SESSION_HEADER),
        ])
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "type": "rust-sse",
        "mcp_ready": true,
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Wait for SIGINT / SIGTERM, then close every session so their streams end
async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
    registry.close_all();
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

/// Errors returned by the submit endpoint
///
/// Each one ends only the request that raised it; sessions are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing sessionId query parameter")]
    MissingIdentity,

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Malformed query string: {0}")]
    MalformedQuery(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingIdentity => "MissingIdentity",
            Self::UnknownSession(_) => "UnknownSession",
            Self::MalformedMessage(_) | Self::MalformedQuery(_) => "ProtocolFault",
            Self::Session(err) => err.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        use noodleseed_mcp::DispatchError;

        match self {
            Self::MissingIdentity | Self::MalformedMessage(_) | Self::MalformedQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownSession(_) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::SessionNotActive(_)) => StatusCode::CONFLICT,
            Self::Session(SessionError::Dispatch(DispatchError::UnknownTool(_))) => {
                StatusCode::NOT_FOUND
            }
            Self::Session(SessionError::Dispatch(DispatchError::InvalidArguments { .. })) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            kind: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
