use super::{ApiError, ApiResult};
use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use noodleseed_core::SessionId;
use noodleseed_mcp::protocol::InboundMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Header accepted as an alternative to the `sessionId` query parameter
pub const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Submit a message to an open session
///
/// Routing is strictly by session identity; the result is returned here and
/// also pushed onto that session's own stream.
pub async fn submit_message(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SessionQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| ApiError::MalformedQuery(e.body_text()))?;
    let message = serde_json::from_slice::<InboundMessage>(&body);

    let identity = query
        .session_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            message
                .as_ref()
                .ok()
                .and_then(|m| m.session_identity())
                .map(str::to_string)
        })
        .ok_or(ApiError::MissingIdentity)?;

    let session = identity
        .parse::<SessionId>()
        .ok()
        .and_then(|id| state.registry.lookup(&id))
        .ok_or_else(|| ApiError::UnknownSession(identity.clone()))?;

    let message = message.map_err(|e| ApiError::MalformedMessage(e.to_string()))?;

    match message {
        InboundMessage::Command(command) => {
            tracing::debug!(session_id = %session.id(), "Forwarding command {}", command.tool_id);
            let result = session.forward(command).await?;
            Ok(Json(result).into_response())
        }
        InboundMessage::Rpc(request) => {
            tracing::debug!(session_id = %session.id(), "Forwarding {}", request.method);
            match session.handle_message(request).await? {
                Some(response) => Ok(Json(response).into_response()),
                None => Ok((StatusCode::ACCEPTED, "Accepted").into_response()),
            }
        }
    }
}

/// Service description at the root path
pub async fn index(State(state): State<Arc<AppState>>) -> Json<IndexResponse> {
    let transport = &state.config.transport;
    Json(IndexResponse {
        name: "NoodleSeed MCP Server".to_string(),
        version: state.server_info.version.clone(),
        endpoints: Endpoints {
            mcp_sse: transport.sse_path.clone(),
            mcp_messages: transport.messages_path.clone(),
            health: "/health".to_string(),
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub name: String,
    pub version: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Endpoints {
    pub mcp_sse: String,
    pub mcp_messages: String,
    pub health: String,
}
