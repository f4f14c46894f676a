// Sessions: one streaming connection bound to one protocol engine and one identity

mod registry;

pub use registry::SessionRegistry;

use crate::error::SessionError;
use crate::protocol::{CommandRequest, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;
use noodleseed_core::{SessionId, ToolResult};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake frame not yet queued
    Opening,
    /// Accepting commands and writing frames
    Active,
    /// Teardown started; commands are refused
    Closing,
    /// Resources released and deregistered
    Closed,
}

/// One discrete unit written onto a session's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFrame {
    pub event: &'static str,
    pub data: String,
}

impl SessionFrame {
    /// Event telling the client where to post messages for this session
    pub const ENDPOINT: &'static str = "endpoint";
    /// JSON-RPC response frame
    pub const MESSAGE: &'static str = "message";
    /// Result of a direct command
    pub const RESULT: &'static str = "result";

    pub fn endpoint(url: impl Into<String>) -> Self {
        Self {
            event: Self::ENDPOINT,
            data: url.into(),
        }
    }

    pub fn message(response: &JsonRpcResponse) -> serde_json::Result<Self> {
        Self::json(Self::MESSAGE, response)
    }

    pub fn result(result: &ToolResult) -> serde_json::Result<Self> {
        Self::json(Self::RESULT, result)
    }

    fn json(event: &'static str, value: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            event,
            data: serde_json::to_string(value)?,
        })
    }
}

/// Parameters for opening a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Path the client posts messages to; the session id is appended as a query
    pub endpoint: String,
    /// Frames buffered before a write waits on the client
    pub frame_buffer: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            endpoint: "/mcp/messages".to_string(),
            frame_buffer: 64,
        }
    }
}

/// Server-side state for one open stream
pub struct Session {
    id: SessionId,
    engine: McpServer,
    outbound: mpsc::Sender<SessionFrame>,
    state: Mutex<SessionState>,
    cancel: CancellationToken,
    registry: Arc<SessionRegistry>,
}

impl Session {
    /// Open a session: queue the handshake frame, activate and register.
    ///
    /// The returned stream yields the session's frames; dropping it closes the
    /// session.
    pub fn open(
        registry: &Arc<SessionRegistry>,
        engine: McpServer,
        options: &SessionOptions,
    ) -> Result<(Arc<Session>, SessionStream), SessionError> {
        Self::open_with_id(SessionId::new(), registry, engine, options)
    }

    fn open_with_id(
        id: SessionId,
        registry: &Arc<SessionRegistry>,
        engine: McpServer,
        options: &SessionOptions,
    ) -> Result<(Arc<Session>, SessionStream), SessionError> {
        let (outbound, frames) = mpsc::channel(options.frame_buffer.max(1));
        let cancel = CancellationToken::new();

        let session = Arc::new(Session {
            id,
            engine,
            outbound,
            state: Mutex::new(SessionState::Opening),
            cancel: cancel.clone(),
            registry: Arc::clone(registry),
        });

        let handshake = SessionFrame::endpoint(format!("{}?sessionId={}", options.endpoint, id));
        if let Err(e) = session.outbound.try_send(handshake) {
            session.abandon();
            return Err(SessionError::TransportFault {
                session: id,
                message: e.to_string(),
            });
        }

        *session.state_guard() = SessionState::Active;

        if let Err(e) = registry.register(id, Arc::clone(&session)) {
            // The id belongs to someone else; leave their registry entry alone
            session.abandon();
            return Err(e.into());
        }

        let stream = SessionStream {
            session: Arc::clone(&session),
            frames,
            cancel,
        };

        Ok((session, stream))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state_guard()
    }

    pub fn engine(&self) -> &McpServer {
        &self.engine
    }

    /// Dispatch a direct command and push its result onto this session's stream
    pub async fn forward(&self, command: CommandRequest) -> Result<ToolResult, SessionError> {
        self.ensure_active()?;

        let result = self
            .engine
            .call_tool(&command.tool_id, command.arguments)
            .await?;

        match SessionFrame::result(&result) {
            Ok(frame) => self.deliver(frame).await,
            Err(e) => self.protocol_fault(e),
        }

        Ok(result)
    }

    /// Handle a JSON-RPC message and push any response onto this session's stream
    pub async fn handle_message(
        &self,
        request: JsonRpcRequest,
    ) -> Result<Option<JsonRpcResponse>, SessionError> {
        self.ensure_active()?;

        let Some(response) = self.engine.handle_request(request).await else {
            return Ok(None);
        };

        match SessionFrame::message(&response) {
            Ok(frame) => self.deliver(frame).await,
            Err(e) => self.protocol_fault(e),
        }

        Ok(Some(response))
    }

    /// Tear the session down. Safe to call any number of times from any task.
    pub fn close(&self) {
        // Leaving Active and leaving the registry happen under one registry
        // write lock, so a lookup only ever returns an Active session.
        if !self.registry.remove_with(&self.id, || self.begin_close()) {
            return;
        }

        self.cancel.cancel();
        *self.state_guard() = SessionState::Closed;

        tracing::info!(session_id = %self.id, "SSE session closed");
    }

    /// Move to Closing; false if teardown already started
    fn begin_close(&self) -> bool {
        let mut state = self.state_guard();
        if matches!(*state, SessionState::Closing | SessionState::Closed) {
            return false;
        }
        *state = SessionState::Closing;
        true
    }

    /// Close without touching the registry, for sessions that never registered
    fn abandon(&self) {
        self.cancel.cancel();
        *self.state_guard() = SessionState::Closed;
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Active => Ok(()),
            _ => Err(SessionError::SessionNotActive(self.id)),
        }
    }

    /// Best-effort write; a closed stream drops the frame silently
    async fn deliver(&self, frame: SessionFrame) {
        let event = frame.event;
        let sent = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!(session_id = %self.id, "Session closing, dropped {} frame", event);
                return;
            }
            sent = self.outbound.send(frame) => sent,
        };

        if let Err(e) = sent {
            let fault = SessionError::TransportFault {
                session: self.id,
                message: e.to_string(),
            };
            tracing::warn!("{}", fault);
            self.close();
        }
    }

    fn protocol_fault(&self, error: serde_json::Error) {
        let fault = SessionError::ProtocolFault {
            session: self.id,
            message: error.to_string(),
        };
        tracing::error!("{}", fault);
        self.close();
    }

    fn state_guard(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Receiving half of a session's stream
///
/// Ends when the session closes; dropping it (peer disconnect) closes the session.
pub struct SessionStream {
    session: Arc<Session>,
    frames: mpsc::Receiver<SessionFrame>,
    cancel: CancellationToken,
}

impl SessionStream {
    pub fn session_id(&self) -> SessionId {
        self.session.id
    }

    /// Wait for the next frame, or `None` once the session is closed
    pub async fn next_frame(&mut self) -> Option<SessionFrame> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            frame = self.frames.recv() => frame,
        }
    }
}

impl std::fmt::Debug for SessionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStream")
            .field("session_id", &self.session.id)
            .finish_non_exhaustive()
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.session.close();
    }
}
