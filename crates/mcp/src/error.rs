// Error taxonomy for dispatch, sessions and the session registry

use noodleseed_core::SessionId;

/// Failures raised while dispatching a tool call
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArguments { field: String, reason: String },

    #[error("Tool {tool} failed: {message}")]
    Failed { tool: String, message: String },
}

impl DispatchError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "UnknownTool",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::Failed { .. } => "ToolFailed",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session {0} is already registered")]
    DuplicateIdentity(SessionId),
}

/// Failures surfaced by a session
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} is not active")]
    SessionNotActive(SessionId),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The session's stream could not be written to
    #[error("Transport fault on session {session}: {message}")]
    TransportFault { session: SessionId, message: String },

    /// A frame could not be encoded; fatal to the session
    #[error("Protocol fault on session {session}: {message}")]
    ProtocolFault { session: SessionId, message: String },
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionNotActive(_) => "SessionNotActive",
            Self::Registry(RegistryError::DuplicateIdentity(_)) => "DuplicateIdentity",
            Self::Dispatch(err) => err.kind(),
            Self::TransportFault { .. } => "TransportFault",
            Self::ProtocolFault { .. } => "ProtocolFault",
        }
    }
}
