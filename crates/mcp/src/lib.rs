// MCP (Model Context Protocol) server for the NoodleSeed catalog
// Sessions are served over SSE; commands arrive on a separate POST endpoint

pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use error::{DispatchError, RegistryError, SessionError};
pub use server::McpServer;
pub use session::{Session, SessionFrame, SessionOptions, SessionRegistry, SessionState, SessionStream};
