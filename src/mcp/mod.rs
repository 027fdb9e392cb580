//! Tool-host side of the MCP exchange: wire types, dispatch, and sessions.

pub mod handler;
pub mod protocol;
pub mod session;
pub mod tools;

pub use handler::{McpHandler, SERVER_NAME};
pub use session::{DispatchError, SessionRegistry};
