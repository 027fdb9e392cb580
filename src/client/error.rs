//! Client error types.

use thiserror::Error;

use crate::mcp::protocol::JsonRpcError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("event stream closed before a response arrived")]
    StreamClosed,

    #[error("timed out waiting for the server")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, ClientError>;
