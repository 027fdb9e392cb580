use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;
use crate::mcp::protocol::{INTERNAL_ERROR, INVALID_PARAMS};

/// Coarse classification surfaced to tool clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParams,
    InternalError,
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidParams => INVALID_PARAMS,
            ErrorKind::InternalError => INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("Request error: {0}")]
    Fetch(String),

    #[error("Failed to retrieve the article. HTTP status code: {0}")]
    HttpStatus(u16),

    #[error("{0}")]
    ContentNotFound(String),

    #[error("Error converting content: {0}")]
    Conversion(String),

    #[error("{0}")]
    Llm(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidUrl(_) | AppError::ContentNotFound(_) => ErrorKind::InvalidParams,
            _ => ErrorKind::InternalError,
        }
    }

    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::InvalidParams => StatusCode::BAD_REQUEST,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        response::error::<()>(status, self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
