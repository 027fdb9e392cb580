//! Tool client: connects to a host over SSE and renders tool results as text.

pub mod error;
pub mod extract;
pub mod session;
pub mod sse;

use std::time::Duration;

use serde_json::json;
use tracing::warn;

use crate::mcp::tools::SUMMARIZE_TOOL;

pub use error::{ClientError, Result};
pub use extract::extract_text;
pub use session::{DEFAULT_TIMEOUT, McpClient};

/// Connect, initialize, call the summary tool, and return its text.
pub async fn try_summarize_article(
    server_url: &str,
    article_url: &str,
    timeout: Duration,
) -> Result<String> {
    let mut client = McpClient::connect(server_url, timeout).await?;
    client.initialize().await?;

    let result = client
        .call_tool(SUMMARIZE_TOOL, json!({ "url": article_url }))
        .await?;
    Ok(extract_text(&result))
}

/// Like [`try_summarize_article`], but failures come back as `Error: ...` text.
pub async fn summarize_article(server_url: &str, article_url: &str, timeout: Duration) -> String {
    match try_summarize_article(server_url, article_url, timeout).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Summary request failed");
            format!("Error: {e}")
        }
    }
}
