//! The tool this host exposes.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::mcp::protocol::{JsonRpcError, Tool};

pub const SUMMARIZE_TOOL: &str = "summarize_wikipedia_article";

const SUMMARIZE_DESCRIPTION: &str = "Fetch a Wikipedia article at the provided URL, parse its main content, \
convert it to Markdown, and generate a summary using the configured model.\n\n\
Usage:\n    summarize_wikipedia_article(\"https://en.wikipedia.org/wiki/Python_(programming_language)\")";

#[derive(Debug, Deserialize)]
pub struct SummarizeArgs {
    pub url: String,
}

impl SummarizeArgs {
    /// Decode tool arguments; anything but `{ "url": <string> }` is invalid params.
    pub fn from_arguments(arguments: Option<Value>) -> Result<Self, JsonRpcError> {
        let arguments = arguments
            .ok_or_else(|| JsonRpcError::invalid_params("Missing required argument: url"))?;
        serde_json::from_value(arguments)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments: {e}")))
    }
}

pub fn tool_definitions() -> Vec<Tool> {
    vec![Tool {
        name: SUMMARIZE_TOOL.to_string(),
        description: Some(SUMMARIZE_DESCRIPTION.to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "title": "Url"}
            },
            "required": ["url"]
        }),
    }]
}
