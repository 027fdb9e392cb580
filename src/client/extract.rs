//! Plain text out of whatever shape a tool result arrives in.

use serde_json::Value;

/// Pull the readable text from a tool result. Never fails: unknown shapes
/// degrade to their JSON rendering.
pub fn extract_text(result: &Value) -> String {
    match result {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("content") {
                let text: String = items
                    .iter()
                    .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .collect();
                if !text.is_empty() {
                    return text.trim().to_string();
                }
            } else if let Some(text) = map.get("text") {
                return match text {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
            }
            result.to_string()
        }
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
