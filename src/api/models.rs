use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct SummarizeRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub url: String,
    pub summary: String,
    pub summarized_at: DateTime<Utc>,
    pub word_count: usize,
}

/// Query string of the message side-channel.
#[derive(Deserialize)]
pub struct MessageQuery {
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub active_sessions: usize,
}
