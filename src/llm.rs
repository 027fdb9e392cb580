use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LlmProvider;
use crate::error::{AppError, Result};

/// A hosted model that turns a prompt into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Client for model calls. Generation is slower than page fetches, so it is
/// bounded by the whole tool timeout rather than the fetch timeout.
pub fn http_client(request_timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build LLM client: {}", e)))
}

pub fn build_summarizer(client: Client, provider: &LlmProvider) -> Arc<dyn Summarizer> {
    match provider {
        LlmProvider::Gemini {
            api_key,
            model,
            base_url,
        } => Arc::new(GeminiClient::new(client, api_key, model, base_url)),
        LlmProvider::OpenRouter {
            api_key,
            model,
            base_url,
        } => Arc::new(OpenRouterClient::new(client, api_key, model, base_url)),
    }
}

/// Trims the model output, treating an empty reply as no reply.
fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Gemini API error: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Gemini API error: HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let json: Value = res
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Gemini API error: {}", e)))?;
        debug!(model = %self.model, "Gemini response received");

        non_empty(json["candidates"][0]["content"]["parts"][0]["text"].as_str()).ok_or_else(|| {
            warn!(response = %json, "Gemini response structure unexpected");
            AppError::Llm("Gemini model did not return a valid text summary.".to_string())
        })
    }
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(client: Client, api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Title", "wiki-summary")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("OpenRouter API error: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "OpenRouter API error: HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let json: Value = res
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("OpenRouter API error: {}", e)))?;

        non_empty(json["choices"][0]["message"]["content"].as_str()).ok_or_else(|| {
            warn!(response = %json, "OpenRouter response structure unexpected");
            AppError::Llm("Invalid response format from LLM".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn gemini_returns_trimmed_first_part() {
        let app = Router::new().route(
            "/models/:model",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-goog-api-key"], "secret");
                assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt text");
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "  A summary.\n"}]}}]
                }))
            }),
        );
        let base = serve(app).await;

        let client = GeminiClient::new(Client::new(), "secret", "gemini-2.0-flash", &base);
        let summary = client.summarize("prompt text").await.unwrap();
        assert_eq!(summary, "A summary.");
    }

    #[tokio::test]
    async fn gemini_without_text_is_an_error() {
        let app = Router::new().route(
            "/models/:model",
            post(|| async { Json(json!({"candidates": [{"finishReason": "SAFETY"}]})) }),
        );
        let base = serve(app).await;

        let client = GeminiClient::new(Client::new(), "k", "m", &base);
        let err = client.summarize("p").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini model did not return a valid text summary."
        );
    }

    #[tokio::test]
    async fn gemini_http_failure_is_an_error() {
        let app = Router::new().route(
            "/models/:model",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "bad key") }),
        );
        let base = serve(app).await;

        let client = GeminiClient::new(Client::new(), "k", "m", &base);
        let err = client.summarize("p").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 403"));
        assert_eq!(err.kind(), crate::error::ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn openrouter_reads_first_choice() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer or-key");
                assert_eq!(body["model"], "some/model");
                Json(json!({"choices": [{"message": {"content": "Short."}}]}))
            }),
        );
        let base = serve(app).await;

        let client = OpenRouterClient::new(Client::new(), "or-key", "some/model", &base);
        assert_eq!(client.summarize("p").await.unwrap(), "Short.");
    }

    #[tokio::test]
    async fn llm_client_outlasts_a_short_fetch_timeout() {
        let app = Router::new().route(
            "/models/:model",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(1500)).await;
                Json(json!({"candidates": [{"content": {"parts": [{"text": "Slow."}]}}]}))
            }),
        );
        let base = serve(app).await;

        let fetch_only =
            crate::service::ArticleService::http_client(Duration::from_secs(1)).unwrap();
        let client = GeminiClient::new(fetch_only, "k", "m", &base);
        assert!(client.summarize("p").await.is_err());

        let llm = http_client(Duration::from_secs(10)).unwrap();
        let client = GeminiClient::new(llm, "k", "m", &base);
        assert_eq!(client.summarize("p").await.unwrap(), "Slow.");
    }

    #[test]
    fn empty_text_counts_as_missing() {
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" x ")), Some("x".to_string()));
    }
}
