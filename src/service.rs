use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::llm::Summarizer;
use crate::scraper::{build_prompt, extract_content, fetch_html, to_markdown, validate_url};

/// Result of one article run, with the stats logged along the way.
#[derive(Debug, Clone)]
pub struct ArticleSummary {
    pub summary: String,
    pub word_count: usize,
}

/// Fetch → extract → convert → summarize, one article at a time.
pub struct ArticleService {
    http: Client,
    summarizer: Arc<dyn Summarizer>,
}

impl ArticleService {
    pub fn new(http: Client, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { http, summarizer }
    }

    pub fn http_client(fetch_timeout: Duration) -> Result<Client> {
        ClientBuilder::new()
            .timeout(fetch_timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
    }

    pub async fn summarize_article(&self, url: &str) -> Result<ArticleSummary> {
        let url = validate_url(url)?;

        info!(%url, "Fetching article");
        let fetch_start = Instant::now();
        let html = fetch_html(&self.http, &url).await.inspect_err(|e| {
            warn!(%url, error = %e, "Article fetch failed");
        })?;
        debug!(elapsed = ?fetch_start.elapsed(), bytes = html.len(), "HTML fetch successful");

        let content = extract_content(&html)?;
        let markdown = to_markdown(&content)?;
        let word_count = markdown.split_whitespace().count();
        debug!(chars = markdown.len(), word_count, "Converted article content");

        let prompt = build_prompt(&markdown);

        let llm_start = Instant::now();
        let summary = self.summarizer.summarize(&prompt).await.inspect_err(|e| {
            warn!(model = self.summarizer.name(), error = %e, "Summary request failed");
        })?;
        info!(
            model = self.summarizer.name(),
            elapsed = ?llm_start.elapsed(),
            "Summary generated"
        );

        Ok(ArticleSummary {
            summary,
            word_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use axum::{Router, http::StatusCode, routing::get};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct RecordingSummarizer {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn summarize(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("India is a country in South Asia.".to_string())
        }
    }

    async fn wiki() -> String {
        let app = Router::new()
            .route(
                "/wiki/India",
                get(|| async {
                    axum::response::Html(
                        r#"<html><body><div id="mw-content-text"><p>India, officially the Republic of India.</p></div></body></html>"#,
                    )
                }),
            )
            .route(
                "/wiki/Empty",
                get(|| async { axum::response::Html("<html><body><p>Nothing</p></body></html>") }),
            )
            .route(
                "/wiki/Gone",
                get(|| async { (StatusCode::NOT_FOUND, "missing") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn service(summarizer: Arc<RecordingSummarizer>) -> ArticleService {
        let http = ArticleService::http_client(Duration::from_secs(5)).unwrap();
        ArticleService::new(http, summarizer)
    }

    #[tokio::test]
    async fn summarizes_article_content() {
        let base = wiki().await;
        let summarizer = Arc::new(RecordingSummarizer::default());
        let svc = service(summarizer.clone());

        let result = svc
            .summarize_article(&format!("{}/wiki/India", base))
            .await
            .unwrap();
        assert!(!result.summary.is_empty());
        assert!(result.word_count > 0);

        let prompts = summarizer.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("officially the Republic of India"));
    }

    #[tokio::test]
    async fn page_without_content_is_invalid_params() {
        let base = wiki().await;
        let summarizer = Arc::new(RecordingSummarizer::default());
        let svc = service(summarizer.clone());

        let err = svc
            .summarize_article(&format!("{}/wiki/Empty", base))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert!(summarizer.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_200_is_internal_error() {
        let base = wiki().await;
        let svc = service(Arc::new(RecordingSummarizer::default()));

        let err = svc
            .summarize_article(&format!("{}/wiki/Gone", base))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn bad_scheme_never_fetches() {
        let svc = service(Arc::new(RecordingSummarizer::default()));
        let err = svc.summarize_article("ftp://en.wikipedia.org").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }
}
