pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod scraper;
pub mod service;

use std::sync::Arc;

use config::Config;
use error::Result;
use llm::{Summarizer, build_summarizer};
use mcp::{McpHandler, SessionRegistry};
use service::ArticleService;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<ArticleService>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// State backed by the provider named in the config.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetch = ArticleService::http_client(config.fetch_timeout)?;
        let summarizer = build_summarizer(llm::http_client(config.tool_timeout)?, &config.llm);
        Ok(Self::with_summarizer(config, fetch, summarizer))
    }

    pub fn with_summarizer(
        config: Config,
        http: reqwest::Client,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(ArticleService::new(http, summarizer)),
            sessions: SessionRegistry::new(),
        }
    }

    pub fn mcp_handler(&self) -> McpHandler {
        McpHandler::new(self.service.clone(), self.config.tool_timeout)
    }
}
