use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3-0324";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Which hosted model backs the summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
    },
    OpenRouter {
        api_key: String,
        model: String,
        base_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub llm: LlmProvider,
    pub fetch_timeout: Duration,
    pub tool_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "127.0.0.1");
        let port = var("PORT", "8000");
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let provider = var("LLM_PROVIDER", "gemini").to_lowercase();
        let llm = match provider.as_str() {
            "gemini" => LlmProvider::Gemini {
                api_key: lookup("GOOGLE_API_KEY").ok_or_else(|| {
                    AppError::Config("GOOGLE_API_KEY environment variable not set".to_string())
                })?,
                model: var("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            },
            "openrouter" => LlmProvider::OpenRouter {
                api_key: lookup("OPENROUTER_API_KEY").ok_or_else(|| {
                    AppError::Config("OPENROUTER_API_KEY environment variable not set".to_string())
                })?,
                model: var("OPENROUTER_MODEL", DEFAULT_OPENROUTER_MODEL),
                base_url: var("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL),
            },
            other => {
                return Err(AppError::Config(format!("Unknown LLM provider: {}", other)));
            }
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            llm,
            fetch_timeout: parse_secs(&var("FETCH_TIMEOUT_SECS", "10"), "FETCH_TIMEOUT_SECS")?,
            tool_timeout: parse_secs(&var("TOOL_TIMEOUT_SECS", "90"), "TOOL_TIMEOUT_SECS")?,
        })
    }
}

fn parse_secs(value: &str, key: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
