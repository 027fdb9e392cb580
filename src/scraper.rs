use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};

/// Column width used when rendering article HTML as text.
const TEXT_WIDTH: usize = 80;

// Wikipedia wraps the rendered article body in this container
static CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#mw-content-text").expect("Failed to parse content selector")
});

/// Only absolute http(s) URLs are accepted.
pub fn validate_url(url: &str) -> Result<Url> {
    let invalid = || AppError::InvalidUrl("URL must start with http or https.".to_string());

    let parsed = Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(invalid()),
    }
}

pub async fn fetch_html(client: &Client, url: &Url) -> Result<String> {
    let response = client.get(url.as_str()).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::HttpStatus(status.as_u16()));
    }

    let html = response.text().await?;
    Ok(html)
}

/// Returns the outer HTML of the article's main content container.
pub fn extract_content(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    document
        .select(&CONTENT_SELECTOR)
        .next()
        .map(|element| element.html())
        .ok_or_else(|| {
            AppError::ContentNotFound(
                "Could not find the main content on the provided Wikipedia URL.".to_string(),
            )
        })
}

pub fn to_markdown(html: &str) -> Result<String> {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map_err(|e| AppError::Conversion(e.to_string()))
}

pub fn build_prompt(content: &str) -> String {
    let mut result = String::with_capacity(content.len() + 200);
    result.push_str("Please summarize the following Wikipedia article text concisely and accurately. Focus on the main points and key information:\n\nArticle Text:\n");
    result.push_str(content);
    result.push_str("\n\nSummary:");
    result
}
