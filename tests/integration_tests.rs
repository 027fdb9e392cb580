use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use wiki_summary::client::{self, ClientError, McpClient};
use wiki_summary::config::Config;
use wiki_summary::llm::Summarizer;
use wiki_summary::mcp::protocol::{INTERNAL_ERROR, INVALID_PARAMS};
use wiki_summary::mcp::tools::SUMMARIZE_TOOL;
use wiki_summary::{AppState, api::routes::create_router};

const TIMEOUT: Duration = Duration::from_secs(10);

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    fn name(&self) -> &str {
        "echo"
    }

    async fn summarize(&self, prompt: &str) -> wiki_summary::error::Result<String> {
        let words = prompt.split_whitespace().count();
        Ok(format!("Summary of a prompt with {words} words."))
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Stand-in for Wikipedia.
async fn wiki() -> SocketAddr {
    serve(
        Router::new()
            .route(
                "/wiki/India",
                get(|| async {
                    Html(
                        r#"<html><head><title>India</title></head><body>
                        <div id="mw-content-text"><p><b>India</b> is a country in South Asia.</p>
                        <p>It is the seventh-largest country by area.</p></div>
                        </body></html>"#,
                    )
                }),
            )
            .route(
                "/wiki/Main_Page",
                get(|| async { Html("<html><body><div id=\"portal\">Welcome</div></body></html>") }),
            )
            .route(
                "/wiki/Missing",
                get(|| async { (StatusCode::NOT_FOUND, "Wikipedia does not have an article") }),
            ),
    )
    .await
}

fn test_config(extra: &[(&str, String)]) -> Config {
    let extra: Vec<(String, String)> = extra
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Config::from_lookup(move |key| {
        extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| (key == "GOOGLE_API_KEY").then(|| "test-key".to_string()))
    })
    .unwrap()
}

async fn host() -> SocketAddr {
    let config = test_config(&[]);
    let state = AppState::with_summarizer(config, reqwest::Client::new(), Arc::new(EchoSummarizer));
    serve(create_router(state)).await
}

fn sse_url(addr: SocketAddr) -> String {
    format!("http://{addr}/sse")
}

fn rpc_code(err: ClientError) -> i32 {
    match err {
        ClientError::JsonRpc(e) => e.code,
        other => panic!("expected JSON-RPC error, got {other}"),
    }
}

#[tokio::test]
async fn summarizes_article_end_to_end() {
    let wiki = wiki().await;
    let host = host().await;

    let summary = client::summarize_article(
        &sse_url(host),
        &format!("http://{wiki}/wiki/India"),
        TIMEOUT,
    )
    .await;

    assert!(summary.starts_with("Summary of a prompt with"), "{summary}");
}

#[tokio::test]
async fn handshake_and_tool_listing() {
    let host = host().await;

    let mut session = McpClient::connect(&sse_url(host), TIMEOUT).await.unwrap();
    assert_eq!(session.endpoint().path(), "/messages/");

    let info = session.initialize().await.unwrap();
    assert_eq!(info.server_info.name, "wiki-summary-gemini");
    assert!(info.capabilities.tools.is_some());

    let tools = session.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, SUMMARIZE_TOOL);
}

#[tokio::test]
async fn page_without_content_container_is_invalid_params() {
    let wiki = wiki().await;
    let host = host().await;

    let err = client::try_summarize_article(
        &sse_url(host),
        &format!("http://{wiki}/wiki/Main_Page"),
        TIMEOUT,
    )
    .await
    .unwrap_err();
    assert_eq!(rpc_code(err), INVALID_PARAMS);
}

#[tokio::test]
async fn missing_article_is_internal_error() {
    let wiki = wiki().await;
    let host = host().await;

    let err = client::try_summarize_article(
        &sse_url(host),
        &format!("http://{wiki}/wiki/Missing"),
        TIMEOUT,
    )
    .await
    .unwrap_err();
    assert_eq!(rpc_code(err), INTERNAL_ERROR);
}

#[tokio::test]
async fn failures_render_as_error_text() {
    let host = host().await;

    let text = client::summarize_article(&sse_url(host), "not-a-url", TIMEOUT).await;
    assert_eq!(text, "Error: [-32602] URL must start with http or https.");

    // Nothing listens on port 9 locally
    let text = client::summarize_article("http://127.0.0.1:9/sse", "https://x", TIMEOUT).await;
    assert!(text.starts_with("Error: "), "{text}");
}

#[tokio::test]
async fn one_session_serves_sequential_calls() {
    let wiki = wiki().await;
    let host = host().await;

    let mut session = McpClient::connect(&sse_url(host), TIMEOUT).await.unwrap();
    session.initialize().await.unwrap();

    let url = format!("http://{wiki}/wiki/India");
    for _ in 0..2 {
        let result = session
            .call_tool(SUMMARIZE_TOOL, json!({ "url": url }))
            .await
            .unwrap();
        assert_eq!(result["isError"], false);
        assert!(!client::extract_text(&result).is_empty());
    }

    let err = session
        .call_tool(SUMMARIZE_TOOL, json!({ "link": url }))
        .await
        .unwrap_err();
    assert_eq!(rpc_code(err), INVALID_PARAMS);
}

#[tokio::test]
async fn gemini_provider_from_config() {
    let wiki = wiki().await;
    let gemini = serve(Router::new().route(
        "/v1beta/models/:model",
        post(|Json(body): Json<Value>| async move {
            let prompt = body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default();
            let text = if prompt.contains("seventh-largest") {
                "India: large South Asian country."
            } else {
                ""
            };
            Json(json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}))
        }),
    ))
    .await;

    let config = test_config(&[("GEMINI_BASE_URL", format!("http://{gemini}/v1beta"))]);
    let host = serve(create_router(AppState::from_config(config).unwrap())).await;

    let summary = client::summarize_article(
        &sse_url(host),
        &format!("http://{wiki}/wiki/India"),
        TIMEOUT,
    )
    .await;
    assert_eq!(summary, "India: large South Asian country.");
}

#[tokio::test]
async fn plain_http_summarize_endpoint() {
    let wiki = wiki().await;
    let host = host().await;

    let response = reqwest::Client::new()
        .post(format!("http://{host}/api/summarize"))
        .json(&json!({ "url": format!("http://{wiki}/wiki/India") }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["word_count"].as_u64().unwrap() > 0);
    assert!(body["data"]["summary"].as_str().unwrap().starts_with("Summary"));
    assert_eq!(body["meta"]["status"], "success");
}

#[tokio::test]
async fn model_slower_than_fetch_timeout_still_answers() {
    let wiki = wiki().await;
    let gemini = serve(Router::new().route(
        "/v1beta/models/:model",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            Json(json!({"candidates": [{"content": {"parts": [{"text": "Took a while."}]}}]}))
        }),
    ))
    .await;

    let config = test_config(&[
        ("GEMINI_BASE_URL", format!("http://{gemini}/v1beta")),
        ("FETCH_TIMEOUT_SECS", "1".to_string()),
    ]);
    let host = serve(create_router(AppState::from_config(config).unwrap())).await;

    let summary = client::summarize_article(
        &sse_url(host),
        &format!("http://{wiki}/wiki/India"),
        TIMEOUT,
    )
    .await;
    assert_eq!(summary, "Took a while.");
}
