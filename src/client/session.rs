//! One client connection to a tool host.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::client::error::{ClientError, Result};
use crate::client::sse::{SseDecoder, SseEvent};
use crate::mcp::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, RequestId, Tool,
};

pub const CLIENT_NAME: &str = "wiki-summary-client";

/// Default wait for any single response; summaries can take a while.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

type EventStream = Pin<Box<dyn Stream<Item = Result<SseEvent>> + Send>>;

/// Handle to an open SSE session with a tool host.
pub struct McpClient {
    http: Client,
    events: EventStream,
    endpoint: Url,
    next_id: i64,
    timeout: Duration,
}

impl McpClient {
    /// Open the event stream and wait for the host to announce its message endpoint.
    pub async fn connect(server_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(server_url)?;
        let http = Client::new();

        let response = http
            .get(base.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut events = event_stream(response);
        let endpoint = tokio::time::timeout(timeout, wait_for_endpoint(&mut events, &base))
            .await
            .map_err(|_| ClientError::Timeout)??;

        info!(%endpoint, "Connected to tool host");
        Ok(Self {
            http,
            events,
            endpoint,
            next_id: 1,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run the initialize handshake, including the `initialized` notification.
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let result = self
            .request("initialize", Some(InitializeParams::for_client(CLIENT_NAME)))
            .await?;
        let result: InitializeResult = serde_json::from_value(result)?;

        self.post(&JsonRpcRequest::notification("notifications/initialized"))
            .await?;

        debug!(
            server = %result.server_info.name,
            protocol = %result.protocol_version,
            "Session initialized"
        );
        Ok(result)
    }

    pub async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        let result = self.request("tools/list", None::<()>).await?;
        let result: ListToolsResult = serde_json::from_value(result)?;
        Ok(result.tools)
    }

    /// Call a tool and return the raw `result` value.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        self.request("tools/call", Some(params)).await
    }

    async fn request<P: Serialize>(&mut self, method: &str, params: Option<P>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut request = JsonRpcRequest::new(id, method);
        if let Some(p) = params {
            request = request.with_params(p);
        }
        self.post(&request).await?;

        let expected = RequestId::Number(id);
        let response = tokio::time::timeout(self.timeout, self.wait_for(&expected))
            .await
            .map_err(|_| ClientError::Timeout)??;

        Ok(response.into_result()?)
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn wait_for(&mut self, id: &RequestId) -> Result<JsonRpcResponse> {
        while let Some(event) = self.events.next().await {
            let event = event?;
            if event.event != "message" {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(&event.data) {
                Ok(response) => response,
                Err(e) => {
                    debug!(error = %e, "Ignoring non-response message");
                    continue;
                }
            };
            if &response.id == id {
                return Ok(response);
            }
        }
        Err(ClientError::StreamClosed)
    }
}

/// The host announces where to POST messages as its first event.
async fn wait_for_endpoint(events: &mut EventStream, base: &Url) -> Result<Url> {
    while let Some(event) = events.next().await {
        let event = event?;
        if event.event == "endpoint" {
            return Ok(base.join(event.data.trim())?);
        }
    }
    Err(ClientError::StreamClosed)
}

fn event_stream(response: reqwest::Response) -> EventStream {
    let mut bytes = response.bytes_stream();
    let stream = async_stream::try_stream! {
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(ClientError::from)?;
            for event in decoder.push(&chunk) {
                yield event;
            }
        }
    };
    Box::pin(stream)
}
