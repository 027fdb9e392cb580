use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{Json, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use chrono::Utc;
use futures::stream::Stream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::api::models::{HealthStatus, MessageQuery, SummarizeRequest, SummarizeResponse};
use crate::api::response;
use crate::error::{AppError, Result};
use crate::mcp::{DispatchError, SERVER_NAME};
use crate::mcp::protocol::JsonRpcRequest;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages/";

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route(SSE_PATH, get(sse_handler))
        .route(MESSAGES_PATH, post(message_handler))
        .route("/api/summarize", post(summarize_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Opens a session: announces the message endpoint, then streams responses.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + Send> {
    let (session_id, mut events) = state.sessions.open(state.mcp_handler()).await;
    let endpoint = format!("{}?session_id={}", MESSAGES_PATH, session_id.simple());

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint));
        while let Some(event) = events.recv().await {
            yield Ok(event);
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Side-channel for client messages; replies arrive on the session's SSE stream.
async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return response::error::<()>(StatusCode::BAD_REQUEST, "session_id is required")
            .into_response();
    };

    let Ok(session_id) = Uuid::parse_str(&raw_id) else {
        warn!(session = %raw_id, "Received invalid session ID");
        return response::error::<()>(StatusCode::BAD_REQUEST, "Invalid session ID")
            .into_response();
    };

    if !state.sessions.contains(session_id).await {
        return response::error::<()>(StatusCode::NOT_FOUND, "Could not find session")
            .into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(session = %raw_id, error = %e, "Failed to parse message");
            return response::error::<()>(StatusCode::BAD_REQUEST, "Could not parse message")
                .into_response();
        }
    };

    match state.sessions.dispatch(session_id, request).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(DispatchError::NotFound) => {
            response::error::<()>(StatusCode::NOT_FOUND, "Could not find session").into_response()
        }
        Err(DispatchError::Busy) => {
            warn!(session = %raw_id, "Session queue full");
            response::error::<()>(StatusCode::SERVICE_UNAVAILABLE, "Session is busy")
                .into_response()
        }
    }
}

/// Same pipeline as the tool, over a plain request/response endpoint.
async fn summarize_handler(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<impl IntoResponse> {
    info!(url = %req.url, "Processing summarize request");
    let start_time = Instant::now();

    let article = tokio::time::timeout(
        state.config.tool_timeout,
        state.service.summarize_article(&req.url),
    )
    .await
    .map_err(|_| AppError::Timeout("Request processing timed out".to_string()))??;

    info!(url = %req.url, elapsed = ?start_time.elapsed(), "Summarize request completed");
    Ok(response::success(SummarizeResponse {
        url: req.url,
        summary: article.summary,
        summarized_at: Utc::now(),
        word_count: article.word_count,
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(HealthStatus {
        status: "ok".to_string(),
        service: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.sessions.len().await,
    })
}
