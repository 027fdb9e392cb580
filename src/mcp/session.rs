//! Live SSE sessions and their request workers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::response::sse::Event;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::mcp::handler::McpHandler;
use crate::mcp::protocol::JsonRpcRequest;

const CHANNEL_CAPACITY: usize = 32;

/// Why a message could not be queued for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    NotFound,
    /// The worker's queue is full; the caller is told instead of waiting.
    Busy,
}

/// Maps session ids to the inbound queue of each session's worker.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcRequest>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and start its worker.
    ///
    /// Returns the session id and the receiver of the events to stream back.
    pub async fn open(&self, handler: McpHandler) -> (Uuid, mpsc::Receiver<Event>) {
        let id = Uuid::new_v4();
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        self.sessions.write().await.insert(id, inbound_tx);
        info!(session = %id.simple(), "Session opened");

        tokio::spawn(run_session(
            id,
            handler,
            inbound_rx,
            outbound_tx,
            self.clone(),
        ));

        (id, outbound_rx)
    }

    /// Queue a message for a session without waiting on a busy worker.
    pub async fn dispatch(
        &self,
        id: Uuid,
        request: JsonRpcRequest,
    ) -> Result<(), DispatchError> {
        let sender = self.sessions.read().await.get(&id).cloned();
        let Some(sender) = sender else {
            return Err(DispatchError::NotFound);
        };
        sender.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::Busy,
            TrySendError::Closed(_) => DispatchError::NotFound,
        })
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }
}

/// Processes one session's requests strictly in arrival order.
async fn run_session(
    id: Uuid,
    handler: McpHandler,
    mut inbound: mpsc::Receiver<JsonRpcRequest>,
    outbound: mpsc::Sender<Event>,
    registry: SessionRegistry,
) {
    loop {
        let request = tokio::select! {
            _ = outbound.closed() => break,
            request = inbound.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        debug!(session = %id.simple(), method = %request.method, "Handling request");
        // A disconnect drops the in-flight call along with its outbound requests
        let response = tokio::select! {
            _ = outbound.closed() => {
                info!(session = %id.simple(), "Client disconnected mid-request");
                break;
            }
            response = handler.handle(request) => response,
        };
        let Some(response) = response else {
            continue;
        };

        let data = match serde_json::to_string(&response) {
            Ok(data) => data,
            Err(e) => {
                error!(session = %id.simple(), error = %e, "Failed to serialize response");
                continue;
            }
        };

        if outbound
            .send(Event::default().event("message").data(data))
            .await
            .is_err()
        {
            break;
        }
    }

    registry.remove(id).await;
    info!(session = %id.simple(), "Session closed");
}
