//! HTTP and websocket sink.
//!
//! `GET /api/snapshot` answers with the aggregate as it is right now.
//! `GET /websocket` pushes the current snapshot on connect and then every
//! snapshot the reporter emits through [`BroadcastSink`].

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracewatch_core::{report::SnapshotSink, Aggregator, Snapshot};

/// Snapshots buffered per websocket client before it starts skipping.
const UPDATE_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ServerState {
    aggregator: Arc<Aggregator>,
    updates: broadcast::Sender<String>,
    cancel: CancellationToken,
}

impl ServerState {
    pub fn new(aggregator: Arc<Aggregator>, cancel: CancellationToken) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self { aggregator, updates, cancel }
    }

    /// Sink that fans reporter snapshots out to every connected client.
    pub fn sink(&self) -> BroadcastSink {
        BroadcastSink { tx: self.updates.clone() }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.updates.subscribe()
    }
}

/// [`SnapshotSink`] that serializes each snapshot once and broadcasts the
/// JSON text. Having no connected clients is not an error.
pub struct BroadcastSink {
    tx: broadcast::Sender<String>,
}

impl SnapshotSink for BroadcastSink {
    fn emit(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let json = serde_json::to_string(snapshot)?;
        let clients = self.tx.send(json).unwrap_or(0);
        tracing::trace!(clients, "snapshot broadcast");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/snapshot", get(api_snapshot))
        .route("/websocket", get(ws_handler))
        .with_state(state)
}

/// Bind `listen` and serve until `cancel` fires.
pub async fn serve(state: ServerState, listen: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    tracing::info!(addr = %listener.local_addr()?, "serving snapshots");

    let cancel = state.cancel.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("snapshot server failed")?;
    tracing::info!("snapshot server stopped");
    Ok(())
}

async fn api_snapshot(State(state): State<ServerState>) -> Json<Snapshot> {
    Json(state.aggregator.snapshot())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before reading the initial snapshot so no tick falls between.
    let mut updates = state.subscribe();

    let initial = match serde_json::to_string(&state.aggregator.snapshot()) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize snapshot");
            return;
        }
    };
    if sender.send(Message::Text(initial.into())).await.is_err() {
        return;
    }
    tracing::debug!("websocket client connected");

    let send_task = async {
        loop {
            match updates.recv().await {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "websocket client lagging; skipped snapshots");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    // Clients never send anything meaningful; drain until they close.
    let recv_task = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    };

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
        _ = state.cancel.cancelled() => {}
    }
    tracing::debug!("websocket client disconnected");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
