//! WebSocket push channel for live-view subscribers.
//!
//! Each connection owns a broadcast receiver; subscription is the
//! connection lifecycle. A failed socket write ends the connection's
//! forward task, which drops the receiver and deregisters the
//! subscriber without touching anyone else.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::application::broadcast::{Event, EventKind};
use crate::application::state::AppState;

/// Handle a WebSocket upgrade on `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let rx = state.broadcaster.subscribe();
    let seed = state.pipeline.latest_reading().await;
    ws.on_upgrade(move |socket| handle_connection(socket, rx, seed.map(|r| Event::new(EventKind::Powerwall, &r))))
}

async fn handle_connection(
    socket: WebSocket,
    mut rx: broadcast::Receiver<Event>,
    seed: Option<Event>,
) {
    info!("live view connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        // Seed the display with the last known reading so it renders
        // before the next poll lands.
        if let Some(event) = seed {
            if send_event(&mut ws_sender, &event).await.is_err() {
                return;
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if send_event(&mut ws_sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // A slow display only loses its own events.
                    warn!("live view lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Drain client frames so pings are answered until the peer closes.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Close(_) => break,
                other => debug!("ignoring client frame: {:?}", other),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("live view disconnected");
}

async fn send_event<S>(sender: &mut S, event: &Event) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize event: {}", e);
            return Ok(());
        }
    };

    sender.send(Message::Text(json)).await.map_err(|_| ())
}
