//! Client WebSocket sessions.
//!
//! One task per connection. The read side handles subscribe and unsubscribe
//! frames; a writer task drains the hub's outbound queue for this
//! connection. Closing either side ends the session and removes the
//! connection from every room.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use crate::application::services::SubscriptionHub;
use crate::domain::market::Tick;
use crate::domain::subscription::ConnectionId;

use super::ApiState;

/// Client to server frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Join the room for `symbol`.
    Subscribe {
        /// Symbol to watch.
        symbol: String,
    },
    /// Leave the room for `symbol`.
    Unsubscribe {
        /// Symbol to stop watching.
        symbol: String,
    },
}

/// Server to client frame.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ServerFrame<'a> {
    /// A price update.
    Tick {
        /// The tick.
        data: &'a Tick,
    },
}

pub(super) async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| session(socket, hub))
}

async fn session(socket: WebSocket, hub: Arc<SubscriptionHub>) {
    let (conn, mut ticks) = hub.connect();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!(conn, "Client connected");

    let writer = tokio::spawn(async move {
        while let Some(tick) = ticks.recv().await {
            let json = match serde_json::to_string(&ServerFrame::Tick { data: &tick }) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(error = %e, "Tick serialization failed");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_frame(&hub, conn, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn, error = %e, "Client socket error");
                break;
            }
        }
    }

    hub.disconnect(conn);
    writer.abort();
    tracing::info!(conn, "Client disconnected");
}

async fn handle_frame(hub: &SubscriptionHub, conn: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Subscribe { symbol }) => {
            tracing::debug!(conn, symbol = %symbol, "Client subscribed");
            hub.join(conn, &symbol).await;
        }
        Ok(ClientFrame::Unsubscribe { symbol }) => {
            tracing::debug!(conn, symbol = %symbol, "Client unsubscribed");
            hub.leave(conn, &symbol);
        }
        Err(e) => tracing::debug!(conn, error = %e, "Ignoring malformed client frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_parse() {
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"event":"subscribe","symbol":"TCS"}"#).unwrap(),
            ClientFrame::Subscribe {
                symbol: "TCS".to_string()
            }
        );
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"event":"unsubscribe","symbol":"TCS"}"#)
                .unwrap(),
            ClientFrame::Unsubscribe {
                symbol: "TCS".to_string()
            }
        );
    }

    #[test]
    fn unknown_or_incomplete_frames_are_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"event":"ping"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"event":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>("subscribe TCS").is_err());
    }

    #[test]
    fn tick_frame_shape() {
        let tick = Tick {
            symbol: "TCS.NS".to_string(),
            price: 3500.5,
            ..Tick::default()
        };

        let value = serde_json::to_value(ServerFrame::Tick { data: &tick }).unwrap();

        assert_eq!(value["event"], "tick");
        assert_eq!(value["data"]["symbol"], "TCS.NS");
        assert_eq!(value["data"]["changePercent"], 0.0);
        assert_eq!(value["data"]["dayHigh"], 0.0);
    }
}
