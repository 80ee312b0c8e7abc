//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a realtime WebSocket connection.
//! Each connection owns one `RealtimeMonitor`; its feed results are forwarded to the
//! socket by a dedicated task, and the monitor is closed when the connection ends.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use misinfo_core::{MonitorEvent, RealtimeMonitor};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::web::{
    dto::FeedItemView,
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Results buffered between the feed and a slow socket.
const OUTBOUND_CAPACITY: usize = 16;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, owner_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, owner_id: Uuid) {
    let client_id = Uuid::new_v4();
    info!(owner = %owner_id, %client_id, "Realtime connection established");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let mut monitor = RealtimeMonitor::new(
        owner_id,
        app_state.engine.clone(),
        app_state.source.clone(),
        app_state.config.monitor_tick,
        outbound_tx,
    );
    let forwarder = tokio::spawn(forward_events(outbound_rx, ws_sender.clone()));

    if !send_message(&ws_sender, &ServerMessage::ConnectionEstablished { client_id }).await {
        monitor.close();
        forwarder.abort();
        return;
    }

    // --- Main Message Loop ---
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let Some(reply) = handle_control(&mut monitor, text.as_str()) else {
                    continue;
                };
                if !send_message(&ws_sender, &reply).await {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                let reply = ServerMessage::Error {
                    message: "Binary frames are not supported".to_string(),
                };
                if !send_message(&ws_sender, &reply).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!(%client_id, "Client sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%client_id, "WebSocket receive failed: {}", e);
                break;
            }
        }
    }

    // --- Cleanup ---
    monitor.close();
    drop(monitor);
    forwarder.abort();
    info!(owner = %owner_id, %client_id, "Realtime connection closed.");
}

/// Applies one client frame to the monitor and returns the reply to send, if any.
///
/// Malformed frames produce an `Error` reply; they never close the connection. A stop
/// is only acknowledged when a feed was running.
pub fn handle_control(monitor: &mut RealtimeMonitor, text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::StartMonitoring) => Some(if monitor.start() {
            ServerMessage::MonitoringStarted {
                message: "Real-time monitoring started".to_string(),
            }
        } else {
            ServerMessage::Error {
                message: "Monitoring is no longer available on this connection".to_string(),
            }
        }),
        Ok(ClientMessage::StopMonitoring) => monitor.stop().then(|| {
            ServerMessage::MonitoringStopped {
                message: "Real-time monitoring stopped".to_string(),
            }
        }),
        Ok(ClientMessage::Ping) => Some(ServerMessage::Pong),
        Err(e) => {
            debug!("Malformed client message: {}", e);
            Some(ServerMessage::Error {
                message: "Invalid message format".to_string(),
            })
        }
    }
}

/// Drains the monitor's channel into the socket until either side goes away.
async fn forward_events(mut outbound: mpsc::Receiver<MonitorEvent>, ws_sender: WsSender) {
    while let Some(event) = outbound.recv().await {
        if !send_message(&ws_sender, &feed_message(event)).await {
            break;
        }
    }
}

fn feed_message(event: MonitorEvent) -> ServerMessage {
    match event {
        MonitorEvent::Result { record, source } => ServerMessage::AnalysisResult {
            data: FeedItemView {
                analysis: (&record).into(),
                source,
            },
        },
        MonitorEvent::Error(message) => ServerMessage::Error { message },
    }
}

/// Serializes and sends one message. Returns `false` once the socket is unusable.
async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return true;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_state;
    use std::time::Duration;

    fn monitor(state: &AppState) -> (RealtimeMonitor, mpsc::Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let monitor = RealtimeMonitor::new(
            Uuid::new_v4(),
            state.engine.clone(),
            state.source.clone(),
            Duration::from_millis(20),
            tx,
        );
        (monitor, rx)
    }

    #[tokio::test]
    async fn start_and_stop_are_acknowledged() {
        let (state, _) = test_state();
        let (mut monitor, mut rx) = monitor(&state);

        let reply = handle_control(&mut monitor, r#"{"type":"START_MONITORING"}"#);
        assert!(matches!(reply, Some(ServerMessage::MonitoringStarted { .. })));

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let json = serde_json::to_value(feed_message(event)).unwrap();
        assert_eq!(json["type"], "ANALYSIS_RESULT");
        assert_eq!(json["data"]["analysisType"], "real-time");
        assert!(matches!(json["data"]["source"].as_str(), Some("Twitter" | "Facebook")));

        let reply = handle_control(&mut monitor, r#"{"type":"STOP_MONITORING"}"#);
        assert!(matches!(reply, Some(ServerMessage::MonitoringStopped { .. })));
    }

    #[tokio::test]
    async fn stop_while_idle_is_not_acknowledged() {
        let (state, _) = test_state();
        let (mut monitor, _rx) = monitor(&state);

        assert!(handle_control(&mut monitor, r#"{"type":"STOP_MONITORING"}"#).is_none());

        handle_control(&mut monitor, r#"{"type":"START_MONITORING"}"#);
        assert!(handle_control(&mut monitor, r#"{"type":"STOP_MONITORING"}"#).is_some());
        assert!(handle_control(&mut monitor, r#"{"type":"STOP_MONITORING"}"#).is_none());
    }

    #[tokio::test]
    async fn malformed_frames_get_an_error_reply() {
        let (state, _) = test_state();
        let (mut monitor, _rx) = monitor(&state);

        for frame in ["{not json", r#"{"type":"REWIND"}"#, r#"{"kind":"PING"}"#] {
            let reply = handle_control(&mut monitor, frame);
            assert!(matches!(reply, Some(ServerMessage::Error { .. })));
        }
        let reply = handle_control(&mut monitor, r#"{"type":"PING"}"#);
        assert!(matches!(reply, Some(ServerMessage::Pong)));
    }

    #[tokio::test]
    async fn closed_monitor_reports_an_error_on_start() {
        let (state, _) = test_state();
        let (mut monitor, _rx) = monitor(&state);
        monitor.close();
        let reply = handle_control(&mut monitor, r#"{"type":"START_MONITORING"}"#);
        assert!(matches!(reply, Some(ServerMessage::Error { .. })));
    }
}
