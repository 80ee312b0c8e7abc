//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the dashboard client and the API
//! server for realtime monitoring. Every frame is a JSON text frame tagged by `type`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::dto::FeedItemView;

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Represents the control messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Starts the periodic feed. A second start replaces the running feed.
    StartMonitoring,

    /// Stops the feed. The connection stays open and monitoring can be restarted.
    StopMonitoring,

    Ping,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// Represents the messages the server pushes to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Greets a freshly upgraded connection.
    ConnectionEstablished {
        #[serde(rename = "clientId")]
        client_id: Uuid,
    },

    /// One analysed feed item.
    AnalysisResult { data: FeedItemView },

    MonitoringStarted { message: String },

    MonitoringStopped { message: String },

    Pong,

    /// Reports a failed tick or a malformed client message. The channel stays open.
    Error { message: String },
}
