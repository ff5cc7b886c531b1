//! Wire messages exchanged with connected clients.
//!
//! The transport itself (WebSocket framing, HTTP routing) is owned by the
//! host; this module only defines the payloads. Inbound frames deserialize
//! into [`ClientMessage`], outbound frames serialize from [`ServerMessage`].
//! Both use an external `type` tag in `SCREAMING_SNAKE_CASE`.

use serde::{Deserialize, Serialize};

use super::HandshakeKind;

/// What a location report resolved to.
///
/// All three variants are normal outcomes; misses are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOutcome {
    /// The reporter has no pending movement wait-tasks.
    NoActiveTasks,
    /// Pending tasks exist but the coordinate is outside all their
    /// destination areas.
    NotInTargetArea,
    /// The coordinate entered the destination of one pending task, which
    /// has been scheduled for resume.
    EnteredArea {
        /// The destination place that matched.
        place_id: String,
        /// Process instance owning the resumed task.
        process_instance_id: String,
        /// Identifier of the resumed task.
        task_id: String,
    },
}

/// Scope a connection can track for live updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingTarget {
    /// Follow one process instance.
    ProcessInstance(String),
    /// Follow every process sharing a business key.
    BusinessKey(String),
}

/// Inbound control and data frames from a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// A GPS sample from the connected user's device.
    LocationUpdate {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Optional correlation scope for the update.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        business_key: Option<String>,
    },
    /// Liveness signal; also refreshes the idle window.
    Heartbeat,
    /// Bind this connection to a tracking scope.
    StartTracking {
        /// The scope to follow.
        target: TrackingTarget,
    },
    /// Clear this connection's tracking scope.
    StopTracking,
}

/// Outbound frames to a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Reply to an inbound [`ClientMessage::Heartbeat`].
    AckHeartbeat,
    /// Reply to a tracking control message.
    AckTracking {
        /// The scope now in effect, `None` after `STOP_TRACKING`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TrackingTarget>,
    },
    /// Reply to a location update, carrying the match result.
    AckLocation {
        /// What the update resolved to.
        #[serde(flatten)]
        outcome: MatchOutcome,
    },
    /// Liveness probe sent to an idle connection.
    Heartbeat,
    /// Unsolicited broadcast: a tracked participant moved.
    PositionBroadcast {
        /// The participant that moved.
        participant_id: String,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Containing place, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        place_id: Option<String>,
    },
    /// Unsolicited broadcast: a two-party handshake completed.
    RendezvousCompleted {
        /// Correlation key of the collaboration.
        business_key: String,
        /// Which handshake kind completed.
        kind: HandshakeKind,
        /// The two participants that matched.
        participants: [String; 2],
    },
    /// Error envelope for a rejected inbound frame.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}
