//! Session hub: live client connections per user.
//!
//! A user may hold several concurrent connections (multi-device). The hub
//! registers an outbound sender per connection, fans broadcasts out to all
//! of a user's connections except an optional excluded one (typically the
//! sender, to avoid echo), and tracks a per-connection tracking target set
//! by an explicit control message and cleared on disconnect or stop.
//!
//! Liveness is a two-stage timeout independent of any workflow timeout: a
//! connection idle past the probe window is sent a heartbeat, and dropped
//! if still silent after a second window.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::HeartbeatConfig;
use crate::types::{ServerMessage, TrackingTarget};

/// Identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerMessage>,
    tracking: Mutex<Option<TrackingTarget>>,
    last_seen: Mutex<Instant>,
    probed: Mutex<bool>,
}

impl Connection {
    fn send(&self, message: ServerMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// Result of one staleness sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Connections probed this sweep.
    pub probed: usize,
    /// Connections closed this sweep.
    pub closed: usize,
}

/// Concurrent registry of live client connections.
///
/// The wire transport is owned by the host: a connection is represented
/// here by the outbound half of an unbounded channel. Dropping the receiver
/// (the host closing the socket) makes sends fail, which the hub treats as
/// a disconnect.
#[derive(Debug, Default)]
pub struct SessionHub {
    sessions: DashMap<String, Vec<Arc<Connection>>>,
}

impl SessionHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection for a user, returning its id.
    pub fn add_session(
        &self,
        user_id: &str,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> ConnectionId {
        let connection = Arc::new(Connection {
            id: ConnectionId::new(),
            sender,
            tracking: Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
            probed: Mutex::new(false),
        });
        let id = connection.id;
        self.sessions
            .entry(user_id.to_string())
            .or_default()
            .push(connection);
        tracing::debug!(user_id, connection = %id, "session added");
        id
    }

    /// Removes one connection. Clears its tracking association. Removing
    /// an unknown connection is a no-op.
    pub fn remove_session(&self, user_id: &str, connection_id: ConnectionId) {
        if let Some(mut connections) = self.sessions.get_mut(user_id) {
            connections.retain(|c| c.id != connection_id);
        }
        self.sessions
            .remove_if(user_id, |_, connections| connections.is_empty());
        tracing::debug!(user_id, connection = %connection_id, "session removed");
    }

    /// Sends to every open connection of a user, except an optional
    /// excluded one. Connections whose receiver is gone are dropped.
    pub fn broadcast(
        &self,
        user_id: &str,
        message: &ServerMessage,
        exclude: Option<ConnectionId>,
    ) {
        let mut dead = Vec::new();
        if let Some(connections) = self.sessions.get(user_id) {
            for connection in connections.iter() {
                if Some(connection.id) == exclude {
                    continue;
                }
                if !connection.send(message.clone()) {
                    dead.push(connection.id);
                }
            }
        }
        for id in dead {
            self.remove_session(user_id, id);
        }
    }

    /// Sends to one specific connection. Returns `false` if it is gone.
    pub fn send_to(
        &self,
        user_id: &str,
        connection_id: ConnectionId,
        message: ServerMessage,
    ) -> bool {
        let sent = self
            .sessions
            .get(user_id)
            .and_then(|connections| {
                connections
                    .iter()
                    .find(|c| c.id == connection_id)
                    .map(|c| c.send(message))
            })
            .unwrap_or(false);
        if !sent {
            self.remove_session(user_id, connection_id);
        }
        sent
    }

    /// Sends to every connection (across all users) tracking the given
    /// target.
    pub fn broadcast_tracking(&self, target: &TrackingTarget, message: &ServerMessage) {
        let mut dead = Vec::new();
        for entry in self.sessions.iter() {
            for connection in entry.value().iter() {
                let tracks = connection.tracking.lock().as_ref() == Some(target);
                if tracks && !connection.send(message.clone()) {
                    dead.push((entry.key().clone(), connection.id));
                }
            }
        }
        for (user_id, id) in dead {
            self.remove_session(&user_id, id);
        }
    }

    /// Binds a connection to a tracking target. Returns `false` if the
    /// connection is unknown.
    pub fn set_tracking(
        &self,
        user_id: &str,
        connection_id: ConnectionId,
        target: TrackingTarget,
    ) -> bool {
        self.with_connection(user_id, connection_id, |connection| {
            *connection.tracking.lock() = Some(target);
        })
    }

    /// Clears a connection's tracking target.
    pub fn clear_tracking(&self, user_id: &str, connection_id: ConnectionId) -> bool {
        self.with_connection(user_id, connection_id, |connection| {
            *connection.tracking.lock() = None;
        })
    }

    /// Clears the given target from every connection tracking it, across
    /// all users. Used when the tracked scope itself ends.
    pub fn clear_tracking_target(&self, target: &TrackingTarget) {
        for entry in self.sessions.iter() {
            for connection in entry.value().iter() {
                let mut tracking = connection.tracking.lock();
                if tracking.as_ref() == Some(target) {
                    *tracking = None;
                }
            }
        }
    }

    /// Marks activity on a connection, resetting its idle window and any
    /// outstanding probe.
    pub fn touch(&self, user_id: &str, connection_id: ConnectionId) {
        self.with_connection(user_id, connection_id, |connection| {
            *connection.last_seen.lock() = Instant::now();
            *connection.probed.lock() = false;
        });
    }

    /// `true` if the user has at least one open connection.
    pub fn is_connected(&self, user_id: &str) -> bool {
        self.sessions
            .get(user_id)
            .map(|connections| !connections.is_empty())
            .unwrap_or(false)
    }

    /// All users with at least one open connection.
    pub fn connected_users(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|e| !e.value().is_empty())
            .map(|e| e.key().clone())
            .collect()
    }

    /// Total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.sessions.iter().map(|e| e.value().len()).sum()
    }

    /// One staleness pass: probes connections idle past `probe_after`,
    /// closes connections still silent `close_after` past their probe.
    pub fn sweep_stale(&self, config: &HeartbeatConfig) -> SweepStats {
        let now = Instant::now();
        let mut stats = SweepStats::default();
        let mut to_close = Vec::new();

        for entry in self.sessions.iter() {
            for connection in entry.value().iter() {
                let idle = now.duration_since(*connection.last_seen.lock());
                let probed = *connection.probed.lock();
                if probed {
                    if idle >= config.probe_after + config.close_after {
                        to_close.push((entry.key().clone(), connection.id));
                    }
                } else if idle >= config.probe_after {
                    if connection.send(ServerMessage::Heartbeat) {
                        *connection.probed.lock() = true;
                        stats.probed += 1;
                    } else {
                        to_close.push((entry.key().clone(), connection.id));
                    }
                }
            }
        }

        for (user_id, id) in to_close {
            tracing::info!(user_id = %user_id, connection = %id, "closing stale connection");
            self.remove_session(&user_id, id);
            stats.closed += 1;
        }
        stats
    }

    fn with_connection<F>(&self, user_id: &str, connection_id: ConnectionId, f: F) -> bool
    where
        F: FnOnce(&Connection),
    {
        self.sessions
            .get(user_id)
            .and_then(|connections| {
                connections
                    .iter()
                    .find(|c| c.id == connection_id)
                    .map(|c| f(c.as_ref()))
            })
            .is_some()
    }
}

/// Handle to the running staleness sweeper. Aborts the task on drop.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the periodic staleness sweep. The sweep period is the probe
/// window halved, so an idle connection is probed at most one and a half
/// windows after its last activity.
pub(crate) fn spawn_sweeper(hub: Arc<SessionHub>, config: HeartbeatConfig) -> SweeperHandle {
    let period = (config.probe_after / 2).max(std::time::Duration::from_millis(10));
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = hub.sweep_stale(&config);
            if stats.probed > 0 || stats.closed > 0 {
                tracing::debug!(probed = stats.probed, closed = stats.closed, "liveness sweep");
            }
        }
    });
    SweeperHandle { task }
}
