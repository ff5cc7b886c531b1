//! The coordination engine facade.
//!
//! [`CoordinationEngine`] wires the place registry, position store,
//! rendezvous registry, session hub, movement matcher, and resume
//! dispatcher behind one surface the host embeds: the host feeds it client
//! frames and wait-task lifecycle notifications, and hands it an
//! outbound sender per connection.
//!
//! Process state stays in the host engine throughout; this crate only
//! coordinates who is where and which suspended execution to wake.

use std::sync::Arc;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::constants::VAR_HANDSHAKE_COMPLETE;
use crate::dispatch::{ResumeDispatcher, ResumeRequest};
use crate::error::{EngineError, Result};
use crate::geofence::PlaceRegistry;
use crate::host::{ExecutionHandle, ProcessEngine, WaitTask, WaitTaskKind};
use crate::hub::{ConnectionId, SessionHub, SweeperHandle};
use crate::movement::MovementMatcher;
use crate::participants::ParticipantCache;
use crate::position::PositionStore;
use crate::reconciler::{self, ReconcilerDeps, ReconcilerHandle};
use crate::rendezvous::{Arrival, RendezvousRegistry, WaitingRecord};
use crate::types::{
    ClientMessage, GeoPoint, HandshakeKind, MatchOutcome, ServerMessage, TrackingTarget,
};

/// Handles to the engine's background tasks. Both abort on drop.
#[derive(Debug)]
pub struct EngineTasks {
    reconciler: ReconcilerHandle,
    sweeper: SweeperHandle,
}

impl EngineTasks {
    /// Stops the reconciler and the liveness sweeper.
    pub fn shutdown(self) {
        self.reconciler.shutdown();
        self.sweeper.shutdown();
    }
}

/// Builder for [`CoordinationEngine`].
pub struct EngineBuilder {
    host: Arc<dyn ProcessEngine>,
    places: Arc<PlaceRegistry>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Sets the place catalog. Defaults to an empty registry.
    pub fn with_places(mut self, places: Arc<PlaceRegistry>) -> Self {
        self.places = places;
        self
    }

    /// Sets the engine configuration. Defaults to [`EngineConfig::default`].
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine and spawns its dispatcher workers.
    pub fn build(self) -> Arc<CoordinationEngine> {
        let dispatcher = Arc::new(ResumeDispatcher::spawn(
            Arc::clone(&self.host),
            &self.config.dispatcher,
        ));
        let movement = MovementMatcher::new(
            Arc::clone(&self.host),
            Arc::clone(&self.places),
            Arc::clone(&dispatcher),
        );
        Arc::new(CoordinationEngine {
            participants: ParticipantCache::new(Arc::clone(&self.host)),
            host: self.host,
            places: self.places,
            positions: Arc::new(PositionStore::new()),
            rendezvous: Arc::new(RendezvousRegistry::new()),
            hub: Arc::new(SessionHub::new()),
            dispatcher,
            movement,
            config: self.config,
        })
    }
}

/// Embeddable rendezvous and geofencing coordinator.
pub struct CoordinationEngine {
    host: Arc<dyn ProcessEngine>,
    config: EngineConfig,
    places: Arc<PlaceRegistry>,
    positions: Arc<PositionStore>,
    rendezvous: Arc<RendezvousRegistry>,
    hub: Arc<SessionHub>,
    participants: ParticipantCache,
    dispatcher: Arc<ResumeDispatcher>,
    movement: MovementMatcher,
}

impl std::fmt::Debug for CoordinationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationEngine")
            .field("places", &self.places.len())
            .field("positions", &self.positions.len())
            .field("pending_rendezvous", &self.rendezvous.len())
            .finish()
    }
}

impl CoordinationEngine {
    /// Starts building an engine against the given host.
    pub fn builder(host: Arc<dyn ProcessEngine>) -> EngineBuilder {
        EngineBuilder {
            host,
            places: Arc::new(PlaceRegistry::new()),
            config: EngineConfig::default(),
        }
    }

    /// Spawns the proximity reconciler and the connection liveness sweeper.
    pub fn start(self: &Arc<Self>) -> EngineTasks {
        let deps = ReconcilerDeps {
            rendezvous: Arc::clone(&self.rendezvous),
            positions: Arc::clone(&self.positions),
            places: Arc::clone(&self.places),
            dispatcher: Arc::clone(&self.dispatcher),
        };
        EngineTasks {
            reconciler: reconciler::spawn(deps, self.config.reconcile_interval),
            sweeper: crate::hub::spawn_sweeper(
                Arc::clone(&self.hub),
                self.config.heartbeat.clone(),
            ),
        }
    }

    /// The place catalog.
    pub fn places(&self) -> &PlaceRegistry {
        &self.places
    }

    /// The last-known-position store.
    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    /// The session hub.
    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// The participant cache.
    pub fn participants(&self) -> &ParticipantCache {
        &self.participants
    }

    /// Registers a new client connection for a user.
    pub fn connect(
        &self,
        user_id: &str,
        sender: tokio::sync::mpsc::UnboundedSender<ServerMessage>,
    ) -> ConnectionId {
        self.hub.add_session(user_id, sender)
    }

    /// Removes a client connection. Idempotent.
    pub fn disconnect(&self, user_id: &str, connection: ConnectionId) {
        self.hub.remove_session(user_id, connection);
    }

    /// Handles one raw inbound frame from a connection.
    ///
    /// Always produces a reply: a malformed frame or a failed operation
    /// yields an [`ServerMessage::Error`] envelope instead of dropping the
    /// frame silently.
    pub async fn handle_frame(
        &self,
        user_id: &str,
        connection: ConnectionId,
        raw: &str,
    ) -> ServerMessage {
        let message = match serde_json::from_str::<ClientMessage>(raw) {
            Ok(message) => message,
            Err(err) => {
                let err = EngineError::MalformedMessage(err.to_string());
                tracing::debug!(user_id, error = %err, "rejected inbound frame");
                return ServerMessage::Error {
                    message: err.to_string(),
                };
            },
        };
        match self.handle_message(user_id, connection, message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::debug!(user_id, error = %err, "inbound frame failed");
                ServerMessage::Error {
                    message: err.to_string(),
                }
            },
        }
    }

    /// Handles one decoded inbound message from a connection.
    ///
    /// Any inbound traffic counts as liveness and resets the connection's
    /// idle window.
    pub async fn handle_message(
        &self,
        user_id: &str,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<ServerMessage> {
        self.hub.touch(user_id, connection);
        match message {
            ClientMessage::LocationUpdate {
                lat,
                lon,
                business_key,
            } => {
                let outcome = self
                    .report_location_from(
                        user_id,
                        Some(connection),
                        lat,
                        lon,
                        business_key.as_deref(),
                    )
                    .await?;
                Ok(ServerMessage::AckLocation { outcome })
            },
            ClientMessage::Heartbeat => Ok(ServerMessage::AckHeartbeat),
            ClientMessage::StartTracking { target } => {
                self.hub.set_tracking(user_id, connection, target.clone());
                Ok(ServerMessage::AckTracking {
                    target: Some(target),
                })
            },
            ClientMessage::StopTracking => {
                self.hub.clear_tracking(user_id, connection);
                Ok(ServerMessage::AckTracking { target: None })
            },
        }
    }

    /// Processes one location report for a user.
    ///
    /// Validates the coordinate, stores the position with its resolved
    /// place, broadcasts it to trackers and the user's other connections,
    /// checks pending movement tasks, and finally gives any co-located
    /// mutual handshake waits under the business key a chance to complete.
    pub async fn report_location(
        &self,
        user_id: &str,
        lat: f64,
        lon: f64,
        business_key: Option<&str>,
    ) -> Result<MatchOutcome> {
        self.report_location_from(user_id, None, lat, lon, business_key)
            .await
    }

    async fn report_location_from(
        &self,
        user_id: &str,
        reporting_connection: Option<ConnectionId>,
        lat: f64,
        lon: f64,
        business_key: Option<&str>,
    ) -> Result<MatchOutcome> {
        let point = GeoPoint::new(lat, lon)?;
        let place = self.places.resolve(lat, lon);
        let place_id = place.map(|p| p.id);
        self.positions.update(user_id, point, place_id.clone());

        let broadcast = ServerMessage::PositionBroadcast {
            participant_id: user_id.to_string(),
            lat,
            lon,
            place_id,
        };
        self.hub.broadcast(user_id, &broadcast, reporting_connection);
        if let Some(business_key) = business_key {
            self.hub.broadcast_tracking(
                &TrackingTarget::BusinessKey(business_key.to_string()),
                &broadcast,
            );
        }

        let outcome = self.movement.check_update(user_id, point, business_key).await?;

        if let Some(business_key) = business_key {
            self.check_rendezvous(business_key).await;
        }
        Ok(outcome)
    }

    /// Notifies the engine that an execution entered a wait-task.
    ///
    /// Movement waits only mark the suspension; they complete from later
    /// location updates. Handshake waits additionally register an arrival
    /// and, when the counterpart is already waiting, complete immediately.
    pub async fn wait_task_started(
        &self,
        owner: &str,
        business_key: &str,
        task: &WaitTask,
    ) -> Result<()> {
        self.host.suspend_task(&task.task_id).await?;
        match &task.kind {
            WaitTaskKind::Movement {
                destination_place_id,
            } => {
                tracing::debug!(
                    owner,
                    business_key,
                    place_id = %destination_place_id,
                    "movement wait registered"
                );
                Ok(())
            },
            WaitTaskKind::Handshake {
                kind,
                counterpart,
                required_place,
            } => {
                let mut record = WaitingRecord::new(
                    business_key,
                    owner,
                    counterpart,
                    *kind,
                    task.execution.clone(),
                );
                if let Some(place_id) = required_place {
                    record = record.with_required_place(place_id);
                }
                match self.rendezvous.arrive(record) {
                    Arrival::Matched { counterpart } => {
                        self.complete_rendezvous(
                            business_key,
                            *kind,
                            (&task.execution, owner),
                            (&counterpart.execution, &counterpart.owner),
                        )
                        .await;
                    },
                    Arrival::Registered => {
                        tracing::debug!(
                            owner,
                            business_key,
                            kind = %kind,
                            counterpart,
                            "handshake wait registered"
                        );
                    },
                }
                Ok(())
            },
        }
    }

    /// Notifies the engine that a wait-task left its wait state outside the
    /// normal completion path (cancellation, timeout, migration).
    ///
    /// Removes any handshake record the owner still holds and clears
    /// tracking associations scoped to the task's process instance.
    /// Idempotent.
    pub fn wait_task_ended(&self, owner: &str, business_key: &str, task: &WaitTask) {
        if let WaitTaskKind::Handshake { kind, .. } = &task.kind {
            self.rendezvous.remove_owned(business_key, *kind, owner);
        }
        self.hub.clear_tracking_target(&TrackingTarget::ProcessInstance(
            task.process_instance_id.clone(),
        ));
    }

    /// Sweeps the business key's pending handshakes for mutual pairs whose
    /// owners are currently in the same place.
    async fn check_rendezvous(&self, business_key: &str) {
        for kind in HandshakeKind::ALL {
            let pairs = self.rendezvous.match_colocated(business_key, kind, |id| {
                let position = self.positions.get(id)?;
                self.places
                    .resolve(position.point.lat, position.point.lon)
                    .map(|place| place.id)
            });
            for (a, b) in pairs {
                self.complete_rendezvous(
                    business_key,
                    kind,
                    (&a.execution, &a.owner),
                    (&b.execution, &b.owner),
                )
                .await;
            }
        }
    }

    /// Completes a matched handshake pair: records the completion variable
    /// on both executions, schedules both resumes, and notifies the
    /// participants and any trackers.
    ///
    /// The resumes are already committed once the pair left the registry;
    /// a variable write failure is logged and does not hold them back.
    async fn complete_rendezvous(
        &self,
        business_key: &str,
        kind: HandshakeKind,
        a: (&ExecutionHandle, &str),
        b: (&ExecutionHandle, &str),
    ) {
        tracing::info!(
            business_key,
            kind = %kind,
            participants = ?[a.1, b.1],
            "rendezvous completed"
        );
        for (execution, _) in [a, b] {
            if let Err(err) = self
                .host
                .set_variable(execution, VAR_HANDSHAKE_COMPLETE, Value::Bool(true))
                .await
            {
                tracing::warn!(
                    business_key,
                    execution = %execution,
                    error = %err,
                    "failed to record handshake completion variable"
                );
            }
        }

        self.dispatcher.resume_async(
            ResumeRequest::new(a.0.clone())
                .with_business_key(business_key)
                .with_participants(a.1, b.1),
        );
        self.dispatcher.resume_async(
            ResumeRequest::new(b.0.clone())
                .with_business_key(business_key)
                .with_participants(b.1, a.1),
        );

        let notice = ServerMessage::RendezvousCompleted {
            business_key: business_key.to_string(),
            kind,
            participants: [a.1.to_string(), b.1.to_string()],
        };
        self.hub.broadcast(a.1, &notice, None);
        self.hub.broadcast(b.1, &notice, None);
        self.hub.broadcast_tracking(
            &TrackingTarget::BusinessKey(business_key.to_string()),
            &notice,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::host::WaitTaskFilter;
    use crate::types::{Participant, PlaceDefinition};

    #[derive(Default)]
    struct RecordingEngine {
        tasks: Vec<WaitTask>,
        suspended: Mutex<Vec<String>>,
        resumed: Mutex<Vec<String>>,
        variables: Mutex<Vec<(String, String, Value)>>,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl ProcessEngine for RecordingEngine {
        async fn suspend_task(&self, activity_id: &str) -> Result<()> {
            self.suspended.lock().unwrap().push(activity_id.to_string());
            Ok(())
        }
        async fn resume_task(&self, handle: &ExecutionHandle) -> Result<()> {
            self.resumed.lock().unwrap().push(handle.to_string());
            Ok(())
        }
        async fn query_active_wait_tasks(&self, _filter: &WaitTaskFilter) -> Result<Vec<WaitTask>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.tasks.clone())
        }
        async fn get_variable(
            &self,
            _handle: &ExecutionHandle,
            _name: &str,
        ) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn set_variable(
            &self,
            handle: &ExecutionHandle,
            name: &str,
            value: Value,
        ) -> Result<()> {
            self.variables
                .lock()
                .unwrap()
                .push((handle.to_string(), name.to_string(), value));
            Ok(())
        }
        async fn resolve_participants(&self, _id: &str) -> Result<Vec<Participant>> {
            Ok(vec![])
        }
    }

    fn dock_places() -> Arc<PlaceRegistry> {
        Arc::new(
            PlaceRegistry::from_definitions(vec![PlaceDefinition {
                id: "dock".to_string(),
                name: "Dock".to_string(),
                polygon: vec![[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]],
                attributes: Default::default(),
            }])
            .unwrap(),
        )
    }

    fn engine(host: Arc<RecordingEngine>) -> Arc<CoordinationEngine> {
        CoordinationEngine::builder(host)
            .with_places(dock_places())
            .build()
    }

    fn handshake_task(execution: &str, counterpart: &str) -> WaitTask {
        WaitTask {
            execution: ExecutionHandle::new(execution),
            process_instance_id: "pi-1".to_string(),
            task_id: "bind".to_string(),
            kind: WaitTaskKind::Handshake {
                kind: HandshakeKind::Binding,
                counterpart: counterpart.to_string(),
                required_place: None,
            },
        }
    }

    async fn settle() {
        // Let dispatcher workers drain.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn heartbeat_gets_acked() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = engine.connect("driver", tx);

        let reply = engine
            .handle_message("driver", conn, ClientMessage::Heartbeat)
            .await
            .unwrap();
        assert_eq!(reply, ServerMessage::AckHeartbeat);
    }

    #[tokio::test]
    async fn tracking_control_round_trip() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = engine.connect("driver", tx);

        let target = TrackingTarget::BusinessKey("BK1".to_string());
        let reply = engine
            .handle_message(
                "driver",
                conn,
                ClientMessage::StartTracking {
                    target: target.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            reply,
            ServerMessage::AckTracking {
                target: Some(target)
            }
        );

        let reply = engine
            .handle_message("driver", conn, ClientMessage::StopTracking)
            .await
            .unwrap();
        assert_eq!(reply, ServerMessage::AckTracking { target: None });
    }

    #[tokio::test]
    async fn malformed_frame_yields_error_envelope() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = engine.connect("driver", tx);

        let reply = engine.handle_frame("driver", conn, "{\"type\":\"TELEPORT\"}").await;
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn out_of_range_coordinate_yields_error_envelope() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = engine.connect("driver", tx);

        let reply = engine
            .handle_frame(
                "driver",
                conn,
                "{\"type\":\"LOCATION_UPDATE\",\"lat\":95.0,\"lon\":0.0}",
            )
            .await;
        assert!(matches!(reply, ServerMessage::Error { .. }));
        assert!(engine.positions().is_empty());
    }

    #[tokio::test]
    async fn location_update_stores_position_with_resolved_place() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let outcome = engine
            .report_location("driver", 22.0, 12.0, None)
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NoActiveTasks);

        let position = engine.positions().get("driver").unwrap();
        assert_eq!(position.place_id.as_deref(), Some("dock"));
    }

    #[tokio::test]
    async fn location_update_broadcasts_to_business_key_trackers() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = engine.connect("dispatcher", tx);
        engine
            .hub()
            .set_tracking(
                "dispatcher",
                conn,
                TrackingTarget::BusinessKey("BK1".to_string()),
            );

        engine
            .report_location("driver", 22.0, 12.0, Some("BK1"))
            .await
            .unwrap();

        let broadcast = rx.try_recv().unwrap();
        assert_eq!(
            broadcast,
            ServerMessage::PositionBroadcast {
                participant_id: "driver".to_string(),
                lat: 22.0,
                lon: 12.0,
                place_id: Some("dock".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn movement_wait_resumes_on_entering_destination() {
        let host = Arc::new(RecordingEngine {
            tasks: vec![WaitTask {
                execution: ExecutionHandle::new("exec-1"),
                process_instance_id: "pi-1".to_string(),
                task_id: "move-to-dock".to_string(),
                kind: WaitTaskKind::Movement {
                    destination_place_id: "dock".to_string(),
                },
            }],
            ..RecordingEngine::default()
        });
        let engine = engine(host.clone());

        let outcome = engine
            .report_location("driver", 22.0, 12.0, Some("BK1"))
            .await
            .unwrap();
        assert!(matches!(outcome, MatchOutcome::EnteredArea { .. }));

        settle().await;
        assert_eq!(*host.resumed.lock().unwrap(), vec!["exec-1".to_string()]);
    }

    #[tokio::test]
    async fn handshake_completes_on_second_arrival() {
        let host = Arc::new(RecordingEngine::default());
        let engine = engine(host.clone());

        engine
            .wait_task_started("driver", "BK1", &handshake_task("exec-d", "warehouse"))
            .await
            .unwrap();
        settle().await;
        assert!(host.resumed.lock().unwrap().is_empty());

        engine
            .wait_task_started("warehouse", "BK1", &handshake_task("exec-w", "driver"))
            .await
            .unwrap();
        settle().await;

        let mut resumed = host.resumed.lock().unwrap().clone();
        resumed.sort();
        assert_eq!(resumed, vec!["exec-d".to_string(), "exec-w".to_string()]);

        let variables = host.variables.lock().unwrap().clone();
        assert_eq!(variables.len(), 2);
        assert!(variables
            .iter()
            .all(|(_, name, value)| name == VAR_HANDSHAKE_COMPLETE && value == &Value::Bool(true)));

        assert_eq!(*host.suspended.lock().unwrap(), vec!["bind", "bind"]);
    }

    #[tokio::test]
    async fn handshake_completion_notifies_both_participants() {
        let host = Arc::new(RecordingEngine::default());
        let engine = engine(host.clone());
        let (tx_d, mut rx_d) = mpsc::unbounded_channel();
        let (tx_w, mut rx_w) = mpsc::unbounded_channel();
        engine.connect("driver", tx_d);
        engine.connect("warehouse", tx_w);

        engine
            .wait_task_started("driver", "BK1", &handshake_task("exec-d", "warehouse"))
            .await
            .unwrap();
        engine
            .wait_task_started("warehouse", "BK1", &handshake_task("exec-w", "driver"))
            .await
            .unwrap();

        let expected = ServerMessage::RendezvousCompleted {
            business_key: "BK1".to_string(),
            kind: HandshakeKind::Binding,
            participants: ["warehouse".to_string(), "driver".to_string()],
        };
        assert_eq!(rx_d.try_recv().unwrap(), expected);
        assert_eq!(rx_w.try_recv().unwrap(), expected);
    }

    #[tokio::test]
    async fn colocated_update_completes_missed_handshake_pair() {
        let host = Arc::new(RecordingEngine::default());
        let engine = engine(host.clone());

        // A mutual pair the arrival path never matched.
        engine.rendezvous.insert_unmatched(WaitingRecord::new(
            "BK1",
            "driver",
            "warehouse",
            HandshakeKind::Binding,
            ExecutionHandle::new("exec-d"),
        ));
        engine.rendezvous.insert_unmatched(WaitingRecord::new(
            "BK1",
            "warehouse",
            "driver",
            HandshakeKind::Binding,
            ExecutionHandle::new("exec-w"),
        ));

        // Driver in the dock, warehouse not yet: no completion.
        engine
            .report_location("driver", 22.0, 12.0, Some("BK1"))
            .await
            .unwrap();
        settle().await;
        assert!(host.resumed.lock().unwrap().is_empty());

        // Warehouse joins the dock: the update-driven check completes the
        // pair without waiting for the reconciler.
        engine
            .report_location("warehouse", 24.0, 14.0, Some("BK1"))
            .await
            .unwrap();
        settle().await;
        let mut resumed = host.resumed.lock().unwrap().clone();
        resumed.sort();
        assert_eq!(resumed, vec!["exec-d".to_string(), "exec-w".to_string()]);
        assert!(engine.rendezvous.is_empty());
    }

    #[tokio::test]
    async fn wait_task_ended_withdraws_a_pending_handshake() {
        let host = Arc::new(RecordingEngine::default());
        let engine = engine(host.clone());

        engine
            .wait_task_started("driver", "BK1", &handshake_task("exec-d", "warehouse"))
            .await
            .unwrap();
        engine.wait_task_ended("driver", "BK1", &handshake_task("exec-d", "warehouse"));

        // The counterpart now registers instead of matching.
        engine
            .wait_task_started("warehouse", "BK1", &handshake_task("exec-w", "driver"))
            .await
            .unwrap();
        settle().await;
        assert!(host.resumed.lock().unwrap().is_empty());

        // Ending twice is harmless.
        engine.wait_task_ended("driver", "BK1", &handshake_task("exec-d", "warehouse"));
    }

    #[tokio::test]
    async fn start_spawns_and_stops_background_tasks() {
        let engine = engine(Arc::new(RecordingEngine::default()));
        let tasks = engine.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tasks.shutdown();
    }
}
