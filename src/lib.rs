//! Participant rendezvous and geofencing coordination for workflow
//! wait-states.
//!
//! `waitpoint` lets long-running workflow processes block on physical-world
//! conditions: a participant entering a geofenced place, or two
//! collaborating participants mutually arriving at a handshake point. The
//! crate owns no process state; it embeds into a host workflow engine
//! through the [`host::ProcessEngine`] trait and decides *when* a suspended
//! execution should wake.
//!
//! # Architecture
//!
//! - [`geofence::PlaceRegistry`] resolves coordinates against a reloadable
//!   catalog of named bounding-box areas.
//! - [`position::PositionStore`] keeps each participant's last-known
//!   position.
//! - [`movement::MovementMatcher`] checks location updates against pending
//!   movement wait-tasks enumerated from the host.
//! - [`rendezvous::RendezvousRegistry`] holds pending two-party handshakes
//!   with an atomic check-then-insert arrival path.
//! - [`reconciler`] periodically completes mutual waits whose owners are
//!   co-located, as a safety net behind the event-driven path.
//! - [`hub::SessionHub`] fans outbound messages to a user's live
//!   connections and enforces heartbeat liveness.
//! - [`dispatch::ResumeDispatcher`] submits host resume calls from a
//!   bounded worker pool so handlers never block on the host.
//! - [`engine::CoordinationEngine`] wires it all together.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use waitpoint::config::EngineConfig;
//! use waitpoint::engine::CoordinationEngine;
//! use waitpoint::geofence::PlaceRegistry;
//! use waitpoint::host::ProcessEngine;
//! use waitpoint::types::PlaceDefinition;
//!
//! # async fn run(host: Arc<dyn ProcessEngine>) -> waitpoint::error::Result<()> {
//! let places = Arc::new(PlaceRegistry::from_definitions(vec![PlaceDefinition {
//!     id: "dock".to_string(),
//!     name: "Loading Dock".to_string(),
//!     polygon: vec![[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]],
//!     attributes: Default::default(),
//! }])?);
//!
//! let engine = CoordinationEngine::builder(host)
//!     .with_places(places)
//!     .with_config(EngineConfig::default())
//!     .build();
//! let background = engine.start();
//!
//! let outcome = engine.report_location("driver", 22.0, 12.0, Some("BK1")).await?;
//! println!("{outcome:?}");
//! background.shutdown();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod geofence;
pub mod host;
pub mod hub;
pub mod movement;
pub mod participants;
pub mod position;
pub mod reconciler;
pub mod rendezvous;
pub mod types;

pub use config::{DispatcherConfig, EngineConfig, HeartbeatConfig};
pub use engine::{CoordinationEngine, EngineBuilder, EngineTasks};
pub use error::{EngineError, Result};
pub use host::{ExecutionHandle, ProcessEngine, WaitTask, WaitTaskFilter, WaitTaskKind};
pub use hub::{ConnectionId, SessionHub};
pub use types::{
    ClientMessage, GeoPoint, HandshakeKind, MatchOutcome, Participant, Place, PlaceDefinition,
    Position, ServerMessage, TrackingTarget,
};
