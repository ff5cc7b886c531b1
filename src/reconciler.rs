//! Proximity reconciler.
//!
//! A periodic safety net for the event-driven handshake path: every tick it
//! sweeps the rendezvous registry for mutually-waiting pairs whose owners
//! currently resolve to the same place, and resumes both. Matched records
//! are removed under the registry's per-slot lock, so a sweep can never
//! double-resume a pair the arrival path is mid-matching.
//!
//! Unlike the arrival handshake, the reconciler requires physical
//! co-location. This divergence is intentional; see DESIGN.md.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::dispatch::{ResumeDispatcher, ResumeRequest};
use crate::geofence::PlaceRegistry;
use crate::position::PositionStore;
use crate::rendezvous::RendezvousRegistry;

/// Shared state the reconciler reads and mutates each tick.
#[derive(Clone)]
pub(crate) struct ReconcilerDeps {
    pub rendezvous: Arc<RendezvousRegistry>,
    pub positions: Arc<PositionStore>,
    pub places: Arc<PlaceRegistry>,
    pub dispatcher: Arc<ResumeDispatcher>,
}

/// Runs one sweep over every pending slot. Returns the number of pairs
/// resolved.
pub(crate) fn reconcile_once(deps: &ReconcilerDeps) -> usize {
    let mut resolved = 0;
    for (business_key, kind) in deps.rendezvous.pending_slots() {
        let pairs = deps
            .rendezvous
            .match_colocated(&business_key, kind, |participant| {
                let position = deps.positions.get(participant)?;
                deps.places
                    .resolve(position.point.lat, position.point.lon)
                    .map(|place| place.id)
            });
        for (a, b) in pairs {
            tracing::info!(
                business_key = %business_key,
                kind = %kind,
                owner = %a.owner,
                counterpart = %b.owner,
                "reconciler resolved mutual wait"
            );
            deps.dispatcher.resume_async(
                ResumeRequest::new(a.execution.clone())
                    .with_business_key(&business_key)
                    .with_participants(&a.owner, &b.owner),
            );
            deps.dispatcher.resume_async(
                ResumeRequest::new(b.execution.clone())
                    .with_business_key(&business_key)
                    .with_participants(&b.owner, &a.owner),
            );
            resolved += 1;
        }
    }
    resolved
}

/// Handle to the running reconciler task. Aborts the task on drop.
#[derive(Debug)]
pub struct ReconcilerHandle {
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Stops the reconciler.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the periodic sweep with the given period.
pub(crate) fn spawn(deps: ReconcilerDeps, period: Duration) -> ReconcilerHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh engine does
        // not sweep before anything registers.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let resolved = reconcile_once(&deps);
            if resolved > 0 {
                tracing::debug!(resolved, "reconciler tick resolved pairs");
            }
        }
    });
    ReconcilerHandle { task }
}
