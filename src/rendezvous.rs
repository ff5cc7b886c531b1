//! Rendezvous registry: pending two-party handshakes.
//!
//! Two participants P and Q share a business key K. When P reaches a
//! binding/unbinding wait-point, [`RendezvousRegistry::arrive`] checks for a
//! record registered by Q waiting for P; if one exists this is a match and
//! both executions are resumed, otherwise P registers that it is waiting
//! for Q. Check-then-insert runs as one atomic critical section per
//! (business key, kind) — the slot is guarded by a single `DashMap` entry
//! lock, so two concurrent arrivals can never both observe "no record" and
//! both insert.
//!
//! The event-driven handshake is a pure identity match and ignores physical
//! location. [`RendezvousRegistry::match_colocated`], used by the proximity
//! reconciler and the per-update event check, additionally requires both
//! owners to resolve to the same place. The two paths intentionally use
//! different criteria; see DESIGN.md.
//!
//! The critical sections contain map lookups and inserts/removes only —
//! resume calls happen after the guard drops, through the dispatcher.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::host::ExecutionHandle;
use crate::types::HandshakeKind;

/// One pending wait registered by a participant.
///
/// Invariant: at most one record per (business key, target, kind). A second
/// complementary registration is treated as a match, never as a duplicate
/// insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingRecord {
    /// Correlation key shared by the collaborating processes.
    pub business_key: String,
    /// The participant that registered and is waiting.
    pub owner: String,
    /// The counterpart participant being waited for.
    pub target: String,
    /// Binding or unbinding.
    pub kind: HandshakeKind,
    /// Handle of the owner's suspended wait-task execution.
    pub execution: ExecutionHandle,
    /// When the record was registered.
    pub created_at: DateTime<Utc>,
    /// Optional place both parties must share for a reconciler match.
    pub required_place: Option<String>,
}

impl WaitingRecord {
    /// Builds a record stamped with the current time.
    pub fn new(
        business_key: impl Into<String>,
        owner: impl Into<String>,
        target: impl Into<String>,
        kind: HandshakeKind,
        execution: ExecutionHandle,
    ) -> Self {
        Self {
            business_key: business_key.into(),
            owner: owner.into(),
            target: target.into(),
            kind,
            execution,
            created_at: Utc::now(),
            required_place: None,
        }
    }

    /// Sets the place both parties must share for a reconciler match.
    pub fn with_required_place(mut self, place_id: impl Into<String>) -> Self {
        self.required_place = Some(place_id.into());
        self
    }
}

/// Outcome of an arrival at a handshake wait-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrival {
    /// The counterpart was already waiting; its record has been removed
    /// and both executions must now be resumed.
    Matched {
        /// The counterpart's record, removed from the registry.
        counterpart: WaitingRecord,
    },
    /// No counterpart yet; the arriving record is now registered.
    Registered,
}

/// A slot key: all records for one business key and handshake kind.
type SlotKey = (String, HandshakeKind);

/// Records within a slot, keyed by the participant they wait for.
type Slot = HashMap<String, WaitingRecord>;

/// Concurrent registry of pending two-party handshakes.
///
/// # Examples
///
/// ```
/// use waitpoint::host::ExecutionHandle;
/// use waitpoint::rendezvous::{Arrival, RendezvousRegistry, WaitingRecord};
/// use waitpoint::types::HandshakeKind;
///
/// let registry = RendezvousRegistry::new();
///
/// // Driver arrives first, waiting for Warehouse.
/// let arrival = registry.arrive(WaitingRecord::new(
///     "BK1", "driver", "warehouse", HandshakeKind::Binding, ExecutionHandle::new("exec-d"),
/// ));
/// assert_eq!(arrival, Arrival::Registered);
///
/// // Warehouse arrives, waiting for Driver: immediate match.
/// let arrival = registry.arrive(WaitingRecord::new(
///     "BK1", "warehouse", "driver", HandshakeKind::Binding, ExecutionHandle::new("exec-w"),
/// ));
/// assert!(matches!(arrival, Arrival::Matched { counterpart } if counterpart.owner == "driver"));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RendezvousRegistry {
    slots: DashMap<SlotKey, Slot>,
}

impl RendezvousRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an arrival at a handshake wait-point.
    ///
    /// If a record targeting the arriving participant exists and its owner
    /// is the arriving participant's declared counterpart, that record is
    /// removed and returned as [`Arrival::Matched`]; the caller resumes
    /// both executions. Otherwise the arriving record is inserted.
    ///
    /// This is a pure identity handshake: no co-location is required.
    pub fn arrive(&self, record: WaitingRecord) -> Arrival {
        let key = (record.business_key.clone(), record.kind);
        let mut slot = self.slots.entry(key).or_default();

        let matched = match slot.get(&record.owner) {
            Some(existing) if existing.owner == record.target => slot.remove(&record.owner),
            _ => None,
        };

        match matched {
            Some(counterpart) => {
                tracing::debug!(
                    business_key = %record.business_key,
                    kind = %record.kind,
                    owner = %record.owner,
                    counterpart = %counterpart.owner,
                    "handshake matched on arrival"
                );
                Arrival::Matched { counterpart }
            },
            None => {
                tracing::debug!(
                    business_key = %record.business_key,
                    kind = %record.kind,
                    owner = %record.owner,
                    target = %record.target,
                    "handshake registered, waiting for counterpart"
                );
                slot.insert(record.target.clone(), record);
                Arrival::Registered
            },
        }
    }

    /// Removes any record owned by `owner` for (business key, kind).
    ///
    /// Called on wait-task end regardless of match state, so records never
    /// outlive their task. Removing an absent record is a no-op.
    pub fn remove_owned(
        &self,
        business_key: &str,
        kind: HandshakeKind,
        owner: &str,
    ) -> Option<WaitingRecord> {
        let key = (business_key.to_string(), kind);
        let mut removed = None;
        if let Some(mut slot) = self.slots.get_mut(&key) {
            if let Some(target) = slot
                .iter()
                .find(|(_, record)| record.owner == owner)
                .map(|(target, _)| target.clone())
            {
                removed = slot.remove(&target);
            }
        }
        self.slots.remove_if(&key, |_, slot| slot.is_empty());
        removed
    }

    /// Resolves mutually-waiting pairs within one (business key, kind) slot
    /// that are currently co-located, removing and returning them.
    ///
    /// `resolve_place` maps a participant id to its current place id. A
    /// pair matches when both owners resolve to the same place; if either
    /// record names a required place, the shared place must equal it.
    ///
    /// Runs under the same per-slot entry lock as [`arrive`](Self::arrive),
    /// so the sweep can never race an in-flight handshake into a double
    /// resume.
    pub fn match_colocated<F>(
        &self,
        business_key: &str,
        kind: HandshakeKind,
        resolve_place: F,
    ) -> Vec<(WaitingRecord, WaitingRecord)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = (business_key.to_string(), kind);
        let mut matched = Vec::new();

        if let Some(mut slot) = self.slots.get_mut(&key) {
            loop {
                let pair = slot.values().find_map(|record| {
                    let other = slot.get(&record.owner)?;
                    // Mutual wait: each targets the other. Comparing the
                    // (owner, target) tuple ordering dedupes the pair.
                    if other.owner != record.target || record.owner >= other.owner {
                        return None;
                    }
                    let place_a = resolve_place(&record.owner)?;
                    let place_b = resolve_place(&other.owner)?;
                    if place_a != place_b {
                        return None;
                    }
                    for required in [&record.required_place, &other.required_place] {
                        if let Some(required) = required {
                            if *required != place_a {
                                return None;
                            }
                        }
                    }
                    Some((record.target.clone(), other.target.clone()))
                });

                let Some((target_a, target_b)) = pair else {
                    break;
                };
                let a = slot.remove(&target_a);
                let b = slot.remove(&target_b);
                if let (Some(a), Some(b)) = (a, b) {
                    matched.push((a, b));
                }
            }
        }
        self.slots.remove_if(&key, |_, slot| slot.is_empty());

        if !matched.is_empty() {
            tracing::debug!(
                business_key,
                kind = %kind,
                pairs = matched.len(),
                "co-location sweep resolved mutual waits"
            );
        }
        matched
    }

    /// Inserts a record without the arrival match check, producing the
    /// mutual-wait state the reconciler exists to resolve. The atomic
    /// [`arrive`](Self::arrive) never produces this state itself.
    #[cfg(test)]
    pub(crate) fn insert_unmatched(&self, record: WaitingRecord) {
        let key = (record.business_key.clone(), record.kind);
        self.slots
            .entry(key)
            .or_default()
            .insert(record.target.clone(), record);
    }

    /// All (business key, kind) slots currently holding records.
    pub fn pending_slots(&self) -> Vec<(String, HandshakeKind)> {
        self.slots.iter().map(|e| e.key().clone()).collect()
    }

    /// Total number of pending records across all slots.
    pub fn len(&self) -> usize {
        self.slots.iter().map(|e| e.value().len()).sum()
    }

    /// `true` if no handshake is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
