//! Concurrent last-known-position store.
//!
//! One entry per participant, overwritten on every update. Updates are
//! wait-free from the caller's perspective (a `DashMap` insert), reads are
//! lock-free clones. There is no eviction: entries live for the process
//! lifetime, which is acceptable at this engine's target scale and a
//! documented limitation rather than something to silently cap.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::types::{GeoPoint, Position};

/// Last-write-wins position map, keyed by participant id.
///
/// # Examples
///
/// ```
/// use waitpoint::position::PositionStore;
/// use waitpoint::types::GeoPoint;
///
/// let store = PositionStore::new();
/// store.update("driver", GeoPoint::new(22.0, 12.0).unwrap(), Some("dock".to_string()));
/// let position = store.get("driver").unwrap();
/// assert_eq!(position.place_id.as_deref(), Some("dock"));
/// assert!(store.get("warehouse").is_none());
/// ```
#[derive(Debug, Default)]
pub struct PositionStore {
    entries: DashMap<String, Position>,
}

impl PositionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the participant's position. Idempotent for identical
    /// input apart from the timestamp.
    pub fn update(&self, participant_id: &str, point: GeoPoint, place_id: Option<String>) {
        self.entries.insert(
            participant_id.to_string(),
            Position::now(participant_id, point, place_id),
        );
    }

    /// Returns the participant's last-known position, if any.
    pub fn get(&self, participant_id: &str) -> Option<Position> {
        self.entries.get(participant_id).map(|e| e.value().clone())
    }

    /// A display-purpose copy of all positions.
    ///
    /// Consistent per entry; linearizability across entries is not
    /// guaranteed and not required.
    pub fn snapshot(&self) -> HashMap<String, Position> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Number of tracked participants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no participant has reported yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
