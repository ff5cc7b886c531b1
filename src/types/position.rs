//! Last-known participant positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::place::GeoPoint;

/// The last-known position of one participant.
///
/// Owned exclusively by the position store: overwritten on every update,
/// never merged, last-write-wins with no causal ordering beyond arrival
/// order at the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// The participant this position belongs to.
    pub participant_id: String,
    /// The reported coordinate.
    pub point: GeoPoint,
    /// The containing place resolved at update time, if any.
    pub place_id: Option<String>,
    /// When the update arrived at the store.
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Builds a position stamped with the current time.
    pub fn now(participant_id: impl Into<String>, point: GeoPoint, place_id: Option<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            point,
            place_id,
            updated_at: Utc::now(),
        }
    }
}
