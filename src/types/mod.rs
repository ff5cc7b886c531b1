//! Core data model: places, participants, positions, and wire messages.

pub mod message;
pub mod participant;
pub mod place;
pub mod position;

pub use message::{ClientMessage, MatchOutcome, ServerMessage, TrackingTarget};
pub use participant::Participant;
pub use place::{BoundingBox, GeoPoint, Place, PlaceDefinition, TemperatureSource};
pub use position::Position;

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two-party handshake operation kinds.
///
/// Binding pairs two participants at the start of a shared leg of work;
/// unbinding releases them at its end. Records for the two kinds live in
/// separate slots of the rendezvous registry and never match each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandshakeKind {
    /// Two participants pairing up.
    Binding,
    /// Two participants releasing each other.
    Unbinding,
}

impl HandshakeKind {
    /// All kinds, in a stable order. Used by the reconciler to sweep each
    /// kind independently.
    pub const ALL: [HandshakeKind; 2] = [HandshakeKind::Binding, HandshakeKind::Unbinding];
}

impl fmt::Display for HandshakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding => write!(f, "binding"),
            Self::Unbinding => write!(f, "unbinding"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_kind_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&HandshakeKind::Binding).unwrap(),
            "\"BINDING\""
        );
        assert_eq!(
            serde_json::to_string(&HandshakeKind::Unbinding).unwrap(),
            "\"UNBINDING\""
        );
    }

    #[test]
    fn handshake_kind_display() {
        assert_eq!(HandshakeKind::Binding.to_string(), "binding");
        assert_eq!(HandshakeKind::Unbinding.to_string(), "unbinding");
    }
}
