//! Participants: logical parties in a multi-process collaboration.

use serde::{Deserialize, Serialize};

/// A logical party in a collaboration, bound to one process definition.
///
/// Participants are derived data, resolved from the host engine's
/// collaboration model (one per lane/pool) and cached per process
/// definition until explicitly invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier within the collaboration.
    pub id: String,
    /// Role within the collaboration, e.g. `"driver"`.
    pub role: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Key of the process definition this participant belongs to.
    pub process_definition_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip() {
        let participant = Participant {
            id: "driver".to_string(),
            role: "driver".to_string(),
            display_name: "Driver".to_string(),
            process_definition_key: "delivery".to_string(),
        };
        let json = serde_json::to_string(&participant).unwrap();
        let back: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, participant);
    }
}
