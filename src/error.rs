//! Error types for the coordination engine.
//!
//! Resolution misses (a coordinate matching no place, a participant with no
//! pending task, an unknown place id) are normal outcomes in this engine and
//! are modeled as values, never as errors. [`EngineError`] covers the
//! remaining classes: malformed input rejected at the boundary, host-engine
//! call failures, and catalog load problems.

use thiserror::Error;

/// Errors produced by the coordination engine.
///
/// Each variant carries enough context to correlate the failure with the
/// triggering business key or execution, since most of these are logged at
/// the dispatcher boundary rather than propagated to the original caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180].
    ///
    /// Rejected at the boundary before any store is touched.
    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    CoordinatesOutOfRange {
        /// The rejected latitude.
        lat: f64,
        /// The rejected longitude.
        lon: f64,
    },

    /// A place definition could not be loaded into the registry.
    #[error("invalid place `{place_id}`: {reason}")]
    InvalidPlace {
        /// Identifier of the offending catalog entry.
        place_id: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// An inbound client frame could not be interpreted.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The host engine rejected a resume call, typically because the
    /// execution already left its wait state.
    #[error("resume rejected for execution {execution}: {reason}")]
    ResumeRejected {
        /// Handle of the execution that could not be resumed.
        execution: String,
        /// Host-provided failure detail.
        reason: String,
    },

    /// Any other failure reported by the host engine collaborator.
    #[error("host engine error: {0}")]
    Host(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
