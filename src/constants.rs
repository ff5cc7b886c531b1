//! Default tuning values and well-known keys.

/// Default period of the proximity reconciler sweep, in milliseconds.
pub const DEFAULT_RECONCILE_INTERVAL_MS: u64 = 5_000;

/// Idle window after which a connection is probed with a heartbeat,
/// in milliseconds.
pub const DEFAULT_PROBE_AFTER_MS: u64 = 30_000;

/// Additional window after a probe before an unresponsive connection is
/// closed, in milliseconds.
pub const DEFAULT_CLOSE_AFTER_MS: u64 = 15_000;

/// Default number of resume-dispatch worker tasks.
pub const DEFAULT_DISPATCH_WORKERS: usize = 4;

/// Default capacity of the resume-dispatch queue.
pub const DEFAULT_DISPATCH_QUEUE: usize = 256;

/// Process variable set on both executions when a handshake completes.
pub const VAR_HANDSHAKE_COMPLETE: &str = "handshakeComplete";

/// Place attribute naming a temperature source (a static value or a URL).
pub const ATTR_TEMPERATURE: &str = "temperature";
