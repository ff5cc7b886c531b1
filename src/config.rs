//! Engine configuration.
//!
//! All tuning knobs live in [`EngineConfig`], an explicitly owned value that
//! is injected into the engine at construction. There is no process-wide
//! configuration holder: components receive the sub-config they need and a
//! reload is a snapshot swap at the owning component (see
//! [`PlaceRegistry::reload`](crate::geofence::PlaceRegistry::reload) for the
//! place catalog).

use std::time::Duration;

use crate::constants::{
    DEFAULT_CLOSE_AFTER_MS, DEFAULT_DISPATCH_QUEUE, DEFAULT_DISPATCH_WORKERS,
    DEFAULT_PROBE_AFTER_MS, DEFAULT_RECONCILE_INTERVAL_MS,
};

/// Top-level configuration for the coordination engine.
///
/// # Defaults
///
/// | Setting              | Default | Description                          |
/// |----------------------|---------|--------------------------------------|
/// | `reconcile_interval` | 5s      | Proximity reconciler sweep period    |
/// | `heartbeat`          | 30s/15s | Probe after idle / close after probe |
/// | `dispatcher`         | 4 / 256 | Resume workers / queue capacity      |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use waitpoint::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_reconcile_interval(Duration::from_secs(2));
/// assert_eq!(config.reconcile_interval, Duration::from_secs(2));
/// assert_eq!(config.dispatcher.workers, 4);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Period of the proximity reconciler sweep.
    pub reconcile_interval: Duration,
    /// Connection liveness windows.
    pub heartbeat: HeartbeatConfig,
    /// Resume dispatcher sizing.
    pub dispatcher: DispatcherConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_millis(DEFAULT_RECONCILE_INTERVAL_MS),
            heartbeat: HeartbeatConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the reconciler sweep period.
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Sets the connection liveness windows.
    pub fn with_heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Sets the resume dispatcher sizing.
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

/// Two-stage staleness windows for live connections.
///
/// A connection idle for longer than `probe_after` is sent a heartbeat
/// probe; if it stays silent for another `close_after`, it is closed. This
/// is a transport liveness timeout, independent of any workflow timeout.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Idle window before a probe is sent.
    pub probe_after: Duration,
    /// Window after the probe before the connection is dropped.
    pub close_after: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            probe_after: Duration::from_millis(DEFAULT_PROBE_AFTER_MS),
            close_after: Duration::from_millis(DEFAULT_CLOSE_AFTER_MS),
        }
    }
}

impl HeartbeatConfig {
    /// Sets the idle window before a probe is sent.
    pub fn with_probe_after(mut self, probe_after: Duration) -> Self {
        self.probe_after = probe_after;
        self
    }

    /// Sets the post-probe window before the connection is dropped.
    pub fn with_close_after(mut self, close_after: Duration) -> Self {
        self.close_after = close_after;
        self
    }
}

/// Sizing of the bounded resume-dispatch worker pool.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker tasks draining the queue.
    pub workers: usize,
    /// Capacity of the submission queue.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_DISPATCH_WORKERS,
            queue_capacity: DEFAULT_DISPATCH_QUEUE,
        }
    }
}

impl DispatcherConfig {
    /// Sets the number of worker tasks.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the submission queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}
