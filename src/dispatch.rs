//! Async resume dispatcher.
//!
//! Decouples "decide to resume" from "tell the host engine to resume": a
//! request/connection handler submits the resume and returns its response
//! before the host finishes processing. Submissions go onto a bounded queue
//! drained by a fixed worker pool.
//!
//! Contract: at-least-once submission attempt per call; no ordering between
//! two concurrent submissions; a failed resume (execution already left the
//! wait state, host error) is logged with its correlation context and never
//! propagated to the original caller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::DispatcherConfig;
use crate::host::{ExecutionHandle, ProcessEngine};

/// One resume submission, with correlation context for failure logs.
#[derive(Debug, Clone)]
pub struct ResumeRequest {
    /// The execution to resume.
    pub execution: ExecutionHandle,
    /// Business key of the triggering match, if known.
    pub business_key: Option<String>,
    /// Both participants of a handshake match, if this resume is one half
    /// of a pair. Logged on partial-match failure to support manual
    /// reconciliation.
    pub participants: Option<(String, String)>,
}

impl ResumeRequest {
    /// A bare resume with no correlation context.
    pub fn new(execution: ExecutionHandle) -> Self {
        Self {
            execution,
            business_key: None,
            participants: None,
        }
    }

    /// Attaches the triggering business key.
    pub fn with_business_key(mut self, business_key: impl Into<String>) -> Self {
        self.business_key = Some(business_key.into());
        self
    }

    /// Attaches the handshake pair this resume belongs to.
    pub fn with_participants(
        mut self,
        owner: impl Into<String>,
        counterpart: impl Into<String>,
    ) -> Self {
        self.participants = Some((owner.into(), counterpart.into()));
        self
    }
}

/// Bounded worker pool submitting host resume calls off the caller's thread.
pub struct ResumeDispatcher {
    tx: mpsc::Sender<ResumeRequest>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ResumeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeDispatcher")
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl ResumeDispatcher {
    /// Spawns the worker pool against the given host engine.
    pub fn spawn(host: Arc<dyn ProcessEngine>, config: &DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel::<ResumeRequest>(config.queue_capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..config.workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                let host = Arc::clone(&host);
                tokio::spawn(async move {
                    loop {
                        let request = {
                            let mut rx = rx.lock().await;
                            rx.recv().await
                        };
                        let Some(request) = request else { break };
                        Self::run_resume(host.as_ref(), request).await;
                    }
                })
            })
            .collect();

        Self { tx, workers }
    }

    async fn run_resume(host: &dyn ProcessEngine, request: ResumeRequest) {
        match host.resume_task(&request.execution).await {
            Ok(()) => {
                tracing::debug!(
                    execution = %request.execution,
                    business_key = request.business_key.as_deref(),
                    "resumed execution"
                );
            },
            Err(err) => {
                // The caller was already told the match was found; a resume
                // failure here is logged with enough correlation for manual
                // reconciliation and swallowed (no rollback of a paired
                // resume that succeeded).
                tracing::warn!(
                    execution = %request.execution,
                    business_key = request.business_key.as_deref(),
                    participants = ?request.participants,
                    error = %err,
                    "resume failed"
                );
            },
        }
    }

    /// Submits a resume without blocking the caller.
    ///
    /// If the queue is momentarily full, the submission is re-attempted
    /// from a spawned task, preserving the at-least-once contract. A
    /// submission after shutdown is dropped with a warning.
    pub fn resume_async(&self, request: ResumeRequest) {
        match self.tx.try_send(request) {
            Ok(()) => {},
            Err(mpsc::error::TrySendError::Full(request)) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if tx.send(request).await.is_err() {
                        tracing::warn!("resume dispatcher closed while queue was full");
                    }
                });
            },
            Err(mpsc::error::TrySendError::Closed(request)) => {
                tracing::warn!(
                    execution = %request.execution,
                    "resume submitted after dispatcher shutdown"
                );
            },
        }
    }

    /// Closes the queue and waits for the workers to drain it.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = futures::future::join_all(self.workers).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::error::{EngineError, Result};
    use crate::host::{WaitTask, WaitTaskFilter};
    use crate::types::Participant;

    #[derive(Default)]
    struct CountingEngine {
        resumed: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ProcessEngine for CountingEngine {
        async fn suspend_task(&self, _activity_id: &str) -> Result<()> {
            Ok(())
        }

        async fn resume_task(&self, handle: &ExecutionHandle) -> Result<()> {
            self.resumed.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EngineError::ResumeRejected {
                    execution: handle.to_string(),
                    reason: "already resumed".to_string(),
                });
            }
            Ok(())
        }

        async fn query_active_wait_tasks(&self, _filter: &WaitTaskFilter) -> Result<Vec<WaitTask>> {
            Ok(vec![])
        }

        async fn get_variable(
            &self,
            _handle: &ExecutionHandle,
            _name: &str,
        ) -> Result<Option<Value>> {
            Ok(None)
        }

        async fn set_variable(
            &self,
            _handle: &ExecutionHandle,
            _name: &str,
            _value: Value,
        ) -> Result<()> {
            Ok(())
        }

        async fn resolve_participants(&self, _id: &str) -> Result<Vec<Participant>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn dispatches_submitted_resumes() {
        let host = Arc::new(CountingEngine::default());
        let dispatcher =
            ResumeDispatcher::spawn(host.clone(), &DispatcherConfig::default().with_workers(2));

        for i in 0..10 {
            dispatcher.resume_async(ResumeRequest::new(ExecutionHandle::new(format!("e-{i}"))));
        }
        dispatcher.shutdown().await;
        assert_eq!(host.resumed.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn failed_resume_is_swallowed() {
        let host = Arc::new(CountingEngine {
            fail: true,
            ..CountingEngine::default()
        });
        let dispatcher = ResumeDispatcher::spawn(host.clone(), &DispatcherConfig::default());

        dispatcher.resume_async(
            ResumeRequest::new(ExecutionHandle::new("e-1"))
                .with_business_key("BK1")
                .with_participants("driver", "warehouse"),
        );
        dispatcher.shutdown().await;
        // The attempt was made; the failure never reached us.
        assert_eq!(host.resumed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_queue_still_delivers_at_least_once() {
        let host = Arc::new(CountingEngine::default());
        let dispatcher = ResumeDispatcher::spawn(
            host.clone(),
            &DispatcherConfig::default()
                .with_workers(1)
                .with_queue_capacity(1),
        );

        for i in 0..20 {
            dispatcher.resume_async(ResumeRequest::new(ExecutionHandle::new(format!("e-{i}"))));
        }
        // Give spilled submissions time to land on the queue before closing.
        tokio::time::sleep(Duration::from_millis(50)).await;
        dispatcher.shutdown().await;
        assert_eq!(host.resumed.load(Ordering::SeqCst), 20);
    }
}
