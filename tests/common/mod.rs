//! Shared in-memory host engine mock for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use waitpoint::{
    EngineError, ExecutionHandle, Participant, ProcessEngine, Result, WaitTask, WaitTaskFilter,
};

/// Host mock that serves a mutable wait-task list and records every call.
///
/// A successful resume removes the task from the active list, so subsequent
/// queries reflect the completion like a real engine would. A second resume
/// for the same execution is rejected.
#[derive(Default)]
pub struct MockHost {
    tasks: Mutex<Vec<WaitTask>>,
    resumed: Mutex<Vec<String>>,
    suspended: Mutex<Vec<String>>,
    variables: Mutex<Vec<(String, String, Value)>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<WaitTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn push_task(&self, task: WaitTask) {
        self.tasks.lock().unwrap().push(task);
    }

    pub fn resumed(&self) -> Vec<String> {
        self.resumed.lock().unwrap().clone()
    }

    pub fn resume_count(&self, execution: &str) -> usize {
        self.resumed
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == execution)
            .count()
    }

    pub fn suspended(&self) -> Vec<String> {
        self.suspended.lock().unwrap().clone()
    }

    pub fn variables(&self) -> Vec<(String, String, Value)> {
        self.variables.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessEngine for MockHost {
    async fn suspend_task(&self, activity_id: &str) -> Result<()> {
        self.suspended.lock().unwrap().push(activity_id.to_string());
        Ok(())
    }

    async fn resume_task(&self, handle: &ExecutionHandle) -> Result<()> {
        let mut resumed = self.resumed.lock().unwrap();
        if resumed.iter().any(|e| e == handle.as_str()) {
            return Err(EngineError::ResumeRejected {
                execution: handle.to_string(),
                reason: "execution already resumed".to_string(),
            });
        }
        resumed.push(handle.to_string());
        self.tasks
            .lock()
            .unwrap()
            .retain(|task| task.execution != *handle);
        Ok(())
    }

    async fn query_active_wait_tasks(&self, filter: &WaitTaskFilter) -> Result<Vec<WaitTask>> {
        let _ = &filter.user_id;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn get_variable(&self, handle: &ExecutionHandle, name: &str) -> Result<Option<Value>> {
        Ok(self
            .variables
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(execution, variable, _)| execution == handle.as_str() && variable == name)
            .map(|(_, _, value)| value.clone()))
    }

    async fn set_variable(&self, handle: &ExecutionHandle, name: &str, value: Value) -> Result<()> {
        self.variables
            .lock()
            .unwrap()
            .push((handle.to_string(), name.to_string(), value));
        Ok(())
    }

    async fn resolve_participants(&self, _process_definition_id: &str) -> Result<Vec<Participant>> {
        Ok(vec![])
    }
}
