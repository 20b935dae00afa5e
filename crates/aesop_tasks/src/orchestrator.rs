//! The background task registry.

use crate::OrchestratorConfig;
use aesop_core::{Diagnostics, ModificationResult};
use aesop_error::{AesopResult, TaskError, TaskErrorKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

/// Identifier of a registered task.
pub type TaskId = String;

/// Lifecycle states of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Registered but not yet picked up by its worker
    Pending,
    /// Worker is executing
    Running,
    /// Worker finished with a successful result
    Completed,
    /// Worker finished with a failure, or crashed
    Failed,
    /// Cancelled before a result was recorded
    Cancelled,
}

impl TaskStatus {
    /// Whether this status will never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One registry entry. Only the owning watcher task writes `result`.
struct TaskRecord {
    status: TaskStatus,
    submitted_at: DateTime<Utc>,
    result: Option<ModificationResult>,
    failure: Option<String>,
    abort: Option<AbortHandle>,
}

impl TaskRecord {
    fn new(abort: AbortHandle) -> Self {
        Self {
            status: TaskStatus::Pending,
            submitted_at: Utc::now(),
            result: None,
            failure: None,
            abort: Some(abort),
        }
    }
}

/// Registry of background pipeline runs.
///
/// Each submitted future runs on its own tokio task; a watcher task records
/// the outcome in the shared registry, so worker panics become `Failed`
/// records instead of propagating to pollers. Clones share the registry.
///
/// Retention is bounded: once the registry holds `retention_cap` records,
/// each submission evicts the oldest terminal record first. Pending and
/// running records are never evicted, so the registry can exceed the cap
/// while that many tasks are actually in flight.
#[derive(Clone)]
pub struct TaskOrchestrator {
    registry: Arc<Mutex<HashMap<TaskId, TaskRecord>>>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for TaskOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.registry.lock().unwrap().len();
        f.debug_struct("TaskOrchestrator")
            .field("tasks", &count)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for TaskOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskOrchestrator {
    /// An orchestrator with default configuration.
    pub fn new() -> Self {
        Self::from_config(&OrchestratorConfig::default())
    }

    /// An orchestrator with the given configuration.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            config: config.clone(),
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Submit work under a generated id.
    pub fn submit<F>(&self, work: F) -> TaskId
    where
        F: Future<Output = ModificationResult> + Send + 'static,
    {
        let task_id = uuid::Uuid::new_v4().simple().to_string();
        self.submit_with_id(task_id, work)
    }

    /// Submit work under a caller-chosen id, replacing any previous record
    /// with that id.
    pub fn submit_with_id<F>(&self, task_id: impl Into<TaskId>, work: F) -> TaskId
    where
        F: Future<Output = ModificationResult> + Send + 'static,
    {
        let task_id = task_id.into();

        let worker = tokio::spawn(work);
        {
            let mut registry = self.registry.lock().unwrap();
            evict_oldest_terminal(&mut registry, self.config.retention_cap);
            registry.insert(task_id.clone(), TaskRecord::new(worker.abort_handle()));
        }
        tracing::debug!(task_id = %task_id, "Task submitted");

        let registry = Arc::clone(&self.registry);
        let id = task_id.clone();
        tokio::spawn(async move {
            {
                let mut registry = registry.lock().unwrap();
                if let Some(record) = registry.get_mut(&id) {
                    if record.status == TaskStatus::Pending {
                        record.status = TaskStatus::Running;
                    }
                }
            }

            let outcome = worker.await;

            let mut registry = registry.lock().unwrap();
            let Some(record) = registry.get_mut(&id) else {
                return;
            };
            // a record cancelled mid-flight keeps its status; the late
            // result is discarded
            if record.status == TaskStatus::Cancelled {
                tracing::debug!(task_id = %id, "Discarding result of cancelled task");
                return;
            }
            match outcome {
                Ok(result) => {
                    record.status = if result.is_success() {
                        TaskStatus::Completed
                    } else {
                        TaskStatus::Failed
                    };
                    tracing::debug!(task_id = %id, status = %record.status, "Task finished");
                    record.result = Some(result);
                }
                Err(e) => {
                    tracing::error!(task_id = %id, error = %e, "Task worker crashed");
                    record.status = TaskStatus::Failed;
                    record.failure = Some(e.to_string());
                }
            }
            record.abort = None;
        });

        task_id
    }

    /// Current status of a task.
    ///
    /// # Errors
    ///
    /// Returns error if the id is unknown.
    pub fn status(&self, task_id: &str) -> AesopResult<TaskStatus> {
        let registry = self.registry.lock().unwrap();
        registry
            .get(task_id)
            .map(|record| record.status)
            .ok_or_else(|| TaskError::new(TaskErrorKind::NotFound(task_id.to_string())).into())
    }

    /// The result of a terminal task, cloned out of the registry.
    ///
    /// # Errors
    ///
    /// Returns error if the id is unknown, the task is not terminal yet,
    /// the task was cancelled, or its worker crashed without a result.
    pub fn result(&self, task_id: &str) -> AesopResult<ModificationResult> {
        let registry = self.registry.lock().unwrap();
        let record = registry
            .get(task_id)
            .ok_or_else(|| TaskError::new(TaskErrorKind::NotFound(task_id.to_string())))?;

        match record.status {
            TaskStatus::Pending | TaskStatus::Running => {
                Err(TaskError::new(TaskErrorKind::NotReady {
                    id: task_id.to_string(),
                    status: record.status.to_string(),
                })
                .into())
            }
            TaskStatus::Cancelled => {
                Err(TaskError::new(TaskErrorKind::Cancelled(task_id.to_string())).into())
            }
            TaskStatus::Completed | TaskStatus::Failed => {
                record.result.clone().ok_or_else(|| {
                    TaskError::new(TaskErrorKind::WorkerFailed {
                        id: task_id.to_string(),
                        message: record
                            .failure
                            .clone()
                            .unwrap_or_else(|| "worker finished without a result".to_string()),
                    })
                    .into()
                })
            }
        }
    }

    /// Cancel a task: mark the record and abort the worker best-effort.
    ///
    /// Cancelling an already-terminal task is a no-op. A generation call
    /// already dispatched may still complete; its result is discarded.
    ///
    /// # Errors
    ///
    /// Returns error if the id is unknown.
    pub fn cancel(&self, task_id: &str) -> AesopResult<()> {
        let mut registry = self.registry.lock().unwrap();
        let record = registry
            .get_mut(task_id)
            .ok_or_else(|| TaskError::new(TaskErrorKind::NotFound(task_id.to_string())))?;

        if record.status.is_terminal() {
            return Ok(());
        }
        record.status = TaskStatus::Cancelled;
        if let Some(abort) = record.abort.take() {
            abort.abort();
        }
        tracing::info!(task_id = %task_id, "Task cancelled");
        Ok(())
    }

    /// Run every item with at most `max_concurrent` in flight at once.
    ///
    /// Results are positional: `results[i]` belongs to `work_items[i]`
    /// regardless of completion order. One item's failure never cancels its
    /// siblings; a crashed item reports a failed result in its slot. Zero
    /// `max_concurrent` falls back to the configured default.
    #[tracing::instrument(skip(self, work_items), fields(items = work_items.len(), max_concurrent))]
    pub async fn submit_batch<F>(
        &self,
        work_items: Vec<F>,
        max_concurrent: usize,
    ) -> Vec<ModificationResult>
    where
        F: Future<Output = ModificationResult> + Send + 'static,
    {
        let bound = if max_concurrent == 0 {
            self.config.max_concurrent_default
        } else {
            max_concurrent
        };
        let gate = Arc::new(Semaphore::new(bound));

        let mut handles = Vec::with_capacity(work_items.len());
        for work in work_items {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                // admission gate, not a thread cap
                let _permit = gate.acquire_owned().await.expect("batch gate closed");
                work.await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(index, error = %e, "Batch worker crashed");
                    let error = TaskError::new(TaskErrorKind::WorkerFailed {
                        id: format!("batch[{index}]"),
                        message: e.to_string(),
                    });
                    results.push(ModificationResult::Failure {
                        error: error.into(),
                        detail: e.to_string(),
                        document: None,
                        diagnostics: Diagnostics::default(),
                    });
                }
            }
        }
        results
    }
}

/// Drop the oldest terminal records until the registry is under the cap.
fn evict_oldest_terminal(registry: &mut HashMap<TaskId, TaskRecord>, cap: usize) {
    while registry.len() >= cap.max(1) {
        let oldest = registry
            .iter()
            .filter(|(_, record)| record.status.is_terminal())
            .min_by_key(|(_, record)| record.submitted_at)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                tracing::debug!(task_id = %id, "Evicting terminal task record");
                registry.remove(&id);
            }
            None => break,
        }
    }
}
