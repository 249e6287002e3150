// src/catalog/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use chrono::Utc;

use super::Catalog;
use crate::pipeline::{Stage, Task, TaskId, TaskStatus};

/// Catalog kept entirely in memory.
///
/// Clones share the same task map, so a test can keep a handle and inspect
/// what the scheduler wrote.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tasks: Arc<Mutex<BTreeMap<TaskId, Task>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let catalog = Self::new();
        for task in tasks {
            catalog.insert(task);
        }
        catalog
    }

    /// Insert or replace a task.
    pub fn insert(&self, task: Task) {
        self.lock().insert(task.id.clone(), task);
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    /// Every task regardless of status, ordered by id.
    pub fn all(&self) -> Vec<Task> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TaskId, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available_where(&self, pred: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.lock()
            .values()
            .filter(|t| t.status == TaskStatus::Available && pred(t))
            .cloned()
            .collect()
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Task)) -> Result<()> {
        let mut tasks = self.lock();
        let stored = tasks
            .get_mut(id)
            .ok_or_else(|| anyhow!("task {id} not found in catalog"))?;
        f(stored);
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn tasks_by_stage(&self, stage: Stage) -> Result<Vec<Task>> {
        Ok(self.available_where(|t| t.stage == stage))
    }

    fn processing_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.available_where(|t| t.stage.is_processing()))
    }

    fn update_task_state(&self, task: &Task) -> Result<()> {
        self.modify(&task.id, |stored| {
            stored.stage = task.stage;
            stored.status = task.status;
            stored.error = task.error.clone();
            stored.execution_job_id = task.execution_job_id.clone();
        })
    }

    fn touch_timestamp(&self, task: &Task) -> Result<()> {
        self.modify(&task.id, |stored| stored.updated_at = Utc::now())
    }
}
