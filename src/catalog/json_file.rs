// src/catalog/json_file.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{Catalog, InMemoryCatalog};
use crate::pipeline::{Stage, Task};

/// Catalog persisted as a JSON array of tasks.
///
/// Reads are served from memory. Every mutation rewrites the whole file via a
/// sibling temp file and a rename, so a crash leaves either the old or the new
/// contents on disk.
#[derive(Debug)]
pub struct JsonFileCatalog {
    path: PathBuf,
    tasks: InMemoryCatalog,
}

impl JsonFileCatalog {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let tasks: Vec<Task> = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading catalog {:?}", path))?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("parsing catalog {:?}", path))?
            }
        } else {
            Vec::new()
        };

        info!(path = %path.display(), tasks = tasks.len(), "catalog loaded");

        Ok(Self {
            path,
            tasks: InMemoryCatalog::with_tasks(tasks),
        })
    }

    /// Every stored task regardless of status.
    pub fn all(&self) -> Vec<Task> {
        self.tasks.all()
    }

    /// Add or replace a task and persist.
    pub fn insert(&self, task: Task) -> Result<()> {
        let mut tasks: Vec<Task> = self
            .tasks
            .all()
            .into_iter()
            .filter(|t| t.id != task.id)
            .collect();
        tasks.push(task.clone());

        self.persist(&tasks)?;
        self.tasks.insert(task);
        Ok(())
    }

    /// Apply `change` to a staged copy, write the copy out, and only then
    /// adopt the changed task in memory. A failed write leaves memory as is.
    fn commit(&self, id: &str, change: impl FnOnce(&InMemoryCatalog) -> Result<()>) -> Result<()> {
        let staged = InMemoryCatalog::with_tasks(self.tasks.all());
        change(&staged)?;
        self.persist(&staged.all())?;

        if let Some(task) = staged.get(id) {
            self.tasks.insert(task);
        }
        Ok(())
    }

    fn persist(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string_pretty(tasks)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing catalog {:?}", self.path))?;

        debug!(path = %self.path.display(), tasks = tasks.len(), "catalog persisted");
        Ok(())
    }
}

impl Catalog for JsonFileCatalog {
    fn tasks_by_stage(&self, stage: Stage) -> Result<Vec<Task>> {
        self.tasks.tasks_by_stage(stage)
    }

    fn processing_tasks(&self) -> Result<Vec<Task>> {
        self.tasks.processing_tasks()
    }

    fn update_task_state(&self, task: &Task) -> Result<()> {
        self.commit(&task.id, |staged| staged.update_task_state(task))
    }

    fn touch_timestamp(&self, task: &Task) -> Result<()> {
        self.commit(&task.id, |staged| staged.touch_timestamp(task))
    }
}
