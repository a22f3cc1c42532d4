#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize as _;
use time::Date;
use tracing::{debug, info, warn};

use crate::error::KanbanError;
use crate::task::model::{Status, Task};

/// Result of an id-addressed mutation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NotFound,
}

impl Outcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// The task collection plus the JSON file it is mirrored to.
///
/// Every mutating call rewrites the whole file before returning. Ids come
/// from a counter persisted in a `<file>.seq` sidecar so they are never
/// reissued, even after the highest task is deleted.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    pretty: bool,
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// Opens the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, KanbanError> {
        let path = path.into();
        let tasks = read_tasks(&path)?;
        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let after_max = max_id.checked_add(1).ok_or_else(|| KanbanError::Malformed {
            path: path.clone(),
            reason: format!("task id {max_id} leaves no room for new ids"),
        })?;
        let next_id = read_seq(&seq_path(&path))?.unwrap_or(0).max(after_max);
        debug!(path = %path.display(), count = tasks.len(), next_id, "loaded tasks");
        Ok(Self {
            path,
            pretty: true,
            tasks,
            next_id,
        })
    }

    /// Toggles four-space pretty printing for subsequent saves.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Writes the whole collection, then the id counter.
    pub fn save(&self) -> Result<(), KanbanError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| KanbanError::IoPath {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let data = encode_tasks(&self.tasks, self.pretty)?;
        write_replace(&self.path, &data)?;
        write_replace(&seq_path(&self.path), self.next_id.to_string().as_bytes())?;
        debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    pub fn add(&mut self, title: &str, status: Status, date: Date) -> Result<Task, KanbanError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(KanbanError::EmptyTitle);
        }
        let following = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| KanbanError::Other("task ids exhausted".to_owned()))?;
        let task = Task {
            id: self.next_id,
            title: title.to_owned(),
            status,
            date,
        };
        self.next_id = following;
        self.tasks.push(task.clone());
        self.save()?;
        info!(id = task.id, status = %task.status, "added task");
        Ok(task)
    }

    pub fn update_status(&mut self, id: u64, status: Status) -> Result<Outcome, KanbanError> {
        let outcome = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                Outcome::Applied
            }
            None => Outcome::NotFound,
        };
        self.save()?;
        match outcome {
            Outcome::Applied => info!(id, %status, "moved task"),
            Outcome::NotFound => warn!(id, "status update for unknown task"),
        }
        Ok(outcome)
    }

    pub fn delete(&mut self, id: u64) -> Result<Outcome, KanbanError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let outcome = if self.tasks.len() < before {
            Outcome::Applied
        } else {
            Outcome::NotFound
        };
        self.save()?;
        match outcome {
            Outcome::Applied => info!(id, "deleted task"),
            Outcome::NotFound => warn!(id, "delete of unknown task"),
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn query_by_status(&self, status: Status) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }
}

fn seq_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".seq");
    path.with_file_name(name)
}

fn read_tasks(path: &Path) -> Result<Vec<Task>, KanbanError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read(path).map_err(|source| KanbanError::IoPath {
        path: path.to_path_buf(),
        source,
    })?;
    let tasks: Vec<Task> = serde_json::from_slice(&data).map_err(|e| KanbanError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(KanbanError::Malformed {
                path: path.to_path_buf(),
                reason: format!("duplicate task id {}", task.id),
            });
        }
        if task.id == 0 {
            return Err(KanbanError::Malformed {
                path: path.to_path_buf(),
                reason: "task id must be positive".to_owned(),
            });
        }
        if task.title.trim().is_empty() {
            return Err(KanbanError::Malformed {
                path: path.to_path_buf(),
                reason: format!("task {} has an empty title", task.id),
            });
        }
    }
    Ok(tasks)
}

fn read_seq(path: &Path) -> Result<Option<u64>, KanbanError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| KanbanError::IoPath {
        path: path.to_path_buf(),
        source,
    })?;
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| KanbanError::Malformed {
            path: path.to_path_buf(),
            reason: format!("invalid id counter '{}': {e}", raw.trim()),
        })
}

fn encode_tasks(tasks: &[Task], pretty: bool) -> Result<Vec<u8>, KanbanError> {
    let encode_err = |e: serde_json::Error| KanbanError::Other(format!("failed to encode tasks: {e}"));
    if !pretty {
        return serde_json::to_vec(tasks).map_err(encode_err);
    }
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    tasks.serialize(&mut ser).map_err(encode_err)?;
    Ok(buf)
}

fn write_replace(path: &Path, data: &[u8]) -> Result<(), KanbanError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, data).map_err(|source| KanbanError::IoPath {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| KanbanError::IoPath {
        path: path.to_path_buf(),
        source,
    })
}
