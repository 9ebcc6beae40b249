use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::load_task_file;
use crate::task::Task;
use crate::types::DEFAULT_CATEGORY;

#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Task>>;
}

pub struct VecTaskSource {
    tasks: Vec<Task>,
}

impl VecTaskSource {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl TaskSource for VecTaskSource {
    async fn load(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }
}

/// Loads `*.yaml` / `*.yml` task files from a directory tree:
///
/// ```text
/// tasks/
///   warmup.yaml          -> category "unclassified"
///   reasoning/
///     stick_gate.yaml    -> category "reasoning"
/// ```
///
/// Only one level of subdirectories is scanned. Tasks come back in path order.
/// Invalid files are logged and skipped unless the source is strict.
pub struct YamlDirTaskSource {
    root: PathBuf,
    strict: bool,
}

impl YamlDirTaskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strict: false,
        }
    }

    /// Fail the whole load on the first invalid task file.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[async_trait]
impl TaskSource for YamlDirTaskSource {
    async fn load(&self) -> Result<Vec<Task>> {
        let mut files = Vec::new();
        for entry in read_dir_sorted(&self.root).await? {
            if entry.is_dir() {
                let category = entry
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
                for nested in read_dir_sorted(&entry).await? {
                    if is_task_file(&nested) {
                        files.push((nested, category.clone()));
                    }
                }
            } else if is_task_file(&entry) {
                files.push((entry, DEFAULT_CATEGORY.to_string()));
            }
        }
        files.sort();

        let mut tasks = Vec::with_capacity(files.len());
        for (path, category) in files {
            match load_task_file(&path, &category).await {
                Ok(task) => {
                    debug!(path = %path.display(), task = %task.name, category = %task.category, "loaded task");
                    tasks.push(task);
                }
                Err(err) if self.strict => return Err(err.into()),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping invalid task file"),
            }
        }
        Ok(tasks)
    }
}

fn is_task_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
}

async fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read task directory {:?}", dir))?;
    let mut paths = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .with_context(|| format!("Failed to list {:?}", dir))?
    {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
