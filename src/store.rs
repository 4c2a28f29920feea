//! Evaluation persistence
//!
//! A store only ever receives finalized evaluations, each written in a single
//! call together with all of its criterion results. Nothing is half-written:
//! the JSON store writes to a temp file and renames it into place.

use crate::error::{StoreError, StoreResult};
use crate::evaluation::Evaluation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Default directory for the JSON store, relative to the working directory
pub const DEFAULT_STORE_DIR: &str = ".govaudit/evaluations";

/// Persistence for evaluations and their criterion results
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Persist a finalized evaluation atomically. Refuses non-terminal
    /// evaluations and ids already stored.
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()>;

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Evaluation>>;

    /// All evaluations of a website, oldest first
    async fn list_for_website(&self, website_id: u64) -> StoreResult<Vec<Evaluation>>;

    /// Returns whether something was deleted
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;
}

fn ensure_finalized(evaluation: &Evaluation) -> StoreResult<()> {
    if !evaluation.status.is_terminal() {
        return Err(StoreError::NotFinalized {
            id: evaluation.id.to_string(),
            status: evaluation.status,
        });
    }
    Ok(())
}

fn sort_oldest_first(evaluations: &mut [Evaluation]) {
    evaluations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// In-memory store backed by a `HashMap<id, evaluation>`
#[derive(Debug, Default)]
pub struct MemoryStore {
    evaluations: Mutex<HashMap<Uuid, Evaluation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<Uuid, Evaluation>>> {
        self.evaluations
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()> {
        ensure_finalized(evaluation)?;
        let mut evaluations = self.lock()?;
        if evaluations.contains_key(&evaluation.id) {
            return Err(StoreError::AlreadyExists(evaluation.id.to_string()));
        }
        evaluations.insert(evaluation.id, evaluation.clone());
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Evaluation>> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn list_for_website(&self, website_id: u64) -> StoreResult<Vec<Evaluation>> {
        let mut found: Vec<Evaluation> = self
            .lock()?
            .values()
            .filter(|e| e.website_id == website_id)
            .cloned()
            .collect();
        sort_oldest_first(&mut found);
        Ok(found)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        Ok(self.lock()?.remove(id).is_some())
    }
}

/// One pretty-printed JSON document per evaluation: `<dir>/<id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(path: &Path) -> StoreResult<Evaluation> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl EvaluationStore for JsonFileStore {
    async fn save(&self, evaluation: &Evaluation) -> StoreResult<()> {
        ensure_finalized(evaluation)?;
        let path = self.path_for(&evaluation.id);
        if path.exists() {
            return Err(StoreError::AlreadyExists(evaluation.id.to_string()));
        }
        fs::create_dir_all(&self.dir)?;

        let content = serde_json::to_string_pretty(evaluation)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Evaluation>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    async fn list_for_website(&self, website_id: u64) -> StoreResult<Vec<Evaluation>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(evaluation) if evaluation.website_id == website_id => found.push(evaluation),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable evaluation");
                }
            }
        }
        sort_oldest_first(&mut found);
        Ok(found)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}
