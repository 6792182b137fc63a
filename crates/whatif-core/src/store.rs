//! Scenario store
//!
//! Append-only table of generated scenarios. Identifiers are assigned by the
//! store, unique and strictly increasing; records are never updated or
//! deleted. Two backends:
//! - [`MemoryStore`]: process-local table
//! - [`JsonFileStore`]: the same table persisted as a JSON array, replaced
//!   atomically (temp file + rename) on every append

use crate::error::StoreError;
use crate::types::{Scenario, ScenarioDraft, ScenarioId};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Persistence contract for scenarios
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    /// Assign id and timestamp, persist, and return the full record
    async fn create(&self, draft: ScenarioDraft) -> Result<Scenario, StoreError>;

    /// All scenarios, newest first (empty when none exist)
    async fn list(&self) -> Result<Vec<Scenario>, StoreError>;

    /// Scenario by id
    async fn get(&self, id: ScenarioId) -> Result<Scenario, StoreError>;
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Scenario>,
    last_id: ScenarioId,
}

impl Table {
    fn from_rows(mut rows: Vec<Scenario>) -> Self {
        rows.sort_by_key(|s| s.id);
        let last_id = rows.last().map(|s| s.id).unwrap_or_default();
        Self { rows, last_id }
    }

    fn append(&mut self, draft: ScenarioDraft) -> Scenario {
        self.last_id = self.last_id.next();
        let scenario = Scenario::from_draft(self.last_id, draft, Utc::now());
        self.rows.push(scenario.clone());
        scenario
    }

    /// Undo the most recent append (failed persistence)
    fn rollback(&mut self) {
        if self.rows.pop().is_some() {
            self.last_id = self.rows.last().map(|s| s.id).unwrap_or_default();
        }
    }

    fn newest_first(&self) -> Vec<Scenario> {
        self.rows.iter().rev().cloned().collect()
    }

    fn get(&self, id: ScenarioId) -> Result<Scenario, StoreError> {
        self.rows
            .binary_search_by_key(&id, |s| s.id)
            .map(|idx| self.rows[idx].clone())
            .map_err(|_| StoreError::NotFound(id))
    }
}

/// In-memory scenario table
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Table>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    /// Check if no scenario has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScenarioStore for MemoryStore {
    async fn create(&self, draft: ScenarioDraft) -> Result<Scenario, StoreError> {
        Ok(self.inner.lock().append(draft))
    }

    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        Ok(self.inner.lock().newest_first())
    }

    async fn get(&self, id: ScenarioId) -> Result<Scenario, StoreError> {
        self.inner.lock().get(id)
    }
}

/// Scenario table persisted as a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: tokio::sync::Mutex<Table>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing records
    ///
    /// A missing file is an empty table; parent directories are created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io_error(parent, e))?;
        }

        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::io_error(&path, e)),
        };

        let table = Table::from_rows(rows);
        tracing::info!(
            path = %path.display(),
            scenarios = table.rows.len(),
            "Opened scenario store"
        );

        Ok(Self {
            path,
            inner: tokio::sync::Mutex::new(table),
        })
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &Table) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&table.rows)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io_error(&self.path, e))
    }
}

#[async_trait]
impl ScenarioStore for JsonFileStore {
    async fn create(&self, draft: ScenarioDraft) -> Result<Scenario, StoreError> {
        let mut table = self.inner.lock().await;
        let scenario = table.append(draft);

        if let Err(e) = self.persist(&table).await {
            tracing::error!(error = %e, "Failed to persist scenario; rolling back");
            table.rollback();
            return Err(e);
        }

        Ok(scenario)
    }

    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        Ok(self.inner.lock().await.newest_first())
    }

    async fn get(&self, id: ScenarioId) -> Result<Scenario, StoreError> {
        self.inner.lock().await.get(id)
    }
}
