use async_trait::async_trait;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{PersistenceError, PersistenceResult, StateRepository, WorkflowSnapshot};

/// Snapshot stored as pretty JSON in a single file
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateRepository for JsonFileRepository {
    async fn load(&self) -> PersistenceResult<Option<WorkflowSnapshot>> {
        if !fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "No state file yet");
            return Ok(None);
        }
        let body = fs::read_to_string(&self.path).await?;
        let snapshot: WorkflowSnapshot = serde_json::from_str(&body)?;
        snapshot.verify()?;
        debug!(
            path = %self.path.display(),
            saved_at = %snapshot.saved_at,
            handoffs = snapshot.state.ledger.len(),
            "State loaded"
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &WorkflowSnapshot) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(snapshot)?;
        let temp = self.temp_path();
        fs::write(&temp, body).await?;
        fs::rename(&temp, &self.path).await?;
        info!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

/// Cross-process exclusive lock on `<state file>.lock`
pub struct StateLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl StateLock {
    pub fn open(state_file: &Path) -> PersistenceResult<Self> {
        let mut name = state_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".lock");
        let path = state_file.with_file_name(name);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        Ok(Self {
            path,
            lock: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is ours
    pub fn exclusive(&mut self) -> PersistenceResult<RwLockWriteGuard<'_, File>> {
        let path = self.path.display().to_string();
        debug!(lock = %path, "Acquiring state lock");
        self.lock.write().map_err(|e| PersistenceError::Lock {
            reason: format!("{path}: {e}"),
        })
    }

    /// Fail immediately when another process holds the lock
    pub fn try_exclusive(&mut self) -> PersistenceResult<RwLockWriteGuard<'_, File>> {
        let path = self.path.display().to_string();
        self.lock.try_write().map_err(|_| PersistenceError::Lock {
            reason: format!("{path} is held by another lostfound process"),
        })
    }
}
