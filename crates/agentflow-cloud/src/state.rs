//! Deployment state persistence
//!
//! The `.agentflow/deploy.json` file is the single source of truth for
//! "what did we create": a flat record mapping each resource kind to its
//! canonical URI/ID. Writes go through a temp-file-then-rename swap so a
//! crash never leaves a half-written record, and a put of one kind never
//! clobbers the others (read-modify-write of the whole document).
//!
//! The record may be stale relative to remote state; callers re-verify
//! stored identifiers through the resource managers before trusting them.

use crate::error::{CloudError, Result};
use agentflow_core::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".agentflow";
const STATE_FILE: &str = "deploy.json";
const STATE_TMP: &str = "deploy.json.tmp";
const STATE_BACKUP: &str = "deploy.json.backup";
const LOCK_FILE: &str = "lock.json";

/// The persisted record: one optional entry per resource kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    /// Canonical compute resource URI.
    pub compute: Option<String>,
    /// Authorization resource ID.
    pub authorization: Option<String>,
    /// Server-assigned binding ID.
    pub binding: Option<String>,
}

impl Default for DeploymentRecord {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            compute: None,
            authorization: None,
            binding: None,
        }
    }
}

impl DeploymentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Compute => self.compute.as_deref(),
            ResourceKind::Authorization => self.authorization.as_deref(),
            ResourceKind::Binding => self.binding.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: impl Into<String>) {
        let slot = self.slot(kind);
        *slot = Some(value.into());
        self.updated_at = Utc::now();
    }

    pub fn clear(&mut self, kind: ResourceKind) -> Option<String> {
        let cleared = self.slot(kind).take();
        if cleared.is_some() {
            self.updated_at = Utc::now();
        }
        cleared
    }

    pub fn is_empty(&self) -> bool {
        self.compute.is_none() && self.authorization.is_none() && self.binding.is_none()
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut Option<String> {
        match kind {
            ResourceKind::Compute => &mut self.compute,
            ResourceKind::Authorization => &mut self.authorization,
            ResourceKind::Binding => &mut self.binding,
        }
    }
}

/// Durable key→identifier store backed by the state file.
pub struct StateStore {
    project_root: PathBuf,
}

impl StateStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.state_dir().join(STATE_TMP)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current record, or an empty one if none exists yet.
    pub async fn load(&self) -> Result<DeploymentRecord> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty record");
            return Ok(DeploymentRecord::new());
        }

        let content = fs::read_to_string(&path).await?;
        let record: DeploymentRecord = serde_json::from_str(&content)
            .map_err(|e| CloudError::State(format!("corrupt state file {}: {e}", path.display())))?;

        if record.version > STATE_VERSION {
            return Err(CloudError::State(format!(
                "State file version {} is newer than supported version {}",
                record.version, STATE_VERSION
            )));
        }
        Ok(record)
    }

    /// Save the record via temp-file-then-rename, keeping the previous file
    /// as a backup.
    pub async fn save(&self, record: &DeploymentRecord) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let tmp = self.tmp_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::copy(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!("Saved deployment record");
        Ok(())
    }

    /// Read one entry.
    pub async fn get(&self, kind: ResourceKind) -> Result<Option<String>> {
        Ok(self.load().await?.get(kind).map(String::from))
    }

    /// Write one entry without touching the others.
    pub async fn put(&self, kind: ResourceKind, value: impl Into<String>) -> Result<()> {
        let mut record = self.load().await?;
        record.set(kind, value);
        self.save(&record).await
    }

    /// Remove one entry without touching the others.
    pub async fn remove(&self, kind: ResourceKind) -> Result<()> {
        let mut record = self.load().await?;
        if record.clear(kind).is_some() {
            self.save(&record).await?;
        }
        Ok(())
    }

    /// Acquire the run lock. Two orchestration runs against the same store
    /// must never execute concurrently; a lock left by a crashed run is
    /// taken over once it is older than an hour.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();
        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)
                .map_err(|e| CloudError::Lock(format!("unreadable lock file: {e}")))?;

            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::Lock(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }
            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the run lock.
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            // Synchronous cleanup in drop - not ideal but necessary
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
