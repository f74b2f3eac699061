//! Best-effort JSON persistence for the traffic state and the audit log.
//!
//! The in-memory state is the source of truth: loading falls back to the
//! seed snapshot on any storage problem, and saving logs failures instead
//! of surfacing them to the mutation that triggered the write.

use crate::audit::AuditEntry;
use crate::state::{CongestionLevel, TrafficState};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage read/write failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Store {
    data_file: PathBuf,
    audit_file: PathBuf,
}

impl Store {
    pub fn new(data_file: impl Into<PathBuf>, audit_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            audit_file: audit_file.into(),
        }
    }

    /// Load the persisted state, or hand back `fallback` when the file is
    /// missing or unreadable. Never fails.
    pub fn load_state(&self, fallback: TrafficState) -> TrafficState {
        if !self.data_file.exists() {
            return fallback;
        }
        match self.try_load_state() {
            Ok(state) => state,
            Err(err) => {
                warn!(path = %self.data_file.display(), error = %err,
                    "Failed to load persisted state, using fallback");
                fallback
            }
        }
    }

    /// Persist the state, logging on failure. Fire-and-forget by contract.
    pub fn save_state(&self, state: &TrafficState) {
        if let Err(err) = self.try_save_state(state) {
            warn!(path = %self.data_file.display(), error = %err,
                "Failed to persist state");
        }
    }

    /// Prepend an entry to the audit log, newest first. Best-effort.
    pub fn append_audit(&self, entry: AuditEntry) {
        if let Err(err) = self.try_append_audit(entry) {
            warn!(path = %self.audit_file.display(), error = %err,
                "Failed to append audit entry");
        }
    }

    fn try_load_state(&self) -> Result<TrafficState, StoreError> {
        let raw = fs::read_to_string(&self.data_file)?;
        let mut state: TrafficState = serde_json::from_str(&raw)?;
        // Stored levels may predate an edit to the file or the thresholds;
        // the queue length is the source of truth.
        for junction in &mut state.junctions {
            junction.congestion_level = CongestionLevel::from_queue(junction.queue_length);
        }
        Ok(state)
    }

    fn try_save_state(&self, state: &TrafficState) -> Result<(), StoreError> {
        ensure_parent_dir(&self.data_file)?;
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(&self.data_file, raw)?;
        Ok(())
    }

    fn try_append_audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        ensure_parent_dir(&self.audit_file)?;
        let mut entries: Vec<AuditEntry> = if self.audit_file.exists() {
            serde_json::from_str(&fs::read_to_string(&self.audit_file)?)?
        } else {
            Vec::new()
        };
        entries.insert(0, entry);
        fs::write(&self.audit_file, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
