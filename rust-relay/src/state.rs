//! Persisted dedup state.
//!
//! The state file is a JSON object mapping each source id to the ordered
//! list of entry identifiers already processed for that source. It is
//! loaded once per run and saved once at the end.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

/// Maximum identifiers kept per source after a save.
pub const MAX_HISTORY: usize = 4000;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state io error: {0}")]
    Io(#[from] io::Error),
    #[error("state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered, append-only list of identifiers seen for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SourceHistory {
    ids: Vec<String>,
    index: HashSet<String>,
}

impl SourceHistory {
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Append an identifier. Returns false if it was already present.
    pub fn push(&mut self, id: String) -> bool {
        if !self.index.insert(id.clone()) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Drop the oldest identifiers so at most `max` remain.
    pub fn trim_to(&mut self, max: usize) {
        if self.ids.len() <= max {
            return;
        }
        let excess = self.ids.len() - max;
        for id in self.ids.drain(..excess) {
            self.index.remove(&id);
        }
    }
}

impl From<Vec<String>> for SourceHistory {
    fn from(ids: Vec<String>) -> Self {
        let mut history = SourceHistory::default();
        for id in ids {
            history.push(id);
        }
        history
    }
}

impl From<SourceHistory> for Vec<String> {
    fn from(history: SourceHistory) -> Self {
        history.ids
    }
}

/// Seen-lists for every source, keyed by source id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenState {
    sources: BTreeMap<String, SourceHistory>,
}

impl SeenState {
    /// Seen-list of a source, created empty when absent.
    pub fn source_mut(&mut self, source_id: &str) -> &mut SourceHistory {
        self.sources.entry(source_id.to_string()).or_default()
    }

    pub fn source(&self, source_id: &str) -> Option<&SourceHistory> {
        self.sources.get(source_id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn trim_all(&mut self, max: usize) {
        for history in self.sources.values_mut() {
            history.trim_to(max);
        }
    }
}

/// Reads and writes [`SeenState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state; a missing or unreadable file means no history.
    pub fn load(&self) -> SeenState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "state_missing_starting_fresh");
                return SeenState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state_read_failed");
                return SeenState::default();
            }
        };

        match serde_json::from_str::<SeenState>(&raw) {
            Ok(state) => {
                info!(path = %self.path.display(), sources = state.len(), "state_loaded");
                state
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state_parse_failed");
                SeenState::default()
            }
        }
    }

    /// Trim every source to [`MAX_HISTORY`] and write the state atomically.
    pub fn save(&self, state: &mut SeenState) -> Result<(), StateError> {
        state.trim_all(MAX_HISTORY);

        let body = serde_json::to_string_pretty(state)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StateError::Io(e.error))?;

        info!(path = %self.path.display(), sources = state.len(), "state_saved");
        Ok(())
    }
}
