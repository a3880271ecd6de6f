use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::logging::{self, FileIOType, OperationCategory};
use crate::utils::traits::StateStore;

#[derive(Debug)]
pub enum StateError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::IoError(err)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::JsonError(err)
    }
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::IoError(e) => write!(f, "IO error: {}", e),
            StateError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for StateError {}

/// On-disk shape of the state file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub current_distance: f64,
}

/// Progress stored as `{"current_distance": <km>}` in a JSON file.
///
/// Saves overwrite the file in place.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&mut self) -> Result<f64, StateError> {
        let _timing = logging::start_timing("load_state",
            OperationCategory::FileIO { subcategory: FileIOType::StateLoad });

        let contents = fs::read_to_string(&self.path)?;
        let state: PersistedState = serde_json::from_str(&contents)?;
        Ok(state.current_distance)
    }

    fn save(&mut self, current_distance: f64) -> Result<(), StateError> {
        let _timing = logging::start_timing("save_state",
            OperationCategory::FileIO { subcategory: FileIOType::StateSave });

        let json = serde_json::to_string(&PersistedState { current_distance })?;
        fs::write(&self.path, json)?;
        debug!("Saved state {:.3} km to {}", current_distance, self.path.display());
        Ok(())
    }
}

/// Used when no state file was requested; nothing is remembered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStateStore;

impl StateStore for NullStateStore {
    fn load(&mut self) -> Result<f64, StateError> {
        Ok(0.0)
    }

    fn save(&mut self, _current_distance: f64) -> Result<(), StateError> {
        Ok(())
    }
}

/// Keeps every saved value in memory.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    pub saved: Vec<f64>,
    pub initial: Option<f64>,
}

#[cfg(test)]
impl MemoryStateStore {
    pub fn with_initial(distance: f64) -> Self {
        Self {
            saved: Vec::new(),
            initial: Some(distance),
        }
    }

    pub fn last_saved(&self) -> Option<f64> {
        self.saved.last().copied()
    }
}

#[cfg(test)]
impl StateStore for MemoryStateStore {
    fn load(&mut self) -> Result<f64, StateError> {
        match self.last_saved().or(self.initial) {
            Some(distance) => Ok(distance),
            None => Err(StateError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no state saved",
            ))),
        }
    }

    fn save(&mut self, current_distance: f64) -> Result<(), StateError> {
        self.saved.push(current_distance);
        Ok(())
    }
}
