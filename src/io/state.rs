use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config_io::atomic_write;
use crate::ops::grouping::ExpandState;

const STATE_FILE: &str = "state.json";

/// Persisted board state (written to state.json beside the config file)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UiState {
    /// Which pane is showing ("templates" or "tasks")
    #[serde(default)]
    pub view: String,
    /// Expanded flag per client group
    #[serde(default)]
    pub expanded: ExpandState,
    /// Last client group filter on the template board
    #[serde(default)]
    pub client_filter: Option<String>,
    /// Last task list filter ("open", "priority", "completed")
    #[serde(default)]
    pub task_filter: Option<String>,
    /// Last title filter pattern
    #[serde(default)]
    pub last_search: Option<String>,
}

pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILE)
}

/// Read state.json from `dir`. Missing or malformed files read as `None`.
pub fn read_ui_state(dir: &Path) -> Option<UiState> {
    let path = state_path(dir);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable ui state");
            None
        }
    }
}

/// Write state.json to `dir`
pub fn write_ui_state(dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&state_path(dir), content.as_bytes())
}
