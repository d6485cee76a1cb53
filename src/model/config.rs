use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::Task;
use super::template::TaskTemplate;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token. Prefer `token_env` so the token stays out of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Environment variable consulted for the token when `token` is unset
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Request timeout. Unset leaves the HTTP client's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            token: None,
            token_env: default_token_env(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_token_env() -> String {
    "TASKDESK_TOKEN".to_string()
}

/// Endpoint paths relative to `api.base_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_task_templates")]
    pub task_templates: String,
    #[serde(default = "default_tasks")]
    pub tasks: String,
    #[serde(default = "default_employees")]
    pub employees: String,
    #[serde(default = "default_timesheet_entries")]
    pub timesheet_entries: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            task_templates: default_task_templates(),
            tasks: default_tasks(),
            employees: default_employees(),
            timesheet_entries: default_timesheet_entries(),
        }
    }
}

fn default_task_templates() -> String {
    "/tasks/templates".to_string()
}

fn default_tasks() -> String {
    "/tasks".to_string()
}

fn default_employees() -> String {
    "/employees/".to_string()
}

fn default_timesheet_entries() -> String {
    "/timesheet/entries".to_string()
}

/// Minimum query lengths per search call site. The remote directory search
/// and the local employee filter have historically used different
/// thresholds; both stay configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    #[serde(default)]
    pub employee_min_query_len: usize,
    /// Idle time before the board sends a search
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            min_query_len: default_min_query_len(),
            employee_min_query_len: 0,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_min_query_len() -> usize {
    2
}

fn default_debounce_ms() -> u64 {
    300
}

/// Claims normally issued by the identity provider alongside the token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Groups new records are made visible to
    #[serde(default)]
    pub groups: Vec<String>,
}

impl SessionConfig {
    /// A blank template owned by this session and visible to its groups
    pub fn new_template(&self) -> TaskTemplate {
        TaskTemplate {
            created_by: self.user_id.clone(),
            visible_to: self.groups.clone(),
            ..Default::default()
        }
    }

    /// A blank task owned by this session and visible to its groups
    pub fn new_task(&self) -> Task {
        Task {
            created_by: self.user_id.clone(),
            visible_to: self.groups.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Color overrides by theme slot name (e.g. `accent = "#E8A33D"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
