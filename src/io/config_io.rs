use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml_edit::{Array, DocumentMut, Item, Table};

use crate::model::config::Config;

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "TASKDESK_BASE_URL";

const CONFIG_FILE: &str = "config.toml";

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config document: {0}")]
    Document(#[from] toml_edit::TomlError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unknown config key '{0}'")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Directory holding config.toml and the saved board state, respecting
/// XDG_CONFIG_HOME
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"));
    base.join("taskdesk")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// The config file to use: `--config` if given, else the default location
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir().join(CONFIG_FILE))
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file reads as
/// an empty document.
pub fn read_config(path: &Path) -> Result<(Config, DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            String::new()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let config: Config = toml::from_str(&text)?;
    let doc: DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Read the config and apply environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let (mut config, _) = read_config(path)?;
    apply_env_overrides(&mut config, |var| std::env::var(var).ok());
    Ok(config)
}

/// Apply `TASKDESK_BASE_URL`. The token variable is read lazily by the
/// token source, not here.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(BASE_URL_ENV)
        && !url.trim().is_empty()
    {
        tracing::debug!(base_url = %url, "base url from environment");
        config.api.base_url = url.trim().to_string();
    }
}

/// Write the config document back to disk, preserving formatting
pub fn write_config(path: &Path, doc: &DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a commented starter config
pub fn init_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    atomic_write(path, STARTER_CONFIG.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

const STARTER_CONFIG: &str = r#"# taskdesk configuration

[api]
base_url = "http://localhost:8000"
# token = "..."  (prefer exporting the variable named by token_env)
token_env = "TASKDESK_TOKEN"
# timeout_secs = 30

[endpoints]
task_templates = "/tasks/templates"
tasks = "/tasks"
employees = "/employees/"
timesheet_entries = "/timesheet/entries"

[search]
min_query_len = 2
employee_min_query_len = 0
debounce_ms = 300

[session]
# user_id = "..."
groups = []

[ui]
show_key_hints = true
"#;

/// Create parent directories, then replace `path` through a temp file
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Str,
    Int,
    Bool,
    List,
}

const KNOWN_KEYS: &[(&str, ValueKind)] = &[
    ("api.base_url", ValueKind::Str),
    ("api.token", ValueKind::Str),
    ("api.token_env", ValueKind::Str),
    ("api.timeout_secs", ValueKind::Int),
    ("endpoints.task_templates", ValueKind::Str),
    ("endpoints.tasks", ValueKind::Str),
    ("endpoints.employees", ValueKind::Str),
    ("endpoints.timesheet_entries", ValueKind::Str),
    ("search.min_query_len", ValueKind::Int),
    ("search.employee_min_query_len", ValueKind::Int),
    ("search.debounce_ms", ValueKind::Int),
    ("session.user_id", ValueKind::Str),
    ("session.groups", ValueKind::List),
    ("ui.show_key_hints", ValueKind::Bool),
];

fn key_kind(key: &str) -> Option<ValueKind> {
    if let Some(color) = key.strip_prefix("ui.colors.") {
        return (!color.is_empty() && !color.contains('.')).then_some(ValueKind::Str);
    }
    KNOWN_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
}

/// Set a dotted key (`search.min_query_len`) from its text form, leaving
/// the rest of the document untouched.
pub fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<(), ConfigError> {
    let kind = key_kind(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    };

    let item = match kind {
        ValueKind::Str => toml_edit::value(raw),
        ValueKind::Int => {
            let n: i64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid("expected a whole number"))?;
            if n < 0 {
                return Err(invalid("must not be negative"));
            }
            toml_edit::value(n)
        }
        ValueKind::Bool => match raw.trim() {
            "true" => toml_edit::value(true),
            "false" => toml_edit::value(false),
            _ => return Err(invalid("expected true or false")),
        },
        ValueKind::List => {
            let items: Array = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            toml_edit::value(items)
        }
    };

    let parts: Vec<&str> = key.split('.').collect();
    let Some((field, tables)) = parts.split_last() else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };
    let mut table: &mut Table = doc.as_table_mut();
    for name in tables {
        if !table.contains_key(name) {
            table.insert(name, Item::Table(Table::new()));
        }
        table = table[*name]
            .as_table_mut()
            .ok_or_else(|| invalid(&format!("[{}] is not a table", name)))?;
    }
    table[*field] = item;

    // Catch values that parse as TOML but not as config
    toml::from_str::<Config>(&doc.to_string())?;
    Ok(())
}
