use serde::{Deserialize, Serialize};

fn default_entry_type() -> String {
    "item based".to_string()
}

/// Body of `POST {timesheet_entries}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntryDraft {
    /// `YYYY-MM-DD`
    pub date: String,
    pub client_id: String,
    pub hours: u32,
    pub minutes: u32,
    #[serde(rename = "type", default = "default_entry_type")]
    pub kind: String,
    pub item: String,
    pub description: String,
    pub category: String,
}

impl TimeEntryDraft {
    pub fn new(date: impl Into<String>, client_id: impl Into<String>) -> Self {
        TimeEntryDraft {
            date: date.into(),
            client_id: client_id.into(),
            hours: 0,
            minutes: 0,
            kind: default_entry_type(),
            item: String::new(),
            description: String::new(),
            category: String::new(),
        }
    }
}
