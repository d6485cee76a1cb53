use serde::{Deserialize, Serialize};

use super::assignee::{Assignee, anchor_client};
use super::record::{Activatable, Record};

/// How often a template produces a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    #[serde(alias = "Daily")]
    Daily,
    #[serde(alias = "Weekly")]
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    pub fn parse(s: &str) -> Option<Frequency> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Some(Frequency::Daily),
            "weekly" | "w" => Some(Frequency::Weekly),
            _ => None,
        }
    }
}

/// Priority shared by templates and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Some(Priority::Low),
            "medium" | "med" | "m" => Some(Priority::Medium),
            "high" | "h" => Some(Priority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// A reusable task definition that produces tasks on a cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Server-assigned id (`_id` on the wire); `None` for drafts
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub visible_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Default for TaskTemplate {
    fn default() -> Self {
        TaskTemplate {
            id: None,
            title: String::new(),
            description: String::new(),
            frequency: Frequency::default(),
            priority: Priority::default(),
            job_type: String::new(),
            assignees: Vec::new(),
            is_active: true,
            visible_to: Vec::new(),
            created_by: None,
        }
    }
}

impl TaskTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        TaskTemplate {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The client this template is grouped under, if any
    pub fn anchor_client(&self) -> Option<&Assignee> {
        anchor_client(&self.assignees)
    }
}

impl Record for TaskTemplate {
    const KIND: &'static str = "template";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn assignees(&self) -> &[Assignee] {
        &self.assignees
    }

    fn assignees_mut(&mut self) -> &mut Vec<Assignee> {
        &mut self.assignees
    }
}

impl Activatable for TaskTemplate {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}
