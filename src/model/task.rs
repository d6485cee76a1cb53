use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::assignee::{Assignee, anchor_client};
use super::record::Record;
use super::template::Priority;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "Active", alias = "pending", alias = "Pending")]
    Active,
    #[serde(alias = "Complete", alias = "completed", alias = "Completed")]
    Complete,
    #[serde(alias = "Hold")]
    Hold,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Complete => "complete",
            TaskStatus::Hold => "hold",
        }
    }

    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "pending" => Some(TaskStatus::Active),
            "complete" | "completed" | "done" => Some(TaskStatus::Complete),
            "hold" | "on-hold" => Some(TaskStatus::Hold),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side list filter (`filter_type` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Everything not yet complete
    #[default]
    Open,
    /// High priority, not complete
    Priority,
    /// Completed tasks only
    Completed,
}

impl TaskFilter {
    pub fn parse(s: &str) -> Option<TaskFilter> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "all" => Some(TaskFilter::Open),
            "priority" => Some(TaskFilter::Priority),
            "completed" | "complete" | "done" => Some(TaskFilter::Completed),
            _ => None,
        }
    }

    /// The `filter_type` value to send, if any
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            TaskFilter::Open => None,
            TaskFilter::Priority => Some("priority"),
            TaskFilter::Completed => Some("completed"),
        }
    }
}

/// Time recorded against a completed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSpent {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

impl TimeSpent {
    pub fn total_minutes(self) -> u64 {
        u64::from(self.hours) * 60 + u64::from(self.minutes)
    }
}

impl std::fmt::Display for TimeSpent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h {:02}m", self.hours, self.minutes)
    }
}

/// A concrete unit of work, possibly produced from a template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default)]
    pub visible_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<TimeSpent>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Parsed due date; `None` when blank or not `YYYY-MM-DD`
    pub fn due(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d").ok()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Complete && self.due().is_some_and(|d| d < today)
    }

    pub fn anchor_client(&self) -> Option<&Assignee> {
        anchor_client(&self.assignees)
    }
}

/// RFC 3339, or a timestamp without a zone read as UTC
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|t| t.and_utc())
}

// An unreadable timestamp decodes as `None` instead of failing the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

impl Record for Task {
    const KIND: &'static str = "task";

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_aliases() {
        let t: Task = serde_json::from_str(r#"{"_id":"1","status":"Active"}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Active);
        let t: Task = serde_json::from_str(r#"{"_id":"1","status":"completed"}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Complete);
        let t: Task = serde_json::from_str(r#"{"_id":"1"}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Active);
    }

    #[test]
    fn overdue_ignores_complete_and_blank_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let mut t = Task::new("Upload");
        assert!(!t.is_overdue(today));
        t.due_date = "2025-06-09".into();
        assert!(t.is_overdue(today));
        t.status = TaskStatus::Complete;
        assert!(!t.is_overdue(today));
    }

    #[test]
    fn time_spent_parses_from_server() {
        let t: Task = serde_json::from_str(
            r#"{"_id":"1","status":"complete","time_spent":{"hours":2,"minutes":5}}"#,
        )
        .unwrap();
        let spent = t.time_spent.unwrap();
        assert_eq!(spent.total_minutes(), 125);
        assert_eq!(spent.to_string(), "2h 05m");
    }

    #[test]
    fn completed_at_accepts_zoneless_timestamps() {
        let tasks: Vec<Task> = serde_json::from_str(
            r#"[
                {"_id":"1","title":"Edit promo","status":"complete",
                 "completed_at":"2024-06-03T12:00:00.123000"},
                {"_id":"2","title":"Upload","completed_at":"2024-06-04T09:30:00Z"}
            ]"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].completed_at.unwrap().to_rfc3339(),
            "2024-06-03T12:00:00.123+00:00"
        );
        assert_eq!(
            tasks[1].completed_at.unwrap().to_rfc3339(),
            "2024-06-04T09:30:00+00:00"
        );
    }

    #[test]
    fn unreadable_completed_at_is_dropped() {
        let t: Task =
            serde_json::from_str(r#"{"_id":"1","completed_at":{"$date":1717416000000}}"#).unwrap();
        assert_eq!(t.completed_at, None);
        let t: Task = serde_json::from_str(r#"{"_id":"1","completed_at":"yesterday"}"#).unwrap();
        assert_eq!(t.completed_at, None);
        let t: Task = serde_json::from_str(r#"{"_id":"1","completed_at":null}"#).unwrap();
        assert_eq!(t.completed_at, None);
        assert!(parse_timestamp("2024-06-03 12:00:00").is_some());
    }

    #[test]
    fn filter_query_values() {
        assert_eq!(TaskFilter::Open.query_value(), None);
        assert_eq!(TaskFilter::Completed.query_value(), Some("completed"));
    }
}
