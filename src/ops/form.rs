use chrono::NaiveDate;

use super::assignees::AssigneeSelection;
use super::sync::{SyncError, Synchronizer};
use crate::api::Resource;
use crate::model::record::Record;
use crate::model::{Frequency, Priority, Task, TaskStatus, TaskTemplate};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("required: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl SubmitError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, SubmitError::Sync(e) if e.is_permission_denied())
    }
}

/// A record whose scalar fields can be edited by name as text
pub trait Editable: Record + PartialEq {
    /// Editable fields, in form order
    const FIELDS: &'static [&'static str];
    /// Fields that must be non-blank on submit
    const REQUIRED: &'static [&'static str];

    fn field(&self, name: &str) -> Option<String>;
    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError>;
}

fn invalid(field: &str, message: impl Into<String>) -> FormError {
    FormError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, FormError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        other => Err(invalid(field, format!("expected yes or no, got '{}'", other))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_priority(value: &str) -> Result<Priority, FormError> {
    Priority::parse(value).ok_or_else(|| invalid("priority", "expected low, medium or high"))
}

impl Editable for TaskTemplate {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "job_type",
        "frequency",
        "priority",
        "is_active",
        "visible_to",
    ];
    const REQUIRED: &'static [&'static str] = &["title", "description", "job_type"];

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "title" => self.title.clone(),
            "description" => self.description.clone(),
            "job_type" => self.job_type.clone(),
            "frequency" => self.frequency.as_str().to_string(),
            "priority" => self.priority.as_str().to_string(),
            "is_active" => (if self.is_active { "yes" } else { "no" }).to_string(),
            "visible_to" => self.visible_to.join(", "),
            _ => return None,
        })
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        match name {
            "title" => self.title = value.to_string(),
            "description" => self.description = value.to_string(),
            "job_type" => self.job_type = value.to_string(),
            "frequency" => {
                self.frequency = Frequency::parse(value)
                    .ok_or_else(|| invalid("frequency", "expected daily or weekly"))?
            }
            "priority" => self.priority = parse_priority(value)?,
            "is_active" => self.is_active = parse_bool("is_active", value)?,
            "visible_to" => self.visible_to = parse_list(value),
            other => return Err(FormError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

impl Editable for Task {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "job_type",
        "due_date",
        "priority",
        "status",
        "estimated_hours",
        "visible_to",
    ];
    const REQUIRED: &'static [&'static str] = &["title", "description", "job_type", "due_date"];

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "title" => self.title.clone(),
            "description" => self.description.clone(),
            "job_type" => self.job_type.clone(),
            "due_date" => self.due_date.clone(),
            "priority" => self.priority.as_str().to_string(),
            "status" => self.status.as_str().to_string(),
            "estimated_hours" => self
                .estimated_hours
                .map(|h| h.to_string())
                .unwrap_or_default(),
            "visible_to" => self.visible_to.join(", "),
            _ => return None,
        })
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        match name {
            "title" => self.title = value.to_string(),
            "description" => self.description = value.to_string(),
            "job_type" => self.job_type = value.to_string(),
            "due_date" => {
                let value = value.trim();
                if !value.is_empty() && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                    return Err(invalid("due_date", "expected YYYY-MM-DD"));
                }
                self.due_date = value.to_string();
            }
            "priority" => self.priority = parse_priority(value)?,
            "status" => {
                self.status = TaskStatus::parse(value)
                    .ok_or_else(|| invalid("status", "expected active, complete or hold"))?
            }
            "estimated_hours" => {
                let value = value.trim();
                self.estimated_hours = if value.is_empty() {
                    None
                } else {
                    match value.parse::<f64>() {
                        Ok(h) if h.is_finite() && h >= 0.0 => Some(h),
                        _ => return Err(invalid("estimated_hours", "expected a non-negative number")),
                    }
                };
            }
            "visible_to" => self.visible_to = parse_list(value),
            other => return Err(FormError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

/// Working copy behind a create or edit form.
///
/// Nothing reaches the server until [`EditBuffer::submit`], and submit
/// refuses while any required field is blank.
#[derive(Debug, Clone)]
pub struct EditBuffer<T: Editable> {
    original: Option<T>,
    draft: T,
    selection: AssigneeSelection,
}

impl<T: Editable> EditBuffer<T> {
    pub fn create(draft: T) -> Self {
        let selection = AssigneeSelection::from_slice(draft.assignees());
        EditBuffer {
            original: None,
            draft,
            selection,
        }
    }

    pub fn edit(record: &T) -> Self {
        EditBuffer {
            original: Some(record.clone()),
            draft: record.clone(),
            selection: AssigneeSelection::from_slice(record.assignees()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original.as_ref().and_then(|r| r.id()).is_none()
    }

    pub fn get(&self, field: &str) -> String {
        self.draft.field(field).unwrap_or_default()
    }

    pub fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        self.draft.set_field(field, value)
    }

    pub fn selection(&self) -> &AssigneeSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut AssigneeSelection {
        &mut self.selection
    }

    /// Required fields that are currently blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        T::REQUIRED
            .iter()
            .copied()
            .filter(|f| self.get(f).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormError::MissingRequired(missing))
        }
    }

    /// The record as it would be sent
    pub fn build(&self) -> T {
        let mut record = self.draft.clone();
        *record.assignees_mut() = self.selection.items().to_vec();
        record
    }

    pub fn is_dirty(&self) -> bool {
        match &self.original {
            Some(original) => &self.build() != original,
            None => true,
        }
    }

    /// Validate, then create or update through the synchronizer
    pub async fn submit<R>(&self, sync: &mut Synchronizer<R>) -> Result<T, SubmitError>
    where
        R: Resource<Record = T>,
    {
        self.validate()?;
        let record = self.build();
        let saved = match self.original.as_ref().and_then(|r| r.id()) {
            Some(id) => sync.update(id, &record).await?,
            None => sync.create(&record).await?,
        };
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignee;
    use crate::ops::testing::{FakeResource, template};
    use pretty_assertions::assert_eq;

    #[test]
    fn every_listed_field_is_readable() {
        let t = TaskTemplate::default();
        for f in TaskTemplate::FIELDS {
            assert!(t.field(f).is_some(), "{f}");
        }
        let k = Task::default();
        for f in Task::FIELDS {
            assert!(k.field(f).is_some(), "{f}");
        }
    }

    #[test]
    fn missing_required_fields_block_submit() {
        let mut buf = EditBuffer::create(TaskTemplate::default());
        assert_eq!(
            buf.validate(),
            Err(FormError::MissingRequired(vec!["title", "description", "job_type"]))
        );
        buf.set("title", "Weekly report").unwrap();
        buf.set("description", "   ").unwrap();
        buf.set("job_type", "reporting").unwrap();
        assert_eq!(buf.missing_required(), vec!["description"]);
    }

    #[test]
    fn task_requires_due_date() {
        let mut buf = EditBuffer::create(Task {
            title: "x".into(),
            description: "y".into(),
            job_type: "z".into(),
            ..Default::default()
        });
        assert_eq!(buf.missing_required(), vec!["due_date"]);
        assert!(buf.set("due_date", "06/03/2024").is_err());
        buf.set("due_date", "2024-06-03").unwrap();
        assert!(buf.validate().is_ok());
    }

    #[test]
    fn field_parsing() {
        let mut t = TaskTemplate::default();
        t.set_field("frequency", "Weekly").unwrap();
        t.set_field("priority", "high").unwrap();
        t.set_field("is_active", "no").unwrap();
        t.set_field("visible_to", "u1, u2,,").unwrap();
        assert_eq!(t.frequency, Frequency::Weekly);
        assert_eq!(t.priority, Priority::High);
        assert!(!t.is_active);
        assert_eq!(t.visible_to, vec!["u1", "u2"]);
        assert!(matches!(
            t.set_field("color", "red"),
            Err(FormError::UnknownField(_))
        ));

        let mut k = Task::default();
        k.set_field("estimated_hours", "2.5").unwrap();
        assert_eq!(k.estimated_hours, Some(2.5));
        k.set_field("estimated_hours", "").unwrap();
        assert_eq!(k.estimated_hours, None);
        assert!(k.set_field("estimated_hours", "-1").is_err());
    }

    #[test]
    fn dirty_tracks_fields_and_assignees() {
        let original = template("t1", "Weekly report", vec![Assignee::client("c1", "Acme")]);
        let mut buf = EditBuffer::edit(&original);
        assert!(!buf.is_new());
        assert!(!buf.is_dirty());
        buf.selection_mut().select(Assignee::employee("e1", "Dana Reyes"));
        assert!(buf.is_dirty());
        buf.selection_mut().remove("e1");
        assert!(!buf.is_dirty());
    }

    #[tokio::test]
    async fn submit_invalid_sends_nothing() {
        let fake = FakeResource::<TaskTemplate>::with(vec![]);
        let mut sync = Synchronizer::new(fake.clone());
        let buf = EditBuffer::create(TaskTemplate::new("Only a title"));
        let err = buf.submit(&mut sync).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert!(fake.state.lock().unwrap().creates.is_empty());
        assert_eq!(fake.fetches(), 0);
    }

    #[tokio::test]
    async fn submit_edit_updates_in_place() {
        let fake = FakeResource::with(vec![template("t1", "Weekly report", vec![])]);
        let mut sync = Synchronizer::new(fake.clone());
        sync.refresh().await.unwrap();

        let mut buf = EditBuffer::edit(sync.find("t1").unwrap());
        buf.set("title", "Weekly client report").unwrap();
        buf.selection_mut().select(Assignee::client("c1", "Acme"));
        let saved = buf.submit(&mut sync).await.unwrap();

        assert_eq!(saved.id.as_deref(), Some("t1"));
        let stored = sync.find("t1").unwrap();
        assert_eq!(stored.title, "Weekly client report");
        assert_eq!(stored.assignees, vec![Assignee::client("c1", "Acme")]);
        assert_eq!(sync.records().len(), 1);
    }
}
