use chrono::{NaiveDate, Utc};

use super::sync::{SyncError, Synchronizer};
use crate::api::{ApiError, Resource, Timesheet};
use crate::model::{Task, TaskStatus, TimeEntryDraft, TimeSpent};

/// Error type for completing a task
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("invalid time: {0}")]
    InvalidTime(String),
    #[error("task {0} is already complete")]
    AlreadyComplete(String),
    #[error("task has no id")]
    MissingId,
    #[error("task not found: {0}")]
    NotLoaded(String),
    #[error("no completion in progress")]
    NotCapturing,
    #[error("could not record time entry: {0}")]
    EntryFailed(#[source] ApiError),
    /// The time entry exists but the task still shows as open. Not retried;
    /// running the completion again would record the time twice.
    #[error("time entry recorded, but updating the task failed: {0}")]
    StatusUpdateFailed(#[source] SyncError),
}

impl CompletionError {
    pub fn is_permission_denied(&self) -> bool {
        match self {
            CompletionError::EntryFailed(e) => e.is_permission_denied(),
            CompletionError::StatusUpdateFailed(e) => e.is_permission_denied(),
            _ => false,
        }
    }
}

/// Largest hour count a time entry can carry; its minute total still fits
/// a `u32`.
pub const MAX_HOURS: f64 = (u32::MAX / 60) as f64;

/// Split decimal hours plus extra minutes into whole hours and minutes.
///
/// The fractional hour is rounded to the nearest minute, and minutes of 60
/// or more carry into hours: `1.5h + 45m` is `2h 15m`.
pub fn decompose_hours(hours: f64, extra_minutes: u32) -> Result<TimeSpent, CompletionError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(CompletionError::InvalidTime(format!(
            "hours must be a non-negative number, got {}",
            hours
        )));
    }
    if hours > MAX_HOURS {
        return Err(CompletionError::InvalidTime(format!(
            "hours must be at most {}, got {}",
            MAX_HOURS, hours
        )));
    }
    let whole = hours.trunc();
    let fraction_minutes = ((hours - whole) * 60.0).round() as u32;
    let total = fraction_minutes.checked_add(extra_minutes).ok_or_else(|| {
        CompletionError::InvalidTime(format!("{} extra minutes is too many", extra_minutes))
    })?;
    let hours = (whole as u32)
        .checked_add(total / 60)
        .filter(|h| f64::from(*h) <= MAX_HOURS)
        .ok_or_else(|| CompletionError::InvalidTime("total time is too large".to_string()))?;
    Ok(TimeSpent {
        hours,
        minutes: total % 60,
    })
}

/// What the user enters when completing a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionInput {
    pub hours: f64,
    pub minutes: u32,
    pub notes: String,
    /// Recorded on the task as `completed_by`
    pub completed_by: Option<String>,
}

/// The two writes a completion performed
#[derive(Debug, Clone)]
pub struct CompletionReceipt {
    pub entry: TimeEntryDraft,
    pub task: Task,
    pub spent: TimeSpent,
}

/// The timesheet entry recorded for `task`
pub fn time_entry_for(task: &Task, spent: TimeSpent, notes: &str, date: NaiveDate) -> TimeEntryDraft {
    let client_id = task
        .anchor_client()
        .map(|c| c.id.clone())
        .unwrap_or_default();
    let notes = notes.trim();
    TimeEntryDraft {
        hours: spent.hours,
        minutes: spent.minutes,
        item: task.title.clone(),
        description: if notes.is_empty() {
            task.description.clone()
        } else {
            notes.to_string()
        },
        category: task.job_type.clone(),
        ..TimeEntryDraft::new(date.format("%Y-%m-%d").to_string(), client_id)
    }
}

/// Record time against `task_id` and mark it complete.
///
/// The timesheet write goes first; the task is only updated once the entry
/// was accepted.
pub async fn complete_task<R, S>(
    tasks: &mut Synchronizer<R>,
    timesheet: &S,
    task_id: &str,
    input: &CompletionInput,
    date: NaiveDate,
) -> Result<CompletionReceipt, CompletionError>
where
    R: Resource<Record = Task>,
    S: Timesheet + ?Sized,
{
    let task = tasks
        .find(task_id)
        .cloned()
        .ok_or_else(|| CompletionError::NotLoaded(task_id.to_string()))?;
    if task.status == TaskStatus::Complete {
        return Err(CompletionError::AlreadyComplete(task_id.to_string()));
    }
    let spent = decompose_hours(input.hours, input.minutes)?;

    let entry = time_entry_for(&task, spent, &input.notes, date);
    if entry.client_id.is_empty() {
        tracing::warn!(task_id, "task has no client assignee; time entry has no client");
    }
    timesheet.create_entry(&entry).await.map_err(|e| {
        tracing::error!(task_id, error = %e, "time entry failed");
        CompletionError::EntryFailed(e)
    })?;
    tracing::debug!(task_id, %spent, "time entry recorded");

    let mut completed = task;
    completed.status = TaskStatus::Complete;
    completed.time_spent = Some(spent);
    completed.actual_hours = Some(spent.total_minutes() as f64 / 60.0);
    completed.completed_at = Some(Utc::now());
    if input.completed_by.is_some() {
        completed.completed_by = input.completed_by.clone();
    }
    let notes = input.notes.trim();
    if !notes.is_empty() {
        completed.completion_notes = Some(notes.to_string());
    }

    let task = tasks
        .update(task_id, &completed)
        .await
        .map_err(CompletionError::StatusUpdateFailed)?;
    Ok(CompletionReceipt { entry, task, spent })
}

/// Where a completion is in its lifecycle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CompletionState {
    #[default]
    Idle,
    Capturing {
        task_id: String,
        title: String,
        input: CompletionInput,
    },
    Done {
        task_id: String,
        spent: TimeSpent,
    },
}

/// Completion as a small state machine: begin → capture input → confirm.
#[derive(Debug, Default)]
pub struct CompletionFlow {
    state: CompletionState,
}

impl CompletionFlow {
    pub fn state(&self) -> &CompletionState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CompletionState::Capturing { .. })
    }

    pub fn begin(&mut self, task: &Task) -> Result<(), CompletionError> {
        let task_id = task.id.clone().ok_or(CompletionError::MissingId)?;
        if task.status == TaskStatus::Complete {
            return Err(CompletionError::AlreadyComplete(task_id));
        }
        self.state = CompletionState::Capturing {
            task_id,
            title: task.title.clone(),
            input: CompletionInput::default(),
        };
        Ok(())
    }

    /// The task being completed, while capturing
    pub fn task_id(&self) -> Option<&str> {
        match &self.state {
            CompletionState::Capturing { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut CompletionInput> {
        match &mut self.state {
            CompletionState::Capturing { input, .. } => Some(input),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = CompletionState::Idle;
    }

    /// The task and input to submit, while capturing
    pub fn request(&self) -> Result<(String, CompletionInput), CompletionError> {
        match &self.state {
            CompletionState::Capturing { task_id, input, .. } => {
                Ok((task_id.clone(), input.clone()))
            }
            _ => Err(CompletionError::NotCapturing),
        }
    }

    /// Move to the state that follows `result` for `task_id`. On failure the
    /// flow stays in capture so the user can fix the input, except after the
    /// entry was recorded.
    pub fn settle(&mut self, task_id: &str, result: &Result<CompletionReceipt, CompletionError>) {
        match result {
            Ok(receipt) => {
                self.state = CompletionState::Done {
                    task_id: task_id.to_string(),
                    spent: receipt.spent,
                };
            }
            Err(CompletionError::StatusUpdateFailed(_)) => self.state = CompletionState::Idle,
            Err(_) => {}
        }
    }

    /// Perform the completion and settle on its result
    pub async fn confirm<R, S>(
        &mut self,
        tasks: &mut Synchronizer<R>,
        timesheet: &S,
        date: NaiveDate,
    ) -> Result<CompletionReceipt, CompletionError>
    where
        R: Resource<Record = Task>,
        S: Timesheet + ?Sized,
    {
        let (task_id, input) = self.request()?;
        let result = complete_task(tasks, timesheet, &task_id, &input, date).await;
        self.settle(&task_id, &result);
        result
    }
}
