use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::{Regex, RegexBuilder};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::theme::Theme;
use super::{input, render};
use crate::api::{ApiResult, RestClient, TaskResource, TemplateResource};
use crate::io::config_io;
use crate::io::state::{self, UiState};
use crate::model::{Assignee, Config, Task, TaskFilter, TaskTemplate};
use crate::ops::assignees::{self, AssigneeSelection, SearchDebounce, SearchGate};
use crate::ops::bulk::{self, BatchReport};
use crate::ops::completion::{
    self, CompletionError, CompletionFlow, CompletionInput, CompletionReceipt,
};
use crate::ops::form::{EditBuffer, Editable, FormError, SubmitError};
use crate::ops::grouping::{ExpandState, build_groups, client_key};
use crate::ops::sync::{SyncError, Synchronizer};

/// How long a toast stays on screen
const TOAST_TTL: Duration = Duration::from_secs(4);

/// Which list the board shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Templates,
    Tasks,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Templates => "templates",
            View::Tasks => "tasks",
        }
    }

    fn from_saved(s: &str) -> View {
        match s {
            "tasks" => View::Tasks,
            _ => View::Templates,
        }
    }
}

/// Interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing a title filter pattern
    Filter,
    /// The edit form is open
    Form,
    /// The assignee picker is open (over the form or for a group copy)
    Picker,
    /// Capturing time for a task completion
    Complete,
    /// Waiting for y/n on a destructive action
    Confirm,
}

/// One line of the board
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Group {
        key: String,
        count: usize,
        inactive: usize,
        expanded: bool,
    },
    Template {
        id: String,
        group: String,
    },
    Task {
        id: String,
    },
}

impl Row {
    /// The group this row belongs to (templates view only)
    pub fn group_key(&self) -> Option<&str> {
        match self {
            Row::Group { key, .. } => Some(key),
            Row::Template { group, .. } => Some(group),
            Row::Task { .. } => None,
        }
    }
}

/// Flatten grouped templates into board rows.
///
/// Groups list in first-appearance order with their header always shown;
/// member rows follow only when the group is expanded. With a title filter,
/// non-matching templates are hidden along with groups left empty.
pub fn build_rows(
    templates: &[TaskTemplate],
    expanded: &mut ExpandState,
    only_group: Option<&str>,
    title_filter: Option<&Regex>,
) -> Vec<Row> {
    let mut rows = Vec::new();
    for group in build_groups(templates, expanded) {
        if only_group.is_some_and(|g| g != group.key) {
            continue;
        }
        let shown: Vec<&TaskTemplate> = group
            .templates
            .iter()
            .copied()
            .filter(|t| title_filter.is_none_or(|re| re.is_match(&t.title)))
            .collect();
        if shown.is_empty() && title_filter.is_some() {
            continue;
        }
        rows.push(Row::Group {
            key: group.key.clone(),
            count: group.templates.len(),
            inactive: group.templates.len() - group.active_count(),
            expanded: group.expanded,
        });
        if group.expanded {
            rows.extend(shown.into_iter().map(|t| Row::Template {
                id: t.id.clone().unwrap_or_default(),
                group: group.key.clone(),
            }));
        }
    }
    rows
}

pub fn task_rows(tasks: &[Task], title_filter: Option<&Regex>) -> Vec<Row> {
    tasks
        .iter()
        .filter(|t| title_filter.is_none_or(|re| re.is_match(&t.title)))
        .map(|t| Row::Task {
            id: t.id.clone().unwrap_or_default(),
        })
        .collect()
}

/// The record behind the open form
#[derive(Debug, Clone)]
pub enum FormBuffer {
    Template(EditBuffer<TaskTemplate>),
    Task(EditBuffer<Task>),
}

impl FormBuffer {
    pub fn kind(&self) -> &'static str {
        match self {
            FormBuffer::Template(_) => "template",
            FormBuffer::Task(_) => "task",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            FormBuffer::Template(_) => TaskTemplate::FIELDS,
            FormBuffer::Task(_) => Task::FIELDS,
        }
    }

    pub fn is_required(&self, field: &str) -> bool {
        match self {
            FormBuffer::Template(_) => TaskTemplate::REQUIRED.contains(&field),
            FormBuffer::Task(_) => Task::REQUIRED.contains(&field),
        }
    }

    pub fn is_new(&self) -> bool {
        match self {
            FormBuffer::Template(b) => b.is_new(),
            FormBuffer::Task(b) => b.is_new(),
        }
    }

    pub fn get(&self, field: &str) -> String {
        match self {
            FormBuffer::Template(b) => b.get(field),
            FormBuffer::Task(b) => b.get(field),
        }
    }

    pub fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match self {
            FormBuffer::Template(b) => b.set(field, value),
            FormBuffer::Task(b) => b.set(field, value),
        }
    }

    pub fn selection(&self) -> &AssigneeSelection {
        match self {
            FormBuffer::Template(b) => b.selection(),
            FormBuffer::Task(b) => b.selection(),
        }
    }

    pub fn selection_mut(&mut self) -> &mut AssigneeSelection {
        match self {
            FormBuffer::Template(b) => b.selection_mut(),
            FormBuffer::Task(b) => b.selection_mut(),
        }
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        match self {
            FormBuffer::Template(b) => b.missing_required(),
            FormBuffer::Task(b) => b.missing_required(),
        }
    }
}

/// Modal edit form. Focus walks the scalar fields, then each selected
/// assignee, then a final "add assignee" slot.
#[derive(Debug, Clone)]
pub struct FormState {
    pub buffer: FormBuffer,
    pub focus: usize,
    /// Text being typed into the focused field
    pub editing: Option<String>,
    pub error: Option<String>,
}

/// What the focused form line is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSlot {
    Field(&'static str),
    Assignee(usize),
    AddAssignee,
}

impl FormState {
    pub fn new(buffer: FormBuffer) -> Self {
        FormState {
            buffer,
            focus: 0,
            editing: None,
            error: None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.buffer.fields().len() + self.buffer.selection().len() + 1
    }

    pub fn slot(&self) -> FormSlot {
        let fields = self.buffer.fields();
        let assignees = self.buffer.selection().len();
        if self.focus < fields.len() {
            FormSlot::Field(fields[self.focus])
        } else if self.focus < fields.len() + assignees {
            FormSlot::Assignee(self.focus - fields.len())
        } else {
            FormSlot::AddAssignee
        }
    }

    pub fn clamp_focus(&mut self) {
        self.focus = self.focus.min(self.slot_count() - 1);
    }
}

/// Why the picker is open
#[derive(Debug, Clone, PartialEq)]
pub enum PickerPurpose {
    /// Add to the open form's assignees
    FormAssignee,
    /// Choose the client a whole group is copied to
    CopyTarget { group: String },
}

#[derive(Debug, Clone)]
pub struct PickerState {
    pub purpose: PickerPurpose,
    pub query: String,
    pub debounce: SearchDebounce,
    pub results: Vec<Assignee>,
    pub cursor: usize,
}

impl PickerState {
    pub fn new(purpose: PickerPurpose, delay: Duration) -> Self {
        PickerState {
            purpose,
            query: String::new(),
            debounce: SearchDebounce::new(delay),
            results: Vec::new(),
            cursor: 0,
        }
    }

    pub fn selected(&self) -> Option<&Assignee> {
        self.results.get(self.cursor)
    }
}

/// Completion prompt: the flow plus the raw text of each input
#[derive(Debug, Default)]
pub struct CompletionPrompt {
    pub flow: CompletionFlow,
    pub hours: String,
    pub minutes: String,
    pub notes: String,
    /// 0 = hours, 1 = minutes, 2 = notes
    pub focus: usize,
}

impl CompletionPrompt {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.hours,
            1 => &mut self.minutes,
            _ => &mut self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Confirm {
    DeleteTemplate { id: String, title: String },
    DeleteTask { id: String, title: String },
    DeleteGroup { key: String, count: usize },
}

impl Confirm {
    pub fn prompt(&self) -> String {
        match self {
            Confirm::DeleteTemplate { title, .. } => format!("Delete template '{}'?", title),
            Confirm::DeleteTask { title, .. } => format!("Delete task '{}'?", title),
            Confirm::DeleteGroup { key, count } => {
                format!("Delete all {} templates in '{}'?", count, key)
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Confirm::DeleteTemplate { id, .. } => Action::DeleteTemplate(id.clone()),
            Confirm::DeleteTask { id, .. } => Action::DeleteTask(id.clone()),
            Confirm::DeleteGroup { key, .. } => Action::DeleteGroup(key.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
    /// HTTP 403; shown apart from other failures
    Denied,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// Server work requested by a key press, started by the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// First fetch when the board opens; only failures are shown
    Load,
    Refresh,
    SetTaskFilter(TaskFilter),
    SubmitForm,
    ToggleActive(String),
    Duplicate(String),
    DeleteTemplate(String),
    DeleteTask(String),
    DeleteGroup(String),
    CopyGroup { group: String, target: Assignee },
    Search(String),
    ConfirmCompletion,
}

/// A mutating request with everything it needs, ready to leave the UI thread
enum Job {
    Load { announce: bool },
    SetTaskFilter(TaskFilter),
    Submit(FormBuffer),
    ToggleActive(String),
    Duplicate(String),
    DeleteTemplate(String),
    DeleteTask(String),
    DeleteGroup(String),
    CopyGroup { group: String, target: Assignee },
    Complete {
        task_id: String,
        input: CompletionInput,
        date: NaiveDate,
    },
}

impl Job {
    /// Run against copies of the mirrors and hand them back with the result
    async fn run(
        self,
        mut templates: Synchronizer<TemplateResource>,
        mut tasks: Synchronizer<TaskResource>,
        client: RestClient,
    ) -> Outcome {
        let report = match self {
            Job::Load { announce } => {
                let loaded_templates = templates.refresh().await.map(|_| ());
                let loaded_tasks = tasks.refresh().await.map(|_| ());
                Report::Loaded {
                    templates: loaded_templates,
                    tasks: loaded_tasks,
                    announce,
                }
            }
            Job::SetTaskFilter(filter) => {
                tasks = Synchronizer::new(TaskResource::new(client.clone(), filter));
                let result = tasks.refresh().await.map(|_| ());
                Report::FilterChanged { filter, result }
            }
            Job::Submit(buffer) => Report::Saved(match &buffer {
                FormBuffer::Template(b) => b.submit(&mut templates).await.map(|t| t.title),
                FormBuffer::Task(b) => b.submit(&mut tasks).await.map(|t| t.title),
            }),
            Job::ToggleActive(id) => Report::Toggled(templates.toggle_active(&id).await),
            Job::Duplicate(id) => Report::Duplicated(templates.duplicate(&id).await),
            Job::DeleteTemplate(id) => Report::Deleted {
                kind: "template",
                result: templates.delete(&id).await,
            },
            Job::DeleteTask(id) => Report::Deleted {
                kind: "task",
                result: tasks.delete(&id).await,
            },
            Job::DeleteGroup(key) => {
                Report::GroupDeleted(bulk::delete_group(&mut templates, &key).await)
            }
            Job::CopyGroup { group, target } => Report::GroupCopied {
                report: bulk::copy_group(&mut templates, &group, &target).await,
                target_key: client_key(&target).into_owned(),
            },
            Job::Complete {
                task_id,
                input,
                date,
            } => {
                let result =
                    completion::complete_task(&mut tasks, &client, &task_id, &input, date).await;
                Report::Completed { task_id, result }
            }
        };
        Outcome::Synced {
            templates,
            tasks,
            report,
        }
    }
}

/// What a finished mutating request has to say
pub enum Report {
    Loaded {
        templates: Result<(), SyncError>,
        tasks: Result<(), SyncError>,
        announce: bool,
    },
    FilterChanged {
        filter: TaskFilter,
        result: Result<(), SyncError>,
    },
    Saved(Result<String, SubmitError>),
    Toggled(Result<TaskTemplate, SyncError>),
    Duplicated(Result<TaskTemplate, SyncError>),
    Deleted {
        kind: &'static str,
        result: Result<(), SyncError>,
    },
    GroupDeleted(BatchReport<()>),
    GroupCopied {
        report: BatchReport<TaskTemplate>,
        target_key: String,
    },
    Completed {
        task_id: String,
        result: Result<CompletionReceipt, CompletionError>,
    },
}

/// A request that finished on the runtime, waiting for the event loop
pub enum Outcome {
    /// A mutating request, with the mirrors it worked on
    Synced {
        templates: Synchronizer<TemplateResource>,
        tasks: Synchronizer<TaskResource>,
        report: Report,
    },
    Search {
        query: String,
        result: ApiResult<Vec<Assignee>>,
    },
}

/// Board state
pub struct App {
    pub config: Config,
    pub theme: Theme,
    pub client: RestClient,
    pub templates: Synchronizer<TemplateResource>,
    pub tasks: Synchronizer<TaskResource>,
    pub task_filter: TaskFilter,
    pub ui: UiState,
    pub state_dir: PathBuf,
    pub view: View,
    pub mode: Mode,
    pub cursor: usize,
    pub scroll: usize,
    pub filter_input: String,
    pub title_filter: Option<Regex>,
    pub form: Option<FormState>,
    pub picker: Option<PickerState>,
    pub completion: Option<CompletionPrompt>,
    pub confirm: Option<Confirm>,
    pub toast: Option<Toast>,
    pub pending: Vec<Action>,
    pub show_help: bool,
    pub should_quit: bool,
    /// A mutating request is out; further ones wait in `pending`
    busy: bool,
    /// Requests spawned and not yet drained, searches included
    in_flight: usize,
    outbox: UnboundedSender<Outcome>,
    inbox: UnboundedReceiver<Outcome>,
}

impl App {
    pub fn new(config: Config, client: RestClient, state_dir: PathBuf, ui: UiState) -> Self {
        let task_filter = ui
            .task_filter
            .as_deref()
            .and_then(TaskFilter::parse)
            .unwrap_or_default();
        let title_filter = ui.last_search.as_deref().and_then(|p| compile_filter(p).ok());
        let (outbox, inbox) = unbounded_channel();
        App {
            theme: Theme::from_config(&config.ui),
            templates: Synchronizer::new(TemplateResource::new(client.clone())),
            tasks: Synchronizer::new(TaskResource::new(client.clone(), task_filter)),
            task_filter,
            view: View::from_saved(&ui.view),
            filter_input: ui.last_search.clone().unwrap_or_default(),
            title_filter,
            config,
            client,
            ui,
            state_dir,
            mode: Mode::Navigate,
            cursor: 0,
            scroll: 0,
            form: None,
            picker: None,
            completion: None,
            confirm: None,
            toast: None,
            pending: Vec::new(),
            show_help: false,
            should_quit: false,
            busy: false,
            in_flight: 0,
            outbox,
            inbox,
        }
    }

    /// Rows of the current view
    pub fn rows(&mut self) -> Vec<Row> {
        match self.view {
            View::Templates => build_rows(
                self.templates.records(),
                &mut self.ui.expanded,
                self.ui.client_filter.as_deref(),
                self.title_filter.as_ref(),
            ),
            View::Tasks => task_rows(self.tasks.records(), self.title_filter.as_ref()),
        }
    }

    pub fn current_row(&mut self) -> Option<Row> {
        let cursor = self.cursor;
        self.rows().into_iter().nth(cursor)
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn template(&self, id: &str) -> Option<&TaskTemplate> {
        self.templates.find(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.find(id)
    }

    /// Whether any request is still out
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.config.search.debounce_ms)
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.set_toast(text.into(), ToastKind::Info);
    }

    pub fn notify_error(&mut self, text: impl Into<String>, denied: bool) {
        let kind = if denied {
            ToastKind::Denied
        } else {
            ToastKind::Error
        };
        self.set_toast(text.into(), kind);
    }

    fn set_toast(&mut self, text: String, kind: ToastKind) {
        self.toast = Some(Toast {
            text,
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Apply a title filter pattern; an empty pattern clears it
    pub fn apply_filter(&mut self, pattern: &str) -> Result<(), regex::Error> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            self.title_filter = None;
            self.ui.last_search = None;
        } else {
            self.title_filter = Some(compile_filter(pattern)?);
            self.ui.last_search = Some(pattern.to_string());
        }
        self.cursor = 0;
        Ok(())
    }

    /// Timers: expire the toast, fire a settled picker search
    pub fn tick(&mut self, now: Instant) {
        if let Some(toast) = &self.toast
            && now.duration_since(toast.shown_at) >= TOAST_TTL
        {
            self.toast = None;
        }
        let gate = SearchGate::new(self.config.search.min_query_len);
        if let Some(picker) = &mut self.picker
            && let Some(query) = picker.debounce.poll(now)
        {
            if gate.admits(&query) {
                self.pending.push(Action::Search(query));
            } else {
                picker.results.clear();
                picker.cursor = 0;
            }
        }
    }

    fn sync_ui_state(&mut self) {
        self.ui.view = self.view.as_str().to_string();
        self.ui.task_filter = Some(task_filter_name(self.task_filter).to_string());
    }

    // -----------------------------------------------------------------------
    // Server actions
    // -----------------------------------------------------------------------

    /// Start queued actions on the runtime. Mutating requests go one at a
    /// time in queue order; searches run alongside them.
    pub fn dispatch(&mut self, runtime: &Handle) {
        let mut held = Vec::new();
        for action in std::mem::take(&mut self.pending) {
            match action {
                Action::Search(query) => self.start_search(runtime, query),
                action if self.busy => held.push(action),
                action => {
                    if let Some(job) = self.prepare(action) {
                        self.busy = true;
                        let templates = self.templates.clone();
                        let tasks = self.tasks.clone();
                        let client = self.client.clone();
                        self.spawn(runtime, job.run(templates, tasks, client));
                    }
                }
            }
        }
        self.pending = held;
    }

    /// Apply every request that has finished since the last call
    pub fn drain(&mut self) {
        while let Ok(outcome) = self.inbox.try_recv() {
            self.apply(outcome);
        }
    }

    fn spawn<F>(&mut self, runtime: &Handle, work: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.in_flight += 1;
        let outbox = self.outbox.clone();
        runtime.spawn(async move {
            if outbox.send(work.await).is_err() {
                tracing::debug!("board closed before a request finished");
            }
        });
    }

    fn start_search(&mut self, runtime: &Handle, query: String) {
        let gate = SearchGate::new(self.config.search.min_query_len);
        let client = self.client.clone();
        self.spawn(runtime, async move {
            let result = assignees::search_assignees(&client, &query, gate).await;
            Outcome::Search { query, result }
        });
    }

    fn prepare(&mut self, action: Action) -> Option<Job> {
        tracing::debug!(?action, "board action");
        let job = match action {
            Action::Load => Job::Load { announce: false },
            Action::Refresh => Job::Load { announce: true },
            Action::SetTaskFilter(filter) => Job::SetTaskFilter(filter),
            Action::SubmitForm => Job::Submit(self.form.as_ref()?.buffer.clone()),
            Action::ToggleActive(id) => Job::ToggleActive(id),
            Action::Duplicate(id) => Job::Duplicate(id),
            Action::DeleteTemplate(id) => Job::DeleteTemplate(id),
            Action::DeleteTask(id) => Job::DeleteTask(id),
            Action::DeleteGroup(key) => Job::DeleteGroup(key),
            Action::CopyGroup { group, target } => Job::CopyGroup { group, target },
            Action::ConfirmCompletion => return self.prepare_completion(),
            // Started directly by `dispatch`
            Action::Search(_) => return None,
        };
        Some(job)
    }

    fn prepare_completion(&mut self) -> Option<Job> {
        let prompt = self.completion.as_ref()?;
        let parsed = match (
            parse_number::<f64>(&prompt.hours),
            parse_number::<u32>(&prompt.minutes),
        ) {
            (Ok(hours), Ok(minutes)) => Ok((hours, minutes)),
            (Err(()), _) => Err("hours must be a number"),
            (_, Err(())) => Err("minutes must be a whole number"),
        };
        let (hours, minutes) = match parsed {
            Ok(parsed) => parsed,
            Err(message) => {
                self.notify_error(message, false);
                return None;
            }
        };
        let completed_by = self.config.session.user_id.clone();
        let prompt = self.completion.as_mut()?;
        if let Some(input) = prompt.flow.input_mut() {
            input.hours = hours;
            input.minutes = minutes;
            input.notes = prompt.notes.trim().to_string();
            input.completed_by = completed_by;
        }
        match prompt.flow.request() {
            Ok((task_id, input)) => Some(Job::Complete {
                task_id,
                input,
                date: Local::now().date_naive(),
            }),
            Err(e) => {
                self.notify_error(e.to_string(), false);
                None
            }
        }
    }

    /// Fold a finished request into the board
    pub fn apply(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            Outcome::Search { query, result } => self.show_search(&query, result),
            Outcome::Synced {
                templates,
                tasks,
                report,
            } => {
                self.busy = false;
                self.templates = templates;
                self.tasks = tasks;
                self.show_report(report);
            }
        }
        self.clamp_cursor();
    }

    fn show_report(&mut self, report: Report) {
        match report {
            Report::Loaded {
                templates,
                tasks,
                announce,
            } => {
                if let Err(e) = &templates {
                    let denied = e.is_permission_denied();
                    self.notify_error(format!("could not load templates: {}", e), denied);
                }
                if let Err(e) = &tasks {
                    let denied = e.is_permission_denied();
                    self.notify_error(format!("could not load tasks: {}", e), denied);
                }
                if announce && templates.is_ok() && tasks.is_ok() {
                    self.notify("reloaded");
                }
            }
            Report::FilterChanged { filter, result } => {
                self.task_filter = filter;
                self.cursor = 0;
                match result {
                    Ok(()) => self.notify(format!("tasks: {}", task_filter_name(filter))),
                    Err(e) => self.report_sync("load tasks", &e),
                }
            }
            Report::Saved(result) => self.show_saved(result),
            Report::Toggled(Ok(sent)) => {
                let state = if sent.is_active { "active" } else { "inactive" };
                self.notify(format!("{} is now {}", sent.title, state));
            }
            Report::Toggled(Err(e)) => self.report_sync("toggle", &e),
            Report::Duplicated(Ok(copy)) => self.notify(format!("duplicated {}", copy.title)),
            Report::Duplicated(Err(e)) => self.report_sync("duplicate", &e),
            Report::Deleted { kind, result } => match result {
                Ok(()) => self.notify(format!("{} deleted", kind)),
                Err(e) => self.report_sync("delete", &e),
            },
            Report::GroupDeleted(report) => self.report_batch("deleted", &report),
            Report::GroupCopied { report, target_key } => {
                self.report_batch("copied", &report);
                self.ui.expanded.set(&target_key, true);
            }
            Report::Completed { task_id, result } => self.show_completion(&task_id, result),
        }
    }

    fn show_saved(&mut self, result: Result<String, SubmitError>) {
        match result {
            Ok(title) => {
                self.notify(format!("saved {}", title));
                self.form = None;
                if self.mode == Mode::Form {
                    self.mode = Mode::Navigate;
                }
            }
            Err(e) => {
                if let Some(form) = &mut self.form {
                    form.error = Some(e.to_string());
                }
                if !matches!(e, SubmitError::Invalid(_)) {
                    self.notify_error(format!("save failed: {}", e), e.is_permission_denied());
                }
            }
        }
    }

    fn show_search(&mut self, query: &str, result: ApiResult<Vec<Assignee>>) {
        let Some(picker) = &mut self.picker else {
            return;
        };
        if !picker.debounce.accepts(query) {
            tracing::debug!(query = %query, "dropping stale search response");
            return;
        }
        match result {
            Ok(mut hits) => {
                if matches!(picker.purpose, PickerPurpose::CopyTarget { .. }) {
                    hits.retain(Assignee::is_client);
                }
                picker.results = hits;
                picker.cursor = 0;
            }
            Err(e) => {
                let denied = e.is_permission_denied();
                self.notify_error(format!("search failed: {}", e), denied);
            }
        }
    }

    fn show_completion(
        &mut self,
        task_id: &str,
        result: Result<CompletionReceipt, CompletionError>,
    ) {
        // The prompt may have been closed, or reopened for another task
        let same_task = self
            .completion
            .as_ref()
            .is_some_and(|p| p.flow.task_id() == Some(task_id));
        let mut prompt = if same_task {
            self.completion.take()
        } else {
            None
        };
        if let Some(prompt) = &mut prompt {
            prompt.flow.settle(task_id, &result);
        }
        match result {
            Ok(receipt) => {
                self.notify(format!("completed {} ({})", receipt.task.title, receipt.spent));
                prompt = None;
            }
            Err(e) => {
                self.notify_error(e.to_string(), e.is_permission_denied());
                prompt = prompt.filter(|p| p.flow.is_capturing());
            }
        }
        if prompt.is_some() {
            self.completion = prompt;
        } else if self.mode == Mode::Complete && self.completion.is_none() {
            self.mode = Mode::Navigate;
        }
    }

    fn report_sync(&mut self, action: &str, err: &SyncError) {
        self.notify_error(format!("{} failed: {}", action, err), err.is_permission_denied());
    }

    fn report_batch<T>(&mut self, past_tense: &str, report: &BatchReport<T>) {
        let mut text = format!(
            "{} of {} {}",
            report.success_count(),
            report.len(),
            past_tense
        );
        if report.all_succeeded() {
            if let Some(e) = &report.refresh_error {
                text.push_str(&format!("; reload failed: {}", e));
                self.notify_error(text, false);
            } else {
                self.notify(text);
            }
            return;
        }
        text.push_str(&format!(", {} failed", report.failure_count()));
        if let Some((label, e)) = report.failures().next() {
            text.push_str(&format!(" ({}: {})", label, e));
        }
        self.notify_error(text, report.any_permission_denied());
    }
}

fn compile_filter(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn parse_number<T: std::str::FromStr + Default>(text: &str) -> Result<T, ()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(T::default());
    }
    text.parse().map_err(|_| ())
}

pub fn task_filter_name(filter: TaskFilter) -> &'static str {
    match filter {
        TaskFilter::Open => "open",
        TaskFilter::Priority => "priority",
        TaskFilter::Completed => "completed",
    }
}

fn save_ui_state(app: &mut App) {
    app.sync_ui_state();
    if let Err(e) = state::write_ui_state(&app.state_dir, &app.ui) {
        tracing::warn!(error = %e, "could not save ui state");
    }
}

/// Run the board against the config at `config_path`
pub fn run(config_path: &Path, rt: &tokio::runtime::Runtime) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_io::load_config(config_path)?;
    let client = RestClient::from_config(&config)?;
    let state_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let ui = state::read_ui_state(&state_dir).unwrap_or_default();

    let mut app = App::new(config, client, state_dir, ui);
    app.pending.push(Action::Load);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, rt.handle());

    save_ui_state(&mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    runtime: &Handle,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        // Short poll while the picker settles or a request is out
        let timeout = if app.picker.is_some() || app.is_busy() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(250)
        };
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
            // Debounced state save: every ~5 key presses
            save_counter += 1;
            if save_counter >= 5 {
                save_ui_state(app);
                save_counter = 0;
            }
        }

        app.tick(Instant::now());
        app.dispatch(runtime);
        app.drain();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
