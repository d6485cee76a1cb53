use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Assignee;

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdesk v", env!("CARGO_PKG_VERSION"), " - recurring task templates and tasks for the team dashboard"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log more to stderr (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, show, or edit the config file
    Config(ConfigCmd),
    /// Manage task templates
    Templates(TemplatesCmd),
    /// Work with templates grouped by client
    Groups(GroupsCmd),
    /// Manage tasks
    Tasks(TasksCmd),
    /// Search employees and clients on the server
    Assignees(AssigneesArgs),
    /// List employees, optionally filtered by name or email
    Employees(EmployeesArgs),
    /// Preview (or create) the tasks templates produce on a date
    Schedule(ScheduleArgs),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a starter config file
    Init(ConfigInitArgs),
    /// Print the effective config (token hidden)
    Show,
    /// Set one key, keeping the rest of the file as written
    Set(ConfigSetArgs),
    /// Print the path of the config file in use
    Path,
}

#[derive(Args)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key, e.g. api.base_url or search.min_query_len
    pub key: String,
    /// New value (comma-separated for lists)
    pub value: String,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TemplatesCmd {
    #[command(subcommand)]
    pub action: TemplatesAction,
}

#[derive(Subcommand)]
pub enum TemplatesAction {
    /// List templates
    List(TemplateListArgs),
    /// Show one template
    Show(IdArg),
    /// Create a template
    Add(TemplateFields),
    /// Change fields or assignees of a template
    Edit(TemplateEditArgs),
    /// Duplicate a template
    Dup(IdArg),
    /// Delete a template
    Rm(IdArg),
    /// Switch a template between active and inactive
    Toggle(IdArg),
}

#[derive(Args)]
pub struct IdArg {
    /// Record id
    pub id: String,
}

#[derive(Args)]
pub struct TemplateListArgs {
    /// Only templates in this client group ("unassigned" for none)
    #[arg(long)]
    pub client: Option<String>,
    /// Hide inactive templates
    #[arg(long)]
    pub active_only: bool,
    /// Only titles matching this regex (case-insensitive)
    #[arg(long = "match", value_name = "REGEX")]
    pub pattern: Option<String>,
}

#[derive(Args, Default)]
pub struct TemplateFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub job_type: Option<String>,
    /// daily or weekly
    #[arg(long)]
    pub frequency: Option<String>,
    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,
    /// yes or no
    #[arg(long)]
    pub active: Option<String>,
    /// Comma-separated group names
    #[arg(long)]
    pub visible_to: Option<String>,
    /// Add an assignee as KIND:ID:NAME (repeatable)
    #[arg(long = "assignee", value_name = "KIND:ID:NAME")]
    pub assignees: Vec<Assignee>,
}

impl TemplateFields {
    /// Field edits in form order, skipping flags not given
    pub fn edits(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("job_type", &self.job_type),
            ("frequency", &self.frequency),
            ("priority", &self.priority),
            ("is_active", &self.active),
            ("visible_to", &self.visible_to),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[derive(Args)]
pub struct TemplateEditArgs {
    /// Template id
    pub id: String,
    #[command(flatten)]
    pub fields: TemplateFields,
    /// Remove the assignee with this id (repeatable)
    #[arg(long = "remove-assignee", value_name = "ID")]
    pub remove_assignees: Vec<String>,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct GroupsCmd {
    #[command(subcommand)]
    pub action: GroupsAction,
}

#[derive(Subcommand)]
pub enum GroupsAction {
    /// List client groups; expanded groups show their templates
    List(GroupsListArgs),
    /// Flip a group between expanded and collapsed
    Toggle(GroupNameArg),
    /// Expand a group
    Expand(GroupNameArg),
    /// Collapse a group
    Collapse(GroupNameArg),
    /// Copy every template in a group to another client
    Copy(GroupCopyArgs),
    /// Delete every template in a group
    Delete(GroupDeleteArgs),
}

#[derive(Args)]
pub struct GroupsListArgs {
    /// Show templates of collapsed groups too
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct GroupNameArg {
    /// Group name (client name, or "unassigned")
    pub name: String,
}

#[derive(Args)]
pub struct GroupCopyArgs {
    /// Source group name
    pub name: String,
    /// Target client as client:ID:NAME
    #[arg(long, value_name = "KIND:ID:NAME")]
    pub to: Assignee,
}

#[derive(Args)]
pub struct GroupDeleteArgs {
    /// Group name
    pub name: String,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TasksCmd {
    #[command(subcommand)]
    pub action: TasksAction,
    /// Server-side list filter: open, priority or completed
    #[arg(long, global = true, default_value = "open")]
    pub filter: String,
}

#[derive(Subcommand)]
pub enum TasksAction {
    /// List tasks
    List,
    /// Show one task
    Show(IdArg),
    /// Create a task
    Add(TaskFields),
    /// Change fields or assignees of a task
    Edit(TaskEditArgs),
    /// Delete a task
    Rm(IdArg),
    /// Record time for a task and mark it complete
    Complete(CompleteArgs),
}

#[derive(Args, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub job_type: Option<String>,
    /// YYYY-MM-DD
    #[arg(long = "due")]
    pub due_date: Option<String>,
    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,
    /// active, complete or hold
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub estimated_hours: Option<String>,
    /// Comma-separated group names
    #[arg(long)]
    pub visible_to: Option<String>,
    /// Add an assignee as KIND:ID:NAME (repeatable)
    #[arg(long = "assignee", value_name = "KIND:ID:NAME")]
    pub assignees: Vec<Assignee>,
}

impl TaskFields {
    pub fn edits(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("job_type", &self.job_type),
            ("due_date", &self.due_date),
            ("priority", &self.priority),
            ("status", &self.status),
            ("estimated_hours", &self.estimated_hours),
            ("visible_to", &self.visible_to),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[derive(Args)]
pub struct TaskEditArgs {
    /// Task id
    pub id: String,
    #[command(flatten)]
    pub fields: TaskFields,
    /// Remove the assignee with this id (repeatable)
    #[arg(long = "remove-assignee", value_name = "ID")]
    pub remove_assignees: Vec<String>,
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Task id
    pub id: String,
    /// Hours spent, decimals allowed (1.5 = 1h 30m)
    #[arg(long)]
    pub hours: f64,
    /// Extra minutes on top of --hours
    #[arg(long, default_value_t = 0)]
    pub minutes: u32,
    /// Completion notes (also used as the time entry description)
    #[arg(long)]
    pub notes: Option<String>,
    /// Date of the time entry, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Directory and scheduling
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AssigneesArgs {
    /// Partial name; shorter than search.min_query_len returns nothing
    pub query: String,
}

#[derive(Args)]
pub struct EmployeesArgs {
    /// Filter on first name, last name or email
    pub query: Option<String>,
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Date to schedule for, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Create the tasks instead of only listing them
    #[arg(long)]
    pub apply: bool,
}
