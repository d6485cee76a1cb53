use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use regex::RegexBuilder;
use serde::Serialize;

use crate::api::{Directory, RestClient, TaskResource, TemplateResource};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::state::{self, UiState};
use crate::model::{Assignee, Config, TaskFilter, TaskTemplate};
use crate::ops::assignees::{self, SearchGate};
use crate::ops::bulk::{self, BatchReport};
use crate::ops::completion::{self, CompletionInput};
use crate::ops::form::{EditBuffer, Editable};
use crate::ops::grouping::{self, build_groups};
use crate::ops::schedule;
use crate::ops::sync::{SyncError, Synchronizer};

type CmdResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(command: Commands, config_path: &Path, json: bool) -> CmdResult {
    match command {
        // Config commands work without a reachable server
        Commands::Config(cmd) => cmd_config(cmd.action, config_path, json),

        Commands::Templates(cmd) => {
            let session = Session::open(config_path)?;
            cmd_templates(cmd.action, &session, json).await
        }
        Commands::Groups(cmd) => {
            let session = Session::open(config_path)?;
            cmd_groups(cmd.action, &session, json).await
        }
        Commands::Tasks(cmd) => {
            let session = Session::open(config_path)?;
            let filter = TaskFilter::parse(&cmd.filter).ok_or_else(|| {
                format!(
                    "unknown filter '{}' (expected: open, priority, completed)",
                    cmd.filter
                )
            })?;
            cmd_tasks(cmd.action, filter, &session, json).await
        }
        Commands::Assignees(args) => {
            let session = Session::open(config_path)?;
            cmd_assignees(args, &session, json).await
        }
        Commands::Employees(args) => {
            let session = Session::open(config_path)?;
            cmd_employees(args, &session, json).await
        }
        Commands::Schedule(args) => {
            let session = Session::open(config_path)?;
            cmd_schedule(args, &session, json).await
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loaded config plus a client for it
pub struct Session {
    pub config: Config,
    pub client: RestClient,
    pub state_dir: PathBuf,
}

impl Session {
    pub fn open(config_path: &Path) -> Result<Self, Box<dyn Error>> {
        let config = config_io::load_config(config_path)?;
        let client = RestClient::from_config(&config)?;
        let state_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!(base_url = client.base_url(), "session opened");
        Ok(Session {
            config,
            client,
            state_dir,
        })
    }

    pub async fn templates(&self) -> Result<Synchronizer<TemplateResource>, SyncError> {
        let mut sync = Synchronizer::new(TemplateResource::new(self.client.clone()));
        sync.refresh().await?;
        Ok(sync)
    }

    pub async fn tasks(&self, filter: TaskFilter) -> Result<Synchronizer<TaskResource>, SyncError> {
        let mut sync = Synchronizer::new(TaskResource::new(self.client.clone(), filter));
        sync.refresh().await?;
        Ok(sync)
    }

    fn ui_state(&self) -> UiState {
        state::read_ui_state(&self.state_dir).unwrap_or_default()
    }

    fn save_ui_state(&self, ui: &UiState) {
        if let Err(e) = state::write_ui_state(&self.state_dir, ui) {
            tracing::warn!(error = %e, "could not save ui state");
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
    match value {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s).into()),
    }
}

/// Apply command-line field edits and assignee changes to a form buffer
fn apply_edits<T: Editable>(
    buffer: &mut EditBuffer<T>,
    edits: &[(&'static str, &str)],
    add: &[Assignee],
    remove: &[String],
) -> CmdResult {
    for (field, value) in edits {
        buffer.set(field, value)?;
    }
    for id in remove {
        if !buffer.selection_mut().remove(id) {
            return Err(format!("no assignee with id '{}'", id).into());
        }
    }
    for assignee in add {
        if !buffer.selection_mut().select(assignee.clone()) {
            tracing::debug!(id = %assignee.id, "assignee already present");
        }
    }
    Ok(())
}

/// Print a batch report and fail when any item failed
fn finish_batch<T>(action: &str, past_tense: &str, report: &BatchReport<T>, json: bool) -> CmdResult {
    if json {
        print_json(&batch_to_json(action, report))?;
    } else {
        print_lines(&format_batch_report(past_tense, report));
    }
    if report.all_succeeded() {
        Ok(())
    } else {
        Err(format!("{} of {} items failed", report.failure_count(), report.len()).into())
    }
}

fn require_group(templates: &[TaskTemplate], name: &str) -> CmdResult {
    if grouping::group_templates(templates).contains_key(name) {
        Ok(())
    } else {
        Err(format!("group not found: {}", name).into())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(action: ConfigAction, path: &Path, json: bool) -> CmdResult {
    match action {
        ConfigAction::Init(args) => {
            config_io::init_config(path, args.force)?;
            println!("wrote {}", path.display());
        }
        ConfigAction::Show => {
            let mut config = config_io::load_config(path)?;
            if config.api.token.is_some() {
                config.api.token = Some("********".to_string());
            }
            if json {
                print_json(&config)?;
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Set(args) => {
            let (_, mut doc) = config_io::read_config(path)?;
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(path, &doc)?;
            tracing::debug!(key = %args.key, path = %path.display(), "config updated");
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

async fn cmd_templates(action: TemplatesAction, session: &Session, json: bool) -> CmdResult {
    let mut sync = session.templates().await?;

    match action {
        TemplatesAction::List(args) => {
            let pattern = args
                .pattern
                .as_deref()
                .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
                .transpose()?;
            let shown: Vec<&TaskTemplate> = sync
                .records()
                .iter()
                .filter(|t| {
                    args.client
                        .as_deref()
                        .is_none_or(|c| grouping::group_key(t).eq_ignore_ascii_case(c))
                })
                .filter(|t| !args.active_only || t.is_active)
                .filter(|t| pattern.as_ref().is_none_or(|re| re.is_match(&t.title)))
                .collect();
            if json {
                print_json(&shown)?;
            } else if shown.is_empty() {
                println!("no templates");
            } else {
                for t in shown {
                    println!("{}", format_template_line(t));
                }
            }
        }
        TemplatesAction::Show(args) => {
            let template = sync.get(&args.id)?;
            if json {
                print_json(template)?;
            } else {
                print_lines(&format_template_detail(template));
            }
        }
        TemplatesAction::Add(fields) => {
            let mut buffer = EditBuffer::create(session.config.session.new_template());
            apply_edits(&mut buffer, &fields.edits(), &fields.assignees, &[])?;
            let saved = buffer.submit(&mut sync).await?;
            if json {
                print_json(&saved)?;
            } else {
                println!("{}", saved.id.as_deref().unwrap_or("(created)"));
            }
        }
        TemplatesAction::Edit(args) => {
            let mut buffer = EditBuffer::edit(sync.get(&args.id)?);
            apply_edits(
                &mut buffer,
                &args.fields.edits(),
                &args.fields.assignees,
                &args.remove_assignees,
            )?;
            if !buffer.is_dirty() {
                println!("no changes");
                return Ok(());
            }
            let saved = buffer.submit(&mut sync).await?;
            if json {
                print_json(&saved)?;
            } else {
                println!("updated {}", args.id);
            }
        }
        TemplatesAction::Dup(args) => {
            let copy = sync.duplicate(&args.id).await?;
            if json {
                print_json(&copy)?;
            } else {
                println!("{}", copy.id.as_deref().unwrap_or("(duplicated)"));
            }
        }
        TemplatesAction::Rm(args) => {
            sync.delete(&args.id).await?;
            println!("deleted {}", args.id);
        }
        TemplatesAction::Toggle(args) => {
            let sent = sync.toggle_active(&args.id).await?;
            let active = sync.find(&args.id).map_or(sent.is_active, |t| t.is_active);
            println!(
                "{} {}",
                args.id,
                if active { "active" } else { "inactive" }
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

async fn cmd_groups(action: GroupsAction, session: &Session, json: bool) -> CmdResult {
    if let GroupsAction::Delete(args) = &action
        && !args.yes
    {
        return Err(format!(
            "refusing to delete every template in '{}' without --yes",
            args.name
        )
        .into());
    }
    let mut sync = session.templates().await?;
    let mut ui = session.ui_state();

    match action {
        GroupsAction::List(args) => {
            let groups = build_groups(sync.records(), &mut ui.expanded);
            if json {
                let out: Vec<GroupJson> = groups
                    .iter()
                    .map(|g| group_to_json(g, args.all || g.expanded))
                    .collect();
                print_json(&out)?;
            } else if groups.is_empty() {
                println!("no templates");
            } else {
                for group in &groups {
                    println!("{}", format_group_header(group));
                    if group.expanded || args.all {
                        for t in &group.templates {
                            println!("  {}", format_template_line(t));
                        }
                    }
                }
            }
            session.save_ui_state(&ui);
        }
        GroupsAction::Toggle(args) => {
            require_group(sync.records(), &args.name)?;
            let expanded = ui.expanded.toggle(&args.name);
            session.save_ui_state(&ui);
            println!(
                "{} {}",
                args.name,
                if expanded { "expanded" } else { "collapsed" }
            );
        }
        GroupsAction::Expand(args) => {
            require_group(sync.records(), &args.name)?;
            ui.expanded.set(&args.name, true);
            session.save_ui_state(&ui);
            println!("{} expanded", args.name);
        }
        GroupsAction::Collapse(args) => {
            require_group(sync.records(), &args.name)?;
            ui.expanded.set(&args.name, false);
            session.save_ui_state(&ui);
            println!("{} collapsed", args.name);
        }
        GroupsAction::Copy(args) => {
            if !args.to.is_client() {
                return Err("copy target must be a client (client:ID:NAME)".into());
            }
            require_group(sync.records(), &args.name)?;
            let report = bulk::copy_group(&mut sync, &args.name, &args.to).await;
            return finish_batch("copy", "copied", &report, json);
        }
        GroupsAction::Delete(args) => {
            require_group(sync.records(), &args.name)?;
            let report = bulk::delete_group(&mut sync, &args.name).await;
            return finish_batch("delete", "deleted", &report, json);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn cmd_tasks(
    action: TasksAction,
    filter: TaskFilter,
    session: &Session,
    json: bool,
) -> CmdResult {
    let mut sync = session.tasks(filter).await?;

    match action {
        TasksAction::List => {
            if json {
                print_json(sync.records())?;
            } else if sync.records().is_empty() {
                println!("no tasks");
            } else {
                let today = today();
                for task in sync.records() {
                    println!("{}", format_task_line(task, today));
                }
            }
        }
        TasksAction::Show(args) => {
            let task = sync.get(&args.id)?;
            if json {
                print_json(task)?;
            } else {
                print_lines(&format_task_detail(task));
            }
        }
        TasksAction::Add(fields) => {
            let mut buffer = EditBuffer::create(session.config.session.new_task());
            apply_edits(&mut buffer, &fields.edits(), &fields.assignees, &[])?;
            let saved = buffer.submit(&mut sync).await?;
            if json {
                print_json(&saved)?;
            } else {
                println!("{}", saved.id.as_deref().unwrap_or("(created)"));
            }
        }
        TasksAction::Edit(args) => {
            let mut buffer = EditBuffer::edit(sync.get(&args.id)?);
            apply_edits(
                &mut buffer,
                &args.fields.edits(),
                &args.fields.assignees,
                &args.remove_assignees,
            )?;
            if !buffer.is_dirty() {
                println!("no changes");
                return Ok(());
            }
            let saved = buffer.submit(&mut sync).await?;
            if json {
                print_json(&saved)?;
            } else {
                println!("updated {}", args.id);
            }
        }
        TasksAction::Rm(args) => {
            sync.delete(&args.id).await?;
            println!("deleted {}", args.id);
        }
        TasksAction::Complete(args) => {
            let date = parse_date(args.date.as_deref())?;
            let input = CompletionInput {
                hours: args.hours,
                minutes: args.minutes,
                notes: args.notes.unwrap_or_default(),
                completed_by: session.config.session.user_id.clone(),
            };
            let receipt =
                completion::complete_task(&mut sync, &session.client, &args.id, &input, date)
                    .await?;
            if json {
                print_json(&completion_to_json(&receipt))?;
            } else {
                println!("{}", format_completion(&receipt));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

async fn cmd_assignees(args: AssigneesArgs, session: &Session, json: bool) -> CmdResult {
    let gate = SearchGate::new(session.config.search.min_query_len);
    let hits = assignees::search_assignees(&session.client, &args.query, gate).await?;
    if json {
        print_json(&hits)?;
    } else {
        for a in &hits {
            println!("{}", format_assignee(a));
        }
    }
    Ok(())
}

async fn cmd_employees(args: EmployeesArgs, session: &Session, json: bool) -> CmdResult {
    let employees = session.client.list_employees().await?;
    let gate = SearchGate::new(session.config.search.employee_min_query_len);
    let shown = assignees::filter_employees(&employees, args.query.as_deref().unwrap_or(""), gate);
    if json {
        let out: Vec<EmployeeJson> = shown.into_iter().map(employee_to_json).collect();
        print_json(&out)?;
    } else {
        for e in shown {
            println!("{}", format_employee_line(e));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

async fn cmd_schedule(args: ScheduleArgs, session: &Session, json: bool) -> CmdResult {
    let date = parse_date(args.date.as_deref())?;
    let templates = session.templates().await?;
    let due = schedule::due_tasks(templates.records(), date);

    if !args.apply {
        if json {
            print_json(&due)?;
        } else if due.is_empty() {
            println!("nothing scheduled for {}", date);
        } else {
            for task in &due {
                println!(
                    "{}  {}  (template {})",
                    task.due_date,
                    task.title,
                    task.template_id.as_deref().unwrap_or("-")
                );
            }
        }
        return Ok(());
    }

    let mut tasks = Synchronizer::new(TaskResource::new(session.client.clone(), TaskFilter::Open));
    let report = tasks.create_batch(due).await;
    finish_batch("schedule", "created", &report, json)
}
