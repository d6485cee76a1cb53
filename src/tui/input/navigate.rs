use crossterm::event::{KeyCode, KeyEvent};

use crate::model::{TaskFilter, TaskTemplate};
use crate::ops::form::EditBuffer;
use crate::ops::grouping::{UNASSIGNED, client_key};
use crate::tui::app::{
    Action, App, CompletionPrompt, Confirm, FormBuffer, FormState, Mode, PickerPurpose,
    PickerState, Row, View,
};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, 1),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, -1),
        KeyCode::Home | KeyCode::Char('g') => app.cursor = 0,
        KeyCode::End | KeyCode::Char('G') => {
            app.cursor = app.rows().len().saturating_sub(1);
        }
        KeyCode::Tab => switch_view(app),
        KeyCode::Char('r') => app.pending.push(Action::Refresh),
        KeyCode::Char('/') => app.mode = Mode::Filter,
        KeyCode::Esc => clear_filters(app),
        KeyCode::Char('n') => open_new(app),
        KeyCode::Enter | KeyCode::Char(' ') => activate(app),
        KeyCode::Char('e') => open_edit(app),
        KeyCode::Char('d') => confirm_delete(app),
        _ => match app.view {
            View::Templates => handle_template_key(app, key),
            View::Tasks => handle_task_key(app, key),
        },
    }
}

fn handle_template_key(app: &mut App, key: KeyEvent) {
    let row = app.current_row();
    match key.code {
        KeyCode::Char('t') => {
            if let Some(Row::Template { id, .. }) = row {
                app.pending.push(Action::ToggleActive(id));
            }
        }
        KeyCode::Char('y') => {
            if let Some(Row::Template { id, .. }) = row {
                app.pending.push(Action::Duplicate(id));
            }
        }
        KeyCode::Char('c') => {
            if let Some(group) = row.as_ref().and_then(Row::group_key) {
                let purpose = PickerPurpose::CopyTarget {
                    group: group.to_string(),
                };
                app.picker = Some(PickerState::new(purpose, app.search_delay()));
                app.mode = Mode::Picker;
            }
        }
        KeyCode::Char('E') => app.ui.expanded.set_all(true),
        KeyCode::Char('C') => {
            app.ui.expanded.set_all(false);
            app.cursor = 0;
        }
        // Show only the group under the cursor, or everything again
        KeyCode::Char('o') => {
            if app.ui.client_filter.is_some() {
                app.ui.client_filter = None;
            } else if let Some(group) = row.as_ref().and_then(Row::group_key) {
                app.ui.client_filter = Some(group.to_string());
            }
            app.cursor = 0;
        }
        _ => {}
    }
}

fn handle_task_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') => begin_completion(app),
        KeyCode::Char('f') => {
            let next = match app.task_filter {
                TaskFilter::Open => TaskFilter::Priority,
                TaskFilter::Priority => TaskFilter::Completed,
                TaskFilter::Completed => TaskFilter::Open,
            };
            app.pending.push(Action::SetTaskFilter(next));
        }
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.rows().len();
    if len == 0 {
        app.cursor = 0;
        return;
    }
    app.cursor = app.cursor.saturating_add_signed(delta).min(len - 1);
}

fn switch_view(app: &mut App) {
    app.view = match app.view {
        View::Templates => View::Tasks,
        View::Tasks => View::Templates,
    };
    app.cursor = 0;
    app.scroll = 0;
}

fn clear_filters(app: &mut App) {
    if app.apply_filter("").is_ok() {
        app.filter_input.clear();
    }
    app.ui.client_filter = None;
}

fn activate(app: &mut App) {
    match app.current_row() {
        Some(Row::Group { key, .. }) => {
            app.ui.expanded.toggle(&key);
        }
        Some(_) => open_edit(app),
        None => {}
    }
}

fn open_form(app: &mut App, buffer: FormBuffer) {
    app.form = Some(FormState::new(buffer));
    app.mode = Mode::Form;
}

fn open_new(app: &mut App) {
    let session = &app.config.session;
    let buffer = match app.view {
        View::Templates => {
            let mut draft = session.new_template();
            // New templates start in the group under the cursor
            if let Some(row) = app.current_row()
                && let Some(group) = row.group_key()
                && group != UNASSIGNED
                && let Some(client) = app
                    .templates
                    .records()
                    .iter()
                    .filter_map(TaskTemplate::anchor_client)
                    .find(|c| client_key(c) == group)
            {
                draft.assignees.push(client.clone());
            }
            FormBuffer::Template(EditBuffer::create(draft))
        }
        View::Tasks => FormBuffer::Task(EditBuffer::create(session.new_task())),
    };
    open_form(app, buffer);
}

fn open_edit(app: &mut App) {
    let buffer = match app.current_row() {
        Some(Row::Template { id, .. }) => app
            .template(&id)
            .map(|t| FormBuffer::Template(EditBuffer::edit(t))),
        Some(Row::Task { id }) => app.task(&id).map(|t| FormBuffer::Task(EditBuffer::edit(t))),
        _ => None,
    };
    if let Some(buffer) = buffer {
        open_form(app, buffer);
    }
}

fn confirm_delete(app: &mut App) {
    let confirm = match app.current_row() {
        Some(Row::Group { key, count, .. }) => Some(Confirm::DeleteGroup { key, count }),
        Some(Row::Template { id, .. }) => app.template(&id).map(|t| Confirm::DeleteTemplate {
            title: t.title.clone(),
            id,
        }),
        Some(Row::Task { id }) => app.task(&id).map(|t| Confirm::DeleteTask {
            title: t.title.clone(),
            id,
        }),
        None => None,
    };
    if confirm.is_some() {
        app.confirm = confirm;
        app.mode = Mode::Confirm;
    }
}

fn begin_completion(app: &mut App) {
    let Some(Row::Task { id }) = app.current_row() else {
        return;
    };
    let mut prompt = CompletionPrompt::default();
    let begun = match app.task(&id) {
        Some(task) => prompt.flow.begin(task),
        None => return,
    };
    match begun {
        Ok(()) => {
            app.completion = Some(prompt);
            app.mode = Mode::Complete;
        }
        Err(e) => app.notify_error(e.to_string(), false),
    }
}
