use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{Action, App, Mode, PickerPurpose};

pub(super) fn handle_picker(app: &mut App, key: KeyEvent, now: Instant) {
    let Some(picker) = &mut app.picker else {
        close_picker(app);
        return;
    };
    match key.code {
        KeyCode::Esc => close_picker(app),
        KeyCode::Down => {
            if picker.cursor + 1 < picker.results.len() {
                picker.cursor += 1;
            }
        }
        KeyCode::Up => picker.cursor = picker.cursor.saturating_sub(1),
        KeyCode::Enter => choose(app),
        KeyCode::Backspace => {
            picker.query.pop();
            picker.debounce.on_input(&picker.query, now);
        }
        KeyCode::Char(c) => {
            picker.query.push(c);
            picker.debounce.on_input(&picker.query, now);
        }
        _ => {}
    }
}

fn close_picker(app: &mut App) {
    app.picker = None;
    app.mode = if app.form.is_some() {
        Mode::Form
    } else {
        Mode::Navigate
    };
}

fn choose(app: &mut App) {
    let Some(picker) = &app.picker else {
        return;
    };
    let Some(assignee) = picker.selected().cloned() else {
        return;
    };
    match picker.purpose.clone() {
        PickerPurpose::FormAssignee => {
            let added = app
                .form
                .as_mut()
                .is_some_and(|f| f.buffer.selection_mut().select(assignee.clone()));
            if !added {
                app.notify(format!("{} is already assigned", assignee.display_name()));
            }
            close_picker(app);
        }
        PickerPurpose::CopyTarget { group } => {
            if !assignee.is_client() {
                app.notify_error("copy target must be a client", false);
                return;
            }
            app.pending.push(Action::CopyGroup {
                group,
                target: assignee,
            });
            close_picker(app);
        }
    }
}
