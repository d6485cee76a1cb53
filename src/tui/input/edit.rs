use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::form::FormError;
use crate::tui::app::{Action, App, FormSlot, Mode, PickerPurpose, PickerState};

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    let Some(form) = &mut app.form else {
        app.mode = Mode::Navigate;
        return;
    };

    // Typing into a field
    if let Some(text) = &mut form.editing {
        match key.code {
            KeyCode::Esc => {
                form.editing = None;
                form.error = None;
            }
            KeyCode::Enter => {
                let value = text.clone();
                let FormSlot::Field(field) = form.slot() else {
                    form.editing = None;
                    return;
                };
                match form.buffer.set(field, &value) {
                    Ok(()) => {
                        form.editing = None;
                        form.error = None;
                    }
                    Err(e) => form.error = Some(e.to_string()),
                }
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => {}
        }
        return;
    }

    // s (or Ctrl-s) saves
    if key.code == KeyCode::Char('s') {
        let missing = form.buffer.missing_required();
        if missing.is_empty() {
            form.error = None;
            app.pending.push(Action::SubmitForm);
        } else {
            form.error = Some(FormError::MissingRequired(missing).to_string());
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.form = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => {
            form.focus = (form.focus + 1) % form.slot_count();
        }
        KeyCode::Up | KeyCode::BackTab | KeyCode::Char('k') => {
            let count = form.slot_count();
            form.focus = (form.focus + count - 1) % count;
        }
        KeyCode::Enter => match form.slot() {
            FormSlot::Field(field) => form.editing = Some(form.buffer.get(field)),
            FormSlot::AddAssignee => open_assignee_picker(app),
            FormSlot::Assignee(_) => {}
        },
        KeyCode::Char('a') => open_assignee_picker(app),
        KeyCode::Char('x') | KeyCode::Delete => {
            if let FormSlot::Assignee(index) = form.slot() {
                let id = form.buffer.selection().items()[index].id.clone();
                form.buffer.selection_mut().remove(&id);
                form.clamp_focus();
            }
        }
        _ => {}
    }
}

fn open_assignee_picker(app: &mut App) {
    app.picker = Some(PickerState::new(
        PickerPurpose::FormAssignee,
        app.search_delay(),
    ));
    app.mode = Mode::Picker;
}
