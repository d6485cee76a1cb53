mod complete;
mod confirm;
mod edit;
mod navigate;
mod popups;
mod search;

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Help overlay swallows the next key
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.mode {
        Mode::Navigate => navigate::handle_navigate(app, key),
        Mode::Filter => search::handle_filter(app, key),
        Mode::Form => edit::handle_form(app, key),
        Mode::Picker => popups::handle_picker(app, key, Instant::now()),
        Mode::Complete => complete::handle_completion(app, key),
        Mode::Confirm => confirm::handle_confirm(app, key),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::api::RestClient;
    use crate::io::state::UiState;
    use crate::model::{Assignee, Config, Task, TaskStatus, TaskTemplate};
    use crate::tui::app::{Action, Confirm, FormSlot, PickerPurpose, Row, View};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, key(code));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn template(id: &str, title: &str, client: Option<(&str, &str)>) -> TaskTemplate {
        let mut t = TaskTemplate::new(title);
        t.id = Some(id.to_string());
        if let Some((cid, name)) = client {
            t.assignees.push(Assignee::client(cid, name));
        }
        t
    }

    fn board(tmp: &TempDir) -> App {
        let config = Config::default();
        let client = RestClient::from_config(&config).unwrap();
        let mut app = App::new(config, client, tmp.path().to_path_buf(), UiState::default());
        app.templates.seed(vec![
            template("1", "Weekly report", Some(("c1", "Acme"))),
            template("2", "Invoice run", Some(("c1", "Acme"))),
            template("3", "Inbox zero", None),
        ]);
        let mut task = Task::new("Edit promo");
        task.id = Some("k1".into());
        let mut done = Task::new("Old shoot");
        done.id = Some("k2".into());
        done.status = TaskStatus::Complete;
        app.tasks.seed(vec![task, done]);
        app
    }

    #[test]
    fn enter_toggles_group_expansion() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        assert_eq!(app.rows().len(), 2);

        press(&mut app, KeyCode::Enter);
        assert!(app.ui.expanded.is_expanded("Acme"));
        assert_eq!(app.rows().len(), 4);

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(
            app.current_row(),
            Some(Row::Template {
                id: "1".into(),
                group: "Acme".into()
            })
        );

        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.ui.expanded.is_expanded("Acme"));
        assert_eq!(app.rows().len(), 2);
    }

    #[test]
    fn group_delete_needs_confirmation() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, Mode::Confirm);
        assert_eq!(
            app.confirm,
            Some(Confirm::DeleteGroup {
                key: "Acme".into(),
                count: 2
            })
        );

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.pending.is_empty());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.pending, vec![Action::DeleteGroup("Acme".into())]);
        assert!(app.confirm.is_none());
    }

    #[test]
    fn new_template_in_group_starts_with_its_client() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Form);
        let form = app.form.as_ref().unwrap();
        assert!(form.buffer.is_new());
        assert_eq!(form.buffer.selection().items()[0].id, "c1");
    }

    #[test]
    fn form_edits_fields_and_blocks_incomplete_submit() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('n'));

        // title is the first field
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Payroll");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.as_ref().unwrap().buffer.get("title"), "Payroll");

        press(&mut app, KeyCode::Char('s'));
        assert!(app.pending.is_empty());
        let error = app.form.as_ref().unwrap().error.clone().unwrap();
        assert_eq!(error, "required: description, job_type");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.form.is_none());
    }

    #[test]
    fn invalid_field_value_keeps_editing() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('n'));

        let form = app.form.as_mut().unwrap();
        form.focus = form
            .buffer
            .fields()
            .iter()
            .position(|f| *f == "priority")
            .unwrap();
        press(&mut app, KeyCode::Enter);
        // clear the current value, then type a bad one
        for _ in 0..10 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "urgent");
        press(&mut app, KeyCode::Enter);

        let form = app.form.as_ref().unwrap();
        assert!(form.editing.is_some());
        assert!(form.error.as_deref().unwrap().starts_with("invalid priority"));
    }

    #[test]
    fn picker_searches_after_input_settles() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.mode, Mode::Picker);

        type_text(&mut app, "d");
        app.tick(std::time::Instant::now() + Duration::from_secs(1));
        assert!(app.pending.is_empty(), "one character is below the minimum");

        type_text(&mut app, "a");
        app.tick(std::time::Instant::now());
        assert!(app.pending.is_empty(), "still settling");
        app.tick(std::time::Instant::now() + Duration::from_secs(1));
        assert_eq!(app.pending, vec![Action::Search("da".into())]);
    }

    #[test]
    fn picker_adds_assignee_once() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('a'));

        let dana = Assignee::employee("e1", "Dana Reyes");
        app.picker.as_mut().unwrap().results = vec![dana.clone()];
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Form);
        assert_eq!(app.form.as_ref().unwrap().buffer.selection().len(), 2);

        press(&mut app, KeyCode::Char('a'));
        app.picker.as_mut().unwrap().results = vec![dana];
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.as_ref().unwrap().buffer.selection().len(), 2);
    }

    #[test]
    fn form_removes_focused_assignee() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('n'));

        let form = app.form.as_mut().unwrap();
        form.focus = form.buffer.fields().len();
        assert_eq!(form.slot(), FormSlot::Assignee(0));
        press(&mut app, KeyCode::Char('x'));
        assert!(app.form.as_ref().unwrap().buffer.selection().is_empty());
    }

    #[test]
    fn copy_target_must_be_a_client() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(
            app.picker.as_ref().unwrap().purpose,
            PickerPurpose::CopyTarget {
                group: "Acme".into()
            }
        );

        app.picker.as_mut().unwrap().results = vec![Assignee::employee("e1", "Dana")];
        press(&mut app, KeyCode::Enter);
        assert!(app.pending.is_empty());
        assert_eq!(app.mode, Mode::Picker);

        let globex = Assignee::client("c2", "Globex");
        app.picker.as_mut().unwrap().results = vec![globex.clone()];
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.pending,
            vec![Action::CopyGroup {
                group: "Acme".into(),
                target: globex
            }]
        );
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn completion_prompt_accepts_numbers_only() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Tasks);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::Complete);
        type_text(&mut app, "1x.5");
        assert_eq!(app.completion.as_ref().unwrap().hours, "1.5");

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "15m");
        assert_eq!(app.completion.as_ref().unwrap().minutes, "15");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.pending, vec![Action::ConfirmCompletion]);
    }

    #[test]
    fn completed_task_cannot_be_completed_again() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.completion.is_none());
        assert!(app.toast.is_some());
    }

    #[test]
    fn filter_narrows_rows_and_is_remembered() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        app.ui.expanded.set_all(true);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "INV");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.ui.last_search.as_deref(), Some("INV"));
        // Acme header and Invoice run; the unassigned group has no match
        assert_eq!(app.rows().len(), 2);
        let ids: Vec<_> = app
            .rows()
            .into_iter()
            .filter_map(|r| match r {
                Row::Template { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["2"]);

        press(&mut app, KeyCode::Esc);
        assert!(app.title_filter.is_none());
    }

    #[test]
    fn bad_regex_is_reported() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "(");
        press(&mut app, KeyCode::Enter);
        assert!(app.title_filter.is_none());
        assert!(app.toast.is_some());
    }

    #[test]
    fn task_filter_cycles() {
        let tmp = TempDir::new().unwrap();
        let mut app = board(&tmp);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(
            app.pending,
            vec![Action::SetTaskFilter(crate::model::TaskFilter::Priority)]
        );
    }
}
