use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

/// Title filter prompt: `/pattern`, Enter applies, Esc restores the last one
pub(super) fn handle_filter(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.filter_input = app.ui.last_search.clone().unwrap_or_default();
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => {
            let pattern = app.filter_input.clone();
            if let Err(e) = app.apply_filter(&pattern) {
                app.notify_error(format!("bad pattern: {}", e), false);
            }
            app.mode = Mode::Navigate;
        }
        KeyCode::Backspace => {
            app.filter_input.pop();
        }
        KeyCode::Char(c) => app.filter_input.push(c),
        _ => {}
    }
}
