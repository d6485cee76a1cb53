use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{Action, App, Mode};

pub(super) fn handle_completion(app: &mut App, key: KeyEvent) {
    let Some(prompt) = &mut app.completion else {
        app.mode = Mode::Navigate;
        return;
    };
    match key.code {
        KeyCode::Esc => {
            prompt.flow.cancel();
            app.completion = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Tab | KeyCode::Down => prompt.focus = (prompt.focus + 1) % 3,
        KeyCode::BackTab | KeyCode::Up => prompt.focus = (prompt.focus + 2) % 3,
        KeyCode::Enter => app.pending.push(Action::ConfirmCompletion),
        KeyCode::Backspace => {
            prompt.focused_mut().pop();
        }
        KeyCode::Char(c) => {
            let accepted = match prompt.focus {
                0 => c.is_ascii_digit() || (c == '.' && !prompt.hours.contains('.')),
                1 => c.is_ascii_digit(),
                _ => true,
            };
            if accepted {
                prompt.focused_mut().push(c);
            }
        }
        _ => {}
    }
}
