use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::helpers::{centered_rect, centered_rows, pad_line, truncate_to_width};
use crate::ops::completion::CompletionState;
use crate::tui::app::{App, FormSlot, Mode, PickerPurpose, View};

fn popup_block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(app.theme.accent).bg(app.theme.background))
        .style(Style::default().fg(app.theme.text).bg(app.theme.background))
}

/// The edit form: one line per field, then the assignee list
pub(super) fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let popup = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup);

    let title = if form.buffer.is_new() {
        format!(" New {} ", form.buffer.kind())
    } else {
        format!(" Edit {} ", form.buffer.kind())
    };
    let block = popup_block(app, title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let width = inner.width as usize;
    let label_width = 18;
    let focused = form.slot();
    let active = app.mode == Mode::Form;
    let mut lines: Vec<Line> = Vec::new();

    for &field in form.buffer.fields() {
        let is_focused = active && focused == FormSlot::Field(field);
        let row_bg = if is_focused { theme.selection_bg } else { bg };
        let marker = if form.buffer.is_required(field) { "*" } else { " " };
        let label = format!("{}{:<w$}", marker, field.replace('_', " "), w = label_width - 1);
        let mut spans = vec![Span::styled(
            label,
            Style::default().fg(theme.dim).bg(row_bg),
        )];
        match (&form.editing, is_focused) {
            (Some(text), true) => {
                spans.push(Span::styled(
                    text.clone(),
                    Style::default().fg(theme.text_bright).bg(row_bg),
                ));
                spans.push(Span::styled(
                    "\u{258C}",
                    Style::default().fg(theme.accent).bg(row_bg),
                ));
            }
            _ => {
                let value = form.buffer.get(field).replace('\n', " ");
                spans.push(Span::styled(
                    truncate_to_width(&value, width.saturating_sub(label_width)),
                    Style::default().fg(theme.text).bg(row_bg),
                ));
            }
        }
        lines.push(pad_line(spans, width, Style::default().bg(row_bg)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " assignees",
        Style::default().fg(theme.dim).bg(bg),
    )));
    for (index, assignee) in form.buffer.selection().items().iter().enumerate() {
        let row_bg = if active && focused == FormSlot::Assignee(index) {
            theme.selection_bg
        } else {
            bg
        };
        let color = if assignee.is_client() {
            theme.client
        } else {
            theme.text
        };
        let spans = vec![Span::styled(
            format!("   {:<9}{}", assignee.kind.as_str(), assignee.display_name()),
            Style::default().fg(color).bg(row_bg),
        )];
        lines.push(pad_line(spans, width, Style::default().bg(row_bg)));
    }
    let add_bg = if active && focused == FormSlot::AddAssignee {
        theme.selection_bg
    } else {
        bg
    };
    lines.push(pad_line(
        vec![Span::styled(
            "   + add assignee",
            Style::default().fg(theme.accent).bg(add_bg),
        )],
        width,
        Style::default().bg(add_bg),
    ));

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(theme.error).bg(bg),
        )));
    }
    lines.push(Line::from(Span::styled(
        " Enter edit  a add  x remove  s save  Esc close",
        Style::default().fg(theme.dim).bg(bg),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Assignee search box with its results
pub(super) fn render_picker(frame: &mut Frame, app: &App, area: Rect) {
    let Some(picker) = &app.picker else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let popup = centered_rect(50, 60, area);
    frame.render_widget(Clear, popup);

    let title = match &picker.purpose {
        PickerPurpose::FormAssignee => " Add assignee ".to_string(),
        PickerPurpose::CopyTarget { group } => format!(" Copy '{}' to client ", group),
    };
    let block = popup_block(app, title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    let width = inner.width as usize;

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" search: ", Style::default().fg(theme.dim).bg(bg)),
            Span::styled(
                picker.query.clone(),
                Style::default().fg(theme.text_bright).bg(bg),
            ),
            Span::styled("\u{258C}", Style::default().fg(theme.accent).bg(bg)),
        ]),
        Line::from(""),
    ];

    let min_len = app.config.search.min_query_len;
    if picker.results.is_empty() {
        let message = if picker.query.trim().chars().count() < min_len {
            format!(" type at least {} characters", min_len)
        } else {
            " no matches".to_string()
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(theme.dim).bg(bg),
        )));
    }
    for (index, assignee) in picker.results.iter().enumerate() {
        let row_bg = if index == picker.cursor {
            theme.selection_bg
        } else {
            bg
        };
        let text = format!(" {:<9}{}", assignee.kind.as_str(), assignee.display_name());
        lines.push(pad_line(
            vec![Span::styled(
                truncate_to_width(&text, width),
                Style::default().fg(theme.text).bg(row_bg),
            )],
            width,
            Style::default().bg(row_bg),
        ));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Hours / minutes / notes prompt for completing a task
pub(super) fn render_completion(frame: &mut Frame, app: &App, area: Rect) {
    let Some(prompt) = &app.completion else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let popup = centered_rows(60, 9, area);
    frame.render_widget(Clear, popup);

    let title = match prompt.flow.state() {
        CompletionState::Capturing { title, .. } => format!(" Complete '{}' ", title),
        _ => " Complete task ".to_string(),
    };
    let block = popup_block(app, title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let inputs = [
        ("hours", &prompt.hours),
        ("minutes", &prompt.minutes),
        ("notes", &prompt.notes),
    ];
    let mut lines = vec![Line::from("")];
    for (index, (label, value)) in inputs.iter().enumerate() {
        let focused = index == prompt.focus;
        let mut spans = vec![
            Span::styled(
                format!(" {:<9}", label),
                Style::default().fg(theme.dim).bg(bg),
            ),
            Span::styled(
                value.to_string(),
                Style::default().fg(theme.text_bright).bg(bg),
            ),
        ];
        if focused {
            spans.push(Span::styled(
                "\u{258C}",
                Style::default().fg(theme.accent).bg(bg),
            ));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Tab next  Enter complete  Esc cancel",
        Style::default().fg(theme.dim).bg(bg),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

pub(super) fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirm) = &app.confirm else {
        return;
    };
    let popup = centered_rows(50, 3, area);
    frame.render_widget(Clear, popup);
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", confirm.prompt()),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.background)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "y/n",
            Style::default().fg(app.theme.accent).bg(app.theme.background),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(popup_block(app, " Confirm ".to_string())),
        popup,
    );
}

/// Render the help overlay (toggled with ?)
pub(super) fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup);

    let key_style = Style::default()
        .fg(app.theme.accent)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(app.theme.background);

    let mut bindings: Vec<(&str, &str)> = vec![
        ("\u{2191}\u{2193}/jk", "Move cursor"),
        ("Tab", "Switch templates / tasks"),
        ("Enter", "Expand group or edit"),
        ("n", "New record"),
        ("e", "Edit record"),
        ("d", "Delete (group: every template in it)"),
        ("/", "Filter titles (regex)"),
        ("Esc", "Clear filters"),
        ("r", "Reload from server"),
        ("q", "Quit"),
    ];
    match app.view {
        View::Templates => bindings.extend([
            ("t", "Toggle active"),
            ("y", "Duplicate template"),
            ("c", "Copy group to another client"),
            ("o", "Show only this group"),
            ("E / C", "Expand / collapse all"),
        ]),
        View::Tasks => bindings.extend([
            ("c", "Complete task and log time"),
            ("f", "Cycle open / priority / completed"),
        ]),
    }

    let mut lines = vec![Line::from("")];
    for (key, desc) in bindings {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<16}", key), key_style),
            Span::styled(desc, desc_style),
        ]));
    }
    frame.render_widget(
        Paragraph::new(lines).block(popup_block(app, " Key Bindings ".to_string())),
        popup,
    );
}
