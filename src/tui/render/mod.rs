mod helpers;
mod popups;

use chrono::{Local, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::app::{App, Mode, Row, ToastKind, View, task_filter_name};
use helpers::{pad_line, push_highlighted_spans, truncate_to_width, with_right_hint};

/// Main render function: tab bar, board, status row, then any overlay
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tab bar
            Constraint::Min(1),    // board
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_tab_bar(frame, app, chunks[0]);
    render_board(frame, app, chunks[1], Local::now().date_naive());
    render_status_row(frame, app, chunks[2]);

    match app.mode {
        Mode::Form | Mode::Picker if app.form.is_some() => popups::render_form(frame, app, area),
        _ => {}
    }
    if app.mode == Mode::Picker {
        popups::render_picker(frame, app, area);
    }
    if app.mode == Mode::Complete {
        popups::render_completion(frame, app, area);
    }
    if app.mode == Mode::Confirm {
        popups::render_confirm(frame, app, area);
    }
    if app.show_help {
        popups::render_help(frame, app, area);
    }
}

fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let active = Style::default()
        .fg(app.theme.text_bright)
        .bg(app.theme.selection_bg)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(app.theme.dim).bg(bg);

    let tasks_label = format!(" Tasks ({}) ", task_filter_name(app.task_filter));
    let (templates_style, tasks_style) = match app.view {
        View::Templates => (active, inactive),
        View::Tasks => (inactive, active),
    };
    let mut spans = vec![
        Span::styled(" Templates ", templates_style),
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(tasks_label, tasks_style),
    ];
    if let Some(group) = &app.ui.client_filter {
        spans.push(Span::styled(
            format!("  only: {}", group),
            Style::default().fg(app.theme.client).bg(bg),
        ));
    }
    let line = with_right_hint(
        spans,
        app.client.base_url(),
        area.width as usize,
        Style::default().bg(bg),
        Style::default().fg(app.theme.dim).bg(bg),
    );
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}

fn render_board(frame: &mut Frame, app: &mut App, area: Rect, today: NaiveDate) {
    let rows = app.rows();
    let height = area.height as usize;
    let width = area.width as usize;

    // Keep the cursor on screen
    if app.cursor < app.scroll {
        app.scroll = app.cursor;
    } else if height > 0 && app.cursor >= app.scroll + height {
        app.scroll = app.cursor + 1 - height;
    }

    let bg = app.theme.background;
    let mut lines: Vec<Line> = Vec::new();
    if rows.is_empty() {
        let message = match (app.view, app.templates.is_loaded()) {
            (View::Templates, false) => "  templates not loaded (r to retry)",
            (View::Templates, true) => "  no templates (n to add one)",
            (View::Tasks, _) => "  no tasks",
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }
    for (index, row) in rows.iter().enumerate().skip(app.scroll).take(height) {
        let selected = index == app.cursor;
        lines.push(row_line(app, row, selected, width, today));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn row_line<'a>(app: &'a App, row: &Row, selected: bool, width: usize, today: NaiveDate) -> Line<'a> {
    let theme = &app.theme;
    let bg = if selected {
        theme.selection_bg
    } else {
        theme.background
    };
    let fill = Style::default().bg(bg);
    let hi = Style::default()
        .fg(theme.match_fg)
        .bg(theme.match_bg);
    let re = app.title_filter.as_ref();
    let mut spans: Vec<Span> = Vec::new();

    match row {
        Row::Group {
            key,
            count,
            inactive,
            expanded,
        } => {
            let marker = if *expanded { "\u{25BE}" } else { "\u{25B8}" };
            spans.push(Span::styled(
                format!("{} ", marker),
                Style::default().fg(theme.accent).bg(bg),
            ));
            spans.push(Span::styled(
                truncate_to_width(key, width.saturating_sub(20)),
                Style::default()
                    .fg(theme.text_bright)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ));
            let counts = if *inactive > 0 {
                format!("  {} ({} inactive)", count, inactive)
            } else {
                format!("  {}", count)
            };
            spans.push(Span::styled(counts, Style::default().fg(theme.dim).bg(bg)));
        }
        Row::Template { id, .. } => {
            let Some(t) = app.template(id) else {
                return pad_line(spans, width, fill);
            };
            let base = if t.is_active {
                Style::default().fg(theme.text).bg(bg)
            } else {
                Style::default().fg(theme.dim).bg(bg)
            };
            spans.push(Span::styled(
                "    \u{25CF} ",
                Style::default().fg(theme.priority_color(t.priority)).bg(bg),
            ));
            let title = truncate_to_width(&t.title, width.saturating_sub(30));
            push_highlighted_spans(&mut spans, &title, base, hi, re);
            spans.push(Span::styled(
                format!("  {}", t.frequency),
                Style::default().fg(theme.client).bg(bg),
            ));
            if !t.job_type.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", t.job_type),
                    Style::default().fg(theme.dim).bg(bg),
                ));
            }
            if !t.is_active {
                spans.push(Span::styled(
                    "  inactive",
                    Style::default().fg(theme.warning).bg(bg),
                ));
            }
        }
        Row::Task { id } => {
            let Some(task) = app.task(id) else {
                return pad_line(spans, width, fill);
            };
            spans.push(Span::styled(
                format!("{:<9}", format!("[{}]", task.status)),
                Style::default().fg(theme.status_color(task.status)).bg(bg),
            ));
            let title = truncate_to_width(&task.title, width.saturating_sub(30));
            push_highlighted_spans(
                &mut spans,
                &title,
                Style::default().fg(theme.text).bg(bg),
                hi,
                re,
            );
            if !task.due_date.is_empty() {
                let color = if task.is_overdue(today) {
                    theme.error
                } else {
                    theme.dim
                };
                spans.push(Span::styled(
                    format!("  due {}", task.due_date),
                    Style::default().fg(color).bg(bg),
                ));
            }
            if let Some(client) = task.anchor_client() {
                spans.push(Span::styled(
                    format!("  {}", client.display_name()),
                    Style::default().fg(theme.client).bg(bg),
                ));
            }
        }
    }
    pad_line(spans, width, fill)
}

/// Render the status row (bottom of screen)
fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let fill = Style::default().bg(bg);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let line = if app.mode == Mode::Filter {
        let spans = vec![
            Span::styled(
                format!("/{}", app.filter_input),
                Style::default().fg(app.theme.text_bright).bg(bg),
            ),
            Span::styled("\u{258C}", Style::default().fg(app.theme.accent).bg(bg)),
        ];
        with_right_hint(spans, "Enter filter  Esc cancel", width, fill, dim)
    } else if let Some(toast) = &app.toast {
        let color = match toast.kind {
            ToastKind::Info => app.theme.ok,
            ToastKind::Error => app.theme.error,
            ToastKind::Denied => app.theme.warning,
        };
        let prefix = if toast.kind == ToastKind::Denied {
            "\u{26A0} "
        } else {
            ""
        };
        Line::from(Span::styled(
            truncate_to_width(&format!("{}{}", prefix, toast.text), width),
            Style::default().fg(color).bg(bg),
        ))
    } else {
        let mut spans = Vec::new();
        if app.is_busy() {
            spans.push(Span::styled("working  ", Style::default().fg(app.theme.accent).bg(bg)));
        }
        if let Some(pattern) = &app.ui.last_search {
            spans.push(Span::styled(format!("/{}", pattern), dim));
        }
        let hint = if app.config.ui.show_key_hints {
            match app.view {
                View::Templates => "n new  e edit  d delete  c copy group  t toggle  ? help",
                View::Tasks => "n new  e edit  c complete  f filter  ? help",
            }
        } else {
            ""
        };
        with_right_hint(spans, hint, width, fill, dim)
    };

    frame.render_widget(Paragraph::new(line).style(fill), area);
}
