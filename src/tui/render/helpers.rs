use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width in terminal cells
pub(super) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max_cells` terminal cells, ending in `…` when cut
pub(super) fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let Some(budget) = max_cells.checked_sub(1) else {
        return String::new();
    };
    let mut used = 0;
    let mut out: String = s
        .chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= budget
        })
        .collect();
    out.push('\u{2026}');
    out
}

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| display_width(&s.content)).sum()
}

/// Split `text` into spans, styling regex matches with `highlight_style`
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let mut pos = 0;
    for m in search_re.into_iter().flat_map(|re| re.find_iter(text)) {
        if m.is_empty() {
            continue;
        }
        if m.start() > pos {
            spans.push(Span::styled(text[pos..m.start()].to_string(), base_style));
        }
        spans.push(Span::styled(m.as_str().to_string(), highlight_style));
        pos = m.end();
    }
    if pos < text.len() || pos == 0 {
        spans.push(Span::styled(text[pos..].to_string(), base_style));
    }
}

/// Pad a line out to `width` with `fill` so the row background is solid
pub(super) fn pad_line(mut spans: Vec<Span<'_>>, width: usize, fill: Style) -> Line<'_> {
    let used = spans_width(&spans);
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), fill));
    }
    Line::from(spans)
}

/// Left-aligned content with a right-aligned hint when both fit
pub(super) fn with_right_hint<'a>(
    mut spans: Vec<Span<'a>>,
    hint: &'a str,
    width: usize,
    fill: Style,
    hint_style: Style,
) -> Line<'a> {
    let used = spans_width(&spans);
    let hint_width = display_width(hint);
    if used + hint_width < width {
        spans.push(Span::styled(" ".repeat(width - used - hint_width), fill));
        spans.push(Span::styled(hint, hint_style));
    }
    Line::from(spans)
}

/// A popup covering `percent_x` by `percent_y` of `area`, centered
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;
    centered_rows(percent_x, height, area)
}

/// A popup `height` rows tall and `percent_x` of the width, centered
pub(super) fn centered_rows(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
