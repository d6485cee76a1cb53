use ratatui::style::Color;

use crate::model::{Priority, TaskStatus, UiConfig};

/// Board colors, one slot per role. Every slot can be overridden from
/// `[ui.colors]` by its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub dim: Color,
    /// Cursor markers, group arrows, prompts
    pub accent: Color,
    pub selection_bg: Color,
    pub error: Color,
    pub warning: Color,
    pub ok: Color,
    /// Client names and client assignees
    pub client: Color,
    pub match_bg: Color,
    pub match_fg: Color,
}

const SLOTS: &[&str] = &[
    "background",
    "text",
    "text_bright",
    "dim",
    "accent",
    "selection_bg",
    "error",
    "warning",
    "ok",
    "client",
    "match_bg",
    "match_fg",
];

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x14, 0x1A, 0x21),
            text: Color::Rgb(0xC9, 0xD1, 0xD9),
            text_bright: Color::Rgb(0xF5, 0xF7, 0xFA),
            dim: Color::Rgb(0x6E, 0x7A, 0x86),
            accent: Color::Rgb(0xE8, 0xA3, 0x3D),
            selection_bg: Color::Rgb(0x26, 0x33, 0x40),
            error: Color::Rgb(0xE5, 0x53, 0x4B),
            warning: Color::Rgb(0xD9, 0xB4, 0x4A),
            ok: Color::Rgb(0x5F, 0xB8, 0x7A),
            client: Color::Rgb(0x4F, 0xB3, 0xBF),
            match_bg: Color::Rgb(0xE8, 0xA3, 0x3D),
            match_fg: Color::Rgb(0x14, 0x1A, 0x21),
        }
    }
}

/// `#rrggbb` or `#rgb`
fn parse_color(text: &str) -> Option<Color> {
    let hex = text.trim().strip_prefix('#').filter(|h| h.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                rgb[i] = channel(&c.to_string())? * 0x11;
            }
            Some(Color::Rgb(rgb[0], rgb[1], rgb[2]))
        }
        _ => None,
    }
}

impl Theme {
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (slot, value) in &ui.colors {
            let Some(target) = theme.slot_mut(slot) else {
                tracing::debug!(slot = %slot, known = ?SLOTS, "unknown color slot");
                continue;
            };
            match parse_color(value) {
                Some(color) => *target = color,
                None => tracing::warn!(slot = %slot, value = %value, "ignoring unparseable color"),
            }
        }
        theme
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Color> {
        Some(match name {
            "background" => &mut self.background,
            "text" => &mut self.text,
            "text_bright" => &mut self.text_bright,
            "dim" => &mut self.dim,
            "accent" => &mut self.accent,
            "selection_bg" => &mut self.selection_bg,
            "error" => &mut self.error,
            "warning" => &mut self.warning,
            "ok" => &mut self.ok,
            "client" => &mut self.client,
            "match_bg" => &mut self.match_bg,
            "match_fg" => &mut self.match_fg,
            _ => return None,
        })
    }

    /// Bullet color in front of a template title
    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::Low => self.dim,
            Priority::Medium => self.text,
            Priority::High => self.accent,
        }
    }

    pub fn status_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Active => self.text,
            TaskStatus::Complete => self.ok,
            TaskStatus::Hold => self.warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_long_and_short_forms() {
        assert_eq!(parse_color("#E8A33D"), Some(Color::Rgb(0xE8, 0xA3, 0x3D)));
        assert_eq!(parse_color(" #fa0 "), Some(Color::Rgb(0xFF, 0xAA, 0x00)));
        assert_eq!(parse_color("E8A33D"), None);
        assert_eq!(parse_color("#E8A3"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
        assert_eq!(parse_color("#\u{20AC}\u{20AC}"), None);
    }

    #[test]
    fn every_slot_is_addressable() {
        let mut theme = Theme::default();
        for slot in SLOTS {
            assert!(theme.slot_mut(slot).is_some(), "{}", slot);
        }
        assert!(theme.slot_mut("purple").is_none());
    }

    #[test]
    fn config_overrides_skip_bad_entries() {
        let mut ui = UiConfig::default();
        ui.colors.insert("background".into(), "#000".into());
        ui.colors.insert("accent".into(), "orange".into());
        ui.colors.insert("nonsense".into(), "#112233".into());

        let theme = Theme::from_config(&ui);
        assert_eq!(theme.background, Color::Rgb(0, 0, 0));
        assert_eq!(theme.accent, Theme::default().accent);
        assert_eq!(theme.text, Theme::default().text);
    }

    #[test]
    fn status_and_priority_colors() {
        let theme = Theme::default();
        assert_eq!(theme.status_color(TaskStatus::Complete), theme.ok);
        assert_eq!(theme.status_color(TaskStatus::Hold), theme.warning);
        assert_eq!(theme.priority_color(Priority::High), theme.accent);
        assert_eq!(theme.priority_color(Priority::Low), theme.dim);
    }
}
