//! Semantic colors for all dashboard surfaces.
//!
//! Panels and chrome never hard-code colors; everything renders through a
//! [`Theme`]. Ships with dark (default) and light presets.

use ratatui::style::{Color, Modifier, Style};

// ─── Presets ────────────────────────────────────────────────────────────────

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreset {
    /// Dark background (default).
    Dark,
    /// Light background.
    Light,
}

impl ThemePreset {
    /// All presets in cycling order.
    pub const ALL: [Self; 2] = [Self::Dark, Self::Light];

    /// Advance to the next preset (wrapping).
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

// ─── Theme ──────────────────────────────────────────────────────────────────

/// Semantic color assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Which preset this theme was built from.
    pub preset: ThemePreset,
    /// Base background painted behind every surface.
    pub bg: Color,
    /// Default text.
    pub fg: Color,
    /// Secondary / de-emphasized text.
    pub muted: Color,
    /// Unfocused pane borders.
    pub border: Color,
    /// Focused pane border.
    pub border_focused: Color,
    /// Table headers, section titles.
    pub header: Color,
    /// Selected row background.
    pub highlight_bg: Color,
    /// Selected row text.
    pub highlight_fg: Color,
    /// Error messages.
    pub error: Color,
    /// Degraded but not failed state (killed sessions, long waits).
    pub warning: Color,
    /// Active / healthy rows.
    pub success: Color,
    /// Accent for active tabs.
    pub accent: Color,
}

impl Theme {
    /// The dark preset.
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            preset: ThemePreset::Dark,
            bg: Color::Black,
            fg: Color::Gray,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            header: Color::Yellow,
            highlight_bg: Color::Blue,
            highlight_fg: Color::White,
            error: Color::Red,
            warning: Color::Yellow,
            success: Color::Green,
            accent: Color::Cyan,
        }
    }

    /// The light preset.
    #[must_use]
    pub const fn light() -> Self {
        Self {
            preset: ThemePreset::Light,
            bg: Color::White,
            fg: Color::Black,
            muted: Color::Gray,
            border: Color::Gray,
            border_focused: Color::Blue,
            header: Color::Magenta,
            highlight_bg: Color::LightBlue,
            highlight_fg: Color::Black,
            error: Color::Red,
            warning: Color::Magenta,
            success: Color::Green,
            accent: Color::Blue,
        }
    }

    /// Build a theme from a preset.
    #[must_use]
    pub const fn from_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Dark => Self::dark(),
            ThemePreset::Light => Self::light(),
        }
    }

    /// Border style for a pane, depending on focus.
    #[must_use]
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    /// Style for table headers and section titles.
    #[must_use]
    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the selected row of a table or list.
    #[must_use]
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Dim style for secondary text.
    #[must_use]
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Style for error text.
    #[must_use]
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// Style for warning text.
    #[must_use]
    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    /// Base style painted behind every surface.
    #[must_use]
    pub fn base_style(&self) -> Style {
        Style::default().bg(self.bg).fg(self.fg)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_cycle_wraps() {
        assert_eq!(ThemePreset::Dark.next(), ThemePreset::Light);
        assert_eq!(ThemePreset::Light.next(), ThemePreset::Dark);
    }

    #[test]
    fn from_preset_roundtrip() {
        for preset in ThemePreset::ALL {
            assert_eq!(Theme::from_preset(preset).preset, preset);
        }
    }

    #[test]
    fn focused_border_differs() {
        let theme = Theme::dark();
        assert_ne!(theme.border_style(true), theme.border_style(false));
    }

    #[test]
    fn presets_have_distinct_backgrounds() {
        assert_ne!(Theme::dark().bg, Theme::light().bg);
    }

    #[test]
    fn warning_differs_from_error_and_success() {
        for theme in [Theme::dark(), Theme::light()] {
            assert_ne!(theme.warning, theme.error);
            assert_ne!(theme.warning, theme.success);
            assert_ne!(theme.warning_style(), theme.error_style());
        }
    }

    #[test]
    fn preset_serde_roundtrip() {
        for preset in ThemePreset::ALL {
            let json = serde_json::to_string(&preset).unwrap();
            let decoded: ThemePreset = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, preset);
        }
    }
}
