//! Input model: terminal events and the global keymap.
//!
//! The dispatcher resolves each key press against the [`Keymap`] first;
//! a hit becomes a [`GlobalAction`] handled by the app, a miss falls
//! through to the focused panel.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

// ─── Input Event ────────────────────────────────────────────────────────────

/// High-level input event consumed by panels and the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press with modifiers.
    Key(KeyCode, KeyModifiers),
    /// Terminal resize.
    Resize(u16, u16),
}

// ─── Global Actions ─────────────────────────────────────────────────────────

/// Semantic action resolved from the global key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalAction {
    /// Quit the application.
    Quit,
    /// Open the command palette.
    ShowPalette,
    /// Close the focused panel.
    ClosePanel,
    /// Switch to the next workflow tab.
    NextWorkflow,
    /// Switch to the previous workflow tab.
    PrevWorkflow,
    /// Cycle focus forward within the active workflow.
    FocusNext,
    /// Cycle focus backward within the active workflow.
    FocusPrev,
    /// Grow the focused panel along horizontal splits.
    GrowHorizontal,
    /// Shrink the focused panel along horizontal splits.
    ShrinkHorizontal,
    /// Grow the focused panel along vertical splits.
    GrowVertical,
    /// Shrink the focused panel along vertical splits.
    ShrinkVertical,
    /// Cycle to the next theme preset.
    CycleTheme,
    /// Toggle the key binding help overlay.
    ToggleHelp,
    /// Dismiss the current overlay.
    Dismiss,
}

impl GlobalAction {
    /// Key-binding hints shown in the help overlay, in display order.
    pub const HINTS: &'static [(&'static str, &'static str)] = &[
        ("Ctrl-P", "Open command palette"),
        ("Ctrl-W", "Close focused panel"),
        ("Ctrl-Right / Ctrl-Left", "Next / previous workflow"),
        ("Tab / Shift-Tab", "Cycle panel focus"),
        ("Alt-Right / Alt-Left", "Grow / shrink across"),
        ("Alt-Down / Alt-Up", "Grow / shrink down"),
        ("Ctrl-T", "Cycle theme preset"),
        ("? / F1", "Toggle this help"),
        ("Esc", "Dismiss overlay"),
        ("q / Ctrl-C", "Quit"),
    ];
}

// ─── Keymap ─────────────────────────────────────────────────────────────────

/// Maps key + modifier combinations to [`GlobalAction`]s.
pub struct Keymap {
    bindings: HashMap<(KeyCode, KeyModifiers), GlobalAction>,
}

impl Keymap {
    /// The default global bindings.
    #[must_use]
    pub fn default_bindings() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert((KeyCode::Char('q'), KeyModifiers::NONE), GlobalAction::Quit);
        bindings.insert(
            (KeyCode::Char('c'), KeyModifiers::CONTROL),
            GlobalAction::Quit,
        );
        bindings.insert(
            (KeyCode::Char('q'), KeyModifiers::CONTROL),
            GlobalAction::Quit,
        );

        bindings.insert(
            (KeyCode::Char('p'), KeyModifiers::CONTROL),
            GlobalAction::ShowPalette,
        );
        bindings.insert(
            (KeyCode::Char('w'), KeyModifiers::CONTROL),
            GlobalAction::ClosePanel,
        );

        bindings.insert(
            (KeyCode::Right, KeyModifiers::CONTROL),
            GlobalAction::NextWorkflow,
        );
        bindings.insert(
            (KeyCode::Left, KeyModifiers::CONTROL),
            GlobalAction::PrevWorkflow,
        );

        bindings.insert((KeyCode::Tab, KeyModifiers::NONE), GlobalAction::FocusNext);
        // Terminals report Shift-Tab either as BackTab+SHIFT or as bare BackTab.
        bindings.insert(
            (KeyCode::BackTab, KeyModifiers::SHIFT),
            GlobalAction::FocusPrev,
        );
        bindings.insert(
            (KeyCode::BackTab, KeyModifiers::NONE),
            GlobalAction::FocusPrev,
        );

        bindings.insert(
            (KeyCode::Right, KeyModifiers::ALT),
            GlobalAction::GrowHorizontal,
        );
        bindings.insert(
            (KeyCode::Left, KeyModifiers::ALT),
            GlobalAction::ShrinkHorizontal,
        );
        bindings.insert(
            (KeyCode::Down, KeyModifiers::ALT),
            GlobalAction::GrowVertical,
        );
        bindings.insert(
            (KeyCode::Up, KeyModifiers::ALT),
            GlobalAction::ShrinkVertical,
        );

        bindings.insert(
            (KeyCode::Char('t'), KeyModifiers::CONTROL),
            GlobalAction::CycleTheme,
        );

        bindings.insert(
            (KeyCode::Char('?'), KeyModifiers::NONE),
            GlobalAction::ToggleHelp,
        );
        bindings.insert((KeyCode::F(1), KeyModifiers::NONE), GlobalAction::ToggleHelp);
        bindings.insert((KeyCode::Esc, KeyModifiers::NONE), GlobalAction::Dismiss);

        Self { bindings }
    }

    /// Resolve a key event to an action.
    #[must_use]
    pub fn resolve(&self, key: KeyCode, modifiers: KeyModifiers) -> Option<GlobalAction> {
        self.bindings.get(&(key, modifiers)).copied()
    }

    /// Add or override a binding.
    pub fn bind(&mut self, key: KeyCode, modifiers: KeyModifiers, action: GlobalAction) {
        self.bindings.insert((key, modifiers), action);
    }

    /// Number of active bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the keymap has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::default_bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keymap_has_bindings() {
        let keymap = Keymap::default_bindings();
        assert!(!keymap.is_empty());
        assert!(keymap.len() >= 15);
    }

    #[test]
    fn resolve_quit_q() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(GlobalAction::Quit)
        );
    }

    #[test]
    fn resolve_quit_ctrl_c() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(GlobalAction::Quit)
        );
    }

    #[test]
    fn resolve_help_question_mark_and_f1() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Char('?'), KeyModifiers::NONE),
            Some(GlobalAction::ToggleHelp)
        );
        assert_eq!(
            keymap.resolve(KeyCode::F(1), KeyModifiers::NONE),
            Some(GlobalAction::ToggleHelp)
        );
    }

    #[test]
    fn resolve_theme_cycle_ctrl_t() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Char('t'), KeyModifiers::CONTROL),
            Some(GlobalAction::CycleTheme)
        );
    }

    #[test]
    fn resolve_palette_binding() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Char('p'), KeyModifiers::CONTROL),
            Some(GlobalAction::ShowPalette)
        );
    }

    #[test]
    fn resolve_focus_cycle() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Tab, KeyModifiers::NONE),
            Some(GlobalAction::FocusNext)
        );
        assert_eq!(
            keymap.resolve(KeyCode::BackTab, KeyModifiers::SHIFT),
            Some(GlobalAction::FocusPrev)
        );
        assert_eq!(
            keymap.resolve(KeyCode::BackTab, KeyModifiers::NONE),
            Some(GlobalAction::FocusPrev)
        );
    }

    #[test]
    fn resize_uses_alt_arrows() {
        let keymap = Keymap::default_bindings();
        assert_eq!(
            keymap.resolve(KeyCode::Right, KeyModifiers::ALT),
            Some(GlobalAction::GrowHorizontal)
        );
        assert_eq!(
            keymap.resolve(KeyCode::Up, KeyModifiers::ALT),
            Some(GlobalAction::ShrinkVertical)
        );
    }

    #[test]
    fn plain_characters_fall_through() {
        let keymap = Keymap::default_bindings();
        assert!(keymap.resolve(KeyCode::Char('x'), KeyModifiers::NONE).is_none());
        assert!(keymap.resolve(KeyCode::Enter, KeyModifiers::NONE).is_none());
    }

    #[test]
    fn rebinding_overrides() {
        let mut keymap = Keymap::default_bindings();
        keymap.bind(
            KeyCode::Char('o'),
            KeyModifiers::CONTROL,
            GlobalAction::ShowPalette,
        );
        assert_eq!(
            keymap.resolve(KeyCode::Char('o'), KeyModifiers::CONTROL),
            Some(GlobalAction::ShowPalette)
        );
    }

    #[test]
    fn global_action_serde_roundtrip() {
        for action in [
            GlobalAction::Quit,
            GlobalAction::ShowPalette,
            GlobalAction::FocusPrev,
            GlobalAction::GrowVertical,
            GlobalAction::CycleTheme,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            let decoded: GlobalAction = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, action);
        }
    }
}
