//! Command palette: modal overlay for opening panels.
//!
//! Shows the registered panel types with incremental substring filtering.
//! Confirming a row hands the chosen entry back to the app, which opens it
//! next to the focused pane of the active workflow; dismissal restores the
//! focus captured when the palette opened.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::keys::InputEvent;
use crate::panel::{PanelEntry, PanelId};

/// What the app should do after the palette consumed an event.
#[derive(Debug)]
pub enum PaletteOutcome {
    /// Event handled; nothing further.
    Consumed,
    /// Palette dismissed; restore the prior focus.
    Dismissed {
        /// Focus captured when the palette opened.
        prior_focus: Option<PanelId>,
    },
    /// A panel type was chosen; the palette is already hidden.
    Open(PanelEntry),
}

/// Modal list over the panel registry.
pub struct PanelPalette {
    visible: bool,
    query: String,
    selected: usize,
    entries: Vec<PanelEntry>,
    prior_focus: Option<PanelId>,
}

impl PanelPalette {
    /// A hidden, empty palette.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            visible: false,
            query: String::new(),
            selected: 0,
            entries: Vec::new(),
            prior_focus: None,
        }
    }

    /// Open the palette over a snapshot of the registry, remembering the
    /// focus to restore on dismissal.
    pub fn show(&mut self, entries: Vec<PanelEntry>, prior_focus: Option<PanelId>) {
        self.entries = entries;
        self.prior_focus = prior_focus;
        self.query.clear();
        self.selected = 0;
        self.visible = true;
    }

    /// Hide the palette, handing back the captured focus.
    pub fn hide(&mut self) -> Option<PanelId> {
        self.visible = false;
        self.query.clear();
        self.selected = 0;
        self.prior_focus.take()
    }

    /// Whether the overlay is currently shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current filter text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Selected index within the filtered list.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Entries matching the filter, in registration order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&PanelEntry> {
        if self.query.is_empty() {
            return self.entries.iter().collect();
        }
        let needle = self.query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.type_name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn select_next(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    fn select_prev(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.selected = self.selected.checked_sub(1).unwrap_or(count - 1);
        }
    }

    /// Handle an input event while visible.
    pub fn handle_input(&mut self, event: &InputEvent) -> PaletteOutcome {
        let InputEvent::Key(code, modifiers) = event else {
            return PaletteOutcome::Consumed;
        };
        match code {
            KeyCode::Esc => PaletteOutcome::Dismissed {
                prior_focus: self.hide(),
            },
            KeyCode::Up => {
                self.select_prev();
                PaletteOutcome::Consumed
            }
            KeyCode::Down => {
                self.select_next();
                PaletteOutcome::Consumed
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.selected = 0;
                PaletteOutcome::Consumed
            }
            KeyCode::Enter => {
                let chosen = self.filtered().get(self.selected).copied().copied();
                match chosen {
                    Some(entry) => {
                        self.hide();
                        PaletteOutcome::Open(entry)
                    }
                    None => PaletteOutcome::Consumed,
                }
            }
            KeyCode::Char(ch)
                if modifiers.is_empty() || *modifiers == KeyModifiers::SHIFT =>
            {
                self.query.push(*ch);
                self.selected = 0;
                PaletteOutcome::Consumed
            }
            _ => PaletteOutcome::Consumed,
        }
    }
}

impl Default for PanelPalette {
    fn default() -> Self {
        Self::new()
    }
}
