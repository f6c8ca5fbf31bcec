//! SQL scratch editor.
//!
//! A small text area that pre-populates with the statement text whenever a
//! SQL context arrives. Editing is local; nothing is executed.

use std::any::Any;
use std::sync::{Arc, Mutex};

use otop_db::DbHandle;
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::widgets::{Block, Borders, Paragraph};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::context::{Context, ContextKind};
use crate::keys::InputEvent;
use crate::panel::{Panel, PanelCell, PanelId};
use crate::runtime::UiHandle;
use crate::theme::Theme;

/// Editable SQL buffer with a character-indexed cursor.
pub struct QueryEditorPanel {
    id: PanelId,
    buffer: String,
    /// Cursor position in characters from the start of the buffer.
    cursor: usize,
}

impl QueryEditorPanel {
    /// Create an unmounted panel.
    #[must_use]
    pub fn new(_ui: UiHandle, _db: DbHandle) -> Self {
        Self {
            id: PanelId::next(),
            buffer: String::new(),
            cursor: 0,
        }
    }

    /// Registry factory.
    #[must_use]
    pub fn create(ui: UiHandle, db: DbHandle) -> PanelCell {
        Arc::new(Mutex::new(Self::new(ui, db)))
    }

    /// Current buffer contents.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.buffer
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.buffer.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_at(self.cursor - 1);
        self.buffer.remove(at);
        self.cursor -= 1;
    }

    fn delete(&mut self) {
        if self.cursor >= self.char_count() {
            return;
        }
        let at = self.byte_at(self.cursor);
        self.buffer.remove(at);
    }

    /// Cursor position as (column, row) within the text.
    fn cursor_position(&self) -> (u16, u16) {
        let mut col = 0u16;
        let mut row = 0u16;
        for ch in self.buffer.chars().take(self.cursor) {
            if ch == '\n' {
                row = row.saturating_add(1);
                col = 0;
            } else {
                col = col.saturating_add(1);
            }
        }
        (col, row)
    }
}

impl Panel for QueryEditorPanel {
    fn name(&self) -> &'static str {
        "QueryEditor"
    }

    fn id(&self) -> PanelId {
        self.id
    }

    fn subscriptions(&self) -> Vec<ContextKind> {
        vec![ContextKind::Sql]
    }

    fn on_context(&mut self, ctx: &Context) {
        if let Context::Sql(sql) = ctx {
            self.buffer = sql.sql_text.clone();
            self.cursor = self.char_count();
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Query Editor ")
            .border_style(theme.border_style(focused));
        let inner = block.inner(area);

        let view = Paragraph::new(self.buffer.as_str()).block(block);
        frame.render_widget(view, area);

        if focused && inner.width > 0 && inner.height > 0 {
            let (col, row) = self.cursor_position();
            frame.set_cursor_position(Position::new(
                inner.x + col.min(inner.width.saturating_sub(1)),
                inner.y + row.min(inner.height.saturating_sub(1)),
            ));
        }
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        let InputEvent::Key(code, modifiers) = event else {
            return false;
        };
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        match code {
            KeyCode::Char(ch) => {
                self.insert(*ch);
                true
            }
            KeyCode::Enter => {
                self.insert('\n');
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Delete => {
                self.delete();
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_count());
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.char_count();
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use otop_db::MockDb;

    use super::*;
    use crate::context::SqlCtx;

    fn panel() -> QueryEditorPanel {
        let (ui, rx) = UiHandle::new_pair();
        std::mem::forget(rx);
        let db: DbHandle = Arc::new(MockDb::empty());
        QueryEditorPanel::new(ui, db)
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(code, KeyModifiers::NONE)
    }

    #[test]
    fn sql_context_replaces_buffer() {
        let mut panel = panel();
        panel.handle_input(&key(KeyCode::Char('x')));
        panel.on_context(&Context::Sql(SqlCtx {
            sql_id: "abc".to_string(),
            sql_text: "SELECT 1".to_string(),
        }));
        assert_eq!(panel.text(), "SELECT 1");
        assert_eq!(panel.cursor, 8);
    }

    #[test]
    fn session_context_is_ignored() {
        let mut panel = panel();
        panel.on_context(&Context::Session(crate::context::SessionCtx {
            session: otop_db::Session::default(),
        }));
        assert_eq!(panel.text(), "");
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut panel = panel();
        for ch in "SELET".chars() {
            panel.handle_input(&key(KeyCode::Char(ch)));
        }
        // Fix the typo: move left before the T, insert C.
        panel.handle_input(&key(KeyCode::Left));
        panel.handle_input(&key(KeyCode::Char('C')));
        assert_eq!(panel.text(), "SELECT");
    }

    #[test]
    fn backspace_and_delete() {
        let mut panel = panel();
        for ch in "abc".chars() {
            panel.handle_input(&key(KeyCode::Char(ch)));
        }
        panel.handle_input(&key(KeyCode::Backspace));
        assert_eq!(panel.text(), "ab");
        panel.handle_input(&key(KeyCode::Home));
        panel.handle_input(&key(KeyCode::Delete));
        assert_eq!(panel.text(), "b");
    }

    #[test]
    fn enter_inserts_newline_and_cursor_tracks_rows() {
        let mut panel = panel();
        for ch in "ab".chars() {
            panel.handle_input(&key(KeyCode::Char(ch)));
        }
        panel.handle_input(&key(KeyCode::Enter));
        panel.handle_input(&key(KeyCode::Char('c')));
        assert_eq!(panel.text(), "ab\nc");
        assert_eq!(panel.cursor_position(), (1, 1));
    }

    #[test]
    fn control_chords_fall_through() {
        let mut panel = panel();
        let consumed =
            panel.handle_input(&InputEvent::Key(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert!(!consumed);
        assert_eq!(panel.text(), "");
    }

    #[test]
    fn multibyte_text_is_edited_safely() {
        let mut panel = panel();
        panel.on_context(&Context::Sql(SqlCtx {
            sql_id: "abc".to_string(),
            sql_text: "héllo".to_string(),
        }));
        panel.handle_input(&key(KeyCode::Backspace));
        assert_eq!(panel.text(), "héll");
    }
}
