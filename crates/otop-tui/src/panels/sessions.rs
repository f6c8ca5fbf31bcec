//! Active session table.
//!
//! Mount and every refresh tick fork a worker that reads the session list;
//! the worker installs results through the UI queue. Activating a row
//! publishes the session, and when the row carries a SQL id, the statement
//! as well, so detail panels can follow along.

use std::any::Any;
use std::sync::{Arc, Mutex};

use otop_db::{DbHandle, Session};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::context::{Context, SessionCtx, SqlCtx};
use crate::keys::InputEvent;
use crate::panel::{EmitFn, Panel, PanelCell, PanelId, StatusFn};
use crate::runtime::UiHandle;
use crate::theme::Theme;

const SQL_TEXT_DISPLAY_CHARS: usize = 50;
const PAGE_STEP: usize = 10;

#[derive(Default)]
struct SessionRows {
    sessions: Vec<Session>,
    loaded: bool,
    unmounted: bool,
}

/// Selectable table of user sessions.
pub struct SessionListPanel {
    id: PanelId,
    ui: UiHandle,
    db: DbHandle,
    rows: Arc<Mutex<SessionRows>>,
    table_state: TableState,
    selected: usize,
    emit: Option<EmitFn>,
    status: Option<StatusFn>,
}

impl SessionListPanel {
    /// Create an unmounted panel.
    #[must_use]
    pub fn new(ui: UiHandle, db: DbHandle) -> Self {
        Self {
            id: PanelId::next(),
            ui,
            db,
            rows: Arc::new(Mutex::new(SessionRows::default())),
            table_state: TableState::default(),
            selected: 0,
            emit: None,
            status: None,
        }
    }

    /// Registry factory.
    #[must_use]
    pub fn create(ui: UiHandle, db: DbHandle) -> PanelCell {
        Arc::new(Mutex::new(Self::new(ui, db)))
    }

    fn spawn_load(&self) {
        let ui = self.ui.clone();
        let db = Arc::clone(&self.db);
        let rows = Arc::clone(&self.rows);
        let status = self.status.clone();
        let spawned = std::thread::Builder::new()
            .name("otop-sessions".to_string())
            .spawn(move || match db.active_sessions() {
                Ok(sessions) => {
                    ui.queue_update(move || {
                        let mut rows = rows.lock().expect("session rows lock poisoned");
                        if rows.unmounted {
                            return;
                        }
                        rows.sessions = sessions;
                        rows.loaded = true;
                    });
                }
                Err(error) => {
                    tracing::warn!(target: "otop.panels", %error, "session load failed");
                    if let Some(status) = status {
                        status(error.to_string());
                    }
                }
            });
        if let Err(error) = spawned {
            tracing::error!(target: "otop.panels", %error, "failed to spawn session loader");
        }
    }

    fn row_count(&self) -> usize {
        self.rows.lock().expect("session rows lock poisoned").sessions.len()
    }

    fn activate_selected(&self) {
        let session = {
            let rows = self.rows.lock().expect("session rows lock poisoned");
            rows.sessions.get(self.selected).cloned()
        };
        let (Some(session), Some(emit)) = (session, self.emit.as_ref()) else {
            return;
        };
        emit(Context::Session(SessionCtx {
            session: session.clone(),
        }));
        if !session.sql_id.is_empty() {
            emit(Context::Sql(SqlCtx {
                sql_id: session.sql_id,
                sql_text: session.sql_text,
            }));
        }
    }
}

/// Truncate statement text for the table column.
fn clip_sql_text(text: &str) -> String {
    if text.chars().count() <= SQL_TEXT_DISPLAY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(SQL_TEXT_DISPLAY_CHARS).collect();
    out.push('…');
    out
}

impl Panel for SessionListPanel {
    fn name(&self) -> &'static str {
        "SessionList"
    }

    fn id(&self) -> PanelId {
        self.id
    }

    fn mount(&mut self) {
        self.spawn_load();
    }

    fn refresh(&mut self) {
        self.spawn_load();
    }

    fn unmount(&mut self) {
        self.rows.lock().expect("session rows lock poisoned").unmounted = true;
    }

    fn set_emit_fn(&mut self, emit: EmitFn) {
        self.emit = Some(emit);
    }

    fn set_status_fn(&mut self, status: StatusFn) {
        self.status = Some(status);
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Sessions ")
            .border_style(theme.border_style(focused));

        let rows = self.rows.lock().expect("session rows lock poisoned");
        if !rows.loaded {
            let loading = Paragraph::new("Loading…")
                .style(theme.muted_style())
                .block(block);
            frame.render_widget(loading, area);
            return;
        }

        self.selected = self.selected.min(rows.sessions.len().saturating_sub(1));

        let header = Row::new(
            ["SID", "Username", "Status", "SQL ID", "Wait Event", "SQL Text"]
                .into_iter()
                .map(Cell::from),
        )
        .style(theme.header_style());

        let body = rows.sessions.iter().map(|s| {
            let style = if s.is_active() {
                ratatui::style::Style::default().fg(theme.success)
            } else if s.status == "KILLED" {
                theme.warning_style()
            } else {
                ratatui::style::Style::default().fg(theme.fg)
            };
            Row::new([
                Cell::from(s.sid.to_string()),
                Cell::from(s.username.clone()),
                Cell::from(s.status.clone()),
                Cell::from(s.sql_id.clone()),
                Cell::from(s.wait_event.clone()),
                Cell::from(clip_sql_text(&s.sql_text)),
            ])
            .style(style)
        });

        let widths = [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Fill(1),
            Constraint::Fill(2),
        ];

        let highlight = if focused {
            theme.highlight_style()
        } else {
            ratatui::style::Style::default()
        };

        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .row_highlight_style(highlight);

        self.table_state.select(if rows.sessions.is_empty() {
            None
        } else {
            Some(self.selected)
        });
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        let InputEvent::Key(code, modifiers) = event else {
            return false;
        };
        if *modifiers != KeyModifiers::NONE {
            return false;
        }
        let count = self.row_count();
        match code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                if count > 0 {
                    self.selected = (self.selected + 1).min(count - 1);
                }
                true
            }
            KeyCode::PageUp => {
                self.selected = self.selected.saturating_sub(PAGE_STEP);
                true
            }
            KeyCode::PageDown => {
                if count > 0 {
                    self.selected = (self.selected + PAGE_STEP).min(count - 1);
                }
                true
            }
            KeyCode::Home => {
                self.selected = 0;
                true
            }
            KeyCode::End => {
                self.selected = count.saturating_sub(1);
                true
            }
            KeyCode::Enter => {
                self.activate_selected();
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
