//! Execution plan and statement statistics view.
//!
//! Driven entirely by bus events: a selected statement (or a selected
//! session that is running one) forks a worker that fetches the plan and
//! aggregated statistics, then installs them through the UI queue. The
//! view renders a header, a statistics block when present, and the plan
//! indented by depth.

use std::any::Any;
use std::sync::{Arc, Mutex};

use otop_db::{DbHandle, PlanRow, SqlStats};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::context::{Context, ContextKind};
use crate::keys::InputEvent;
use crate::panel::{Panel, PanelCell, PanelId, StatusFn};
use crate::runtime::UiHandle;
use crate::theme::Theme;

const SCROLL_PAGE: u16 = 10;

#[derive(Default)]
struct SqlDetailContent {
    sql_id: String,
    sql_text: String,
    plan: Vec<PlanRow>,
    stats: Option<SqlStats>,
    loaded: bool,
    unmounted: bool,
}

/// Scrollable plan / statistics pane.
pub struct SqlDetailPanel {
    id: PanelId,
    ui: UiHandle,
    db: DbHandle,
    content: Arc<Mutex<SqlDetailContent>>,
    scroll: u16,
    status: Option<StatusFn>,
}

impl SqlDetailPanel {
    /// Create an unmounted panel.
    #[must_use]
    pub fn new(ui: UiHandle, db: DbHandle) -> Self {
        Self {
            id: PanelId::next(),
            ui,
            db,
            content: Arc::new(Mutex::new(SqlDetailContent::default())),
            scroll: 0,
            status: None,
        }
    }

    /// Registry factory.
    #[must_use]
    pub fn create(ui: UiHandle, db: DbHandle) -> PanelCell {
        Arc::new(Mutex::new(Self::new(ui, db)))
    }

    fn spawn_fetch(&self, sql_id: String, sql_text: String) {
        let ui = self.ui.clone();
        let db = Arc::clone(&self.db);
        let content = Arc::clone(&self.content);
        let status = self.status.clone();
        let spawned = std::thread::Builder::new()
            .name("otop-sql-detail".to_string())
            .spawn(move || {
                let plan = match db.execution_plan(&sql_id) {
                    Ok(plan) => plan,
                    Err(error) => {
                        tracing::warn!(target: "otop.panels", %error, sql_id, "plan fetch failed");
                        if let Some(status) = &status {
                            status(error.to_string());
                        }
                        Vec::new()
                    }
                };
                let stats = match db.sql_stats(&sql_id) {
                    Ok(stats) => stats,
                    Err(error) => {
                        tracing::warn!(target: "otop.panels", %error, sql_id, "stats fetch failed");
                        if let Some(status) = &status {
                            status(error.to_string());
                        }
                        None
                    }
                };
                ui.queue_update(move || {
                    let mut content = content.lock().expect("sql detail lock poisoned");
                    if content.unmounted {
                        return;
                    }
                    content.sql_id = sql_id;
                    content.sql_text = sql_text;
                    content.plan = plan;
                    content.stats = stats;
                    content.loaded = true;
                });
            });
        if let Err(error) = spawned {
            tracing::error!(target: "otop.panels", %error, "failed to spawn sql detail fetch");
        }
    }

    fn build_lines(content: &SqlDetailContent, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("SQL ID: ", theme.header_style()),
            Span::raw(content.sql_id.clone()),
        ]));
        lines.push(Line::default());

        if !content.sql_text.is_empty() {
            lines.push(Line::from(Span::styled("SQL Text:", theme.header_style())));
            for text_line in content.sql_text.lines() {
                lines.push(Line::from(text_line.to_string()));
            }
            lines.push(Line::default());
        }

        if let Some(stats) = &content.stats {
            lines.push(Line::from(Span::styled("Statistics:", theme.header_style())));
            lines.push(Line::from(format!("  Executions:    {}", stats.executions)));
            lines.push(Line::from(format!(
                "  Elapsed (µs):  {}",
                stats.elapsed_time_micros
            )));
            lines.push(Line::from(format!(
                "  CPU (µs):      {}",
                stats.cpu_time_micros
            )));
            lines.push(Line::from(format!("  Buffer Gets:   {}", stats.buffer_gets)));
            lines.push(Line::from(format!("  Disk Reads:    {}", stats.disk_reads)));
            lines.push(Line::from(format!("  Rows:          {}", stats.rows)));
            lines.push(Line::default());
        }

        if !content.plan.is_empty() {
            lines.push(Line::from(Span::styled(
                "Execution Plan:",
                theme.header_style(),
            )));
            for row in &content.plan {
                let depth = usize::try_from(row.depth).unwrap_or(0);
                lines.push(Line::from(format!(
                    "  {}{}",
                    "  ".repeat(depth),
                    row.describe()
                )));
            }
        }

        lines
    }
}

impl Panel for SqlDetailPanel {
    fn name(&self) -> &'static str {
        "SQLDetail"
    }

    fn id(&self) -> PanelId {
        self.id
    }

    fn subscriptions(&self) -> Vec<ContextKind> {
        vec![ContextKind::Session, ContextKind::Sql]
    }

    fn on_context(&mut self, ctx: &Context) {
        match ctx {
            Context::Sql(sql) => {
                self.scroll = 0;
                self.spawn_fetch(sql.sql_id.clone(), sql.sql_text.clone());
            }
            Context::Session(session) => {
                let session = &session.session;
                if !session.sql_id.is_empty() {
                    self.scroll = 0;
                    self.spawn_fetch(session.sql_id.clone(), session.sql_text.clone());
                }
            }
        }
    }

    fn unmount(&mut self) {
        self.content.lock().expect("sql detail lock poisoned").unmounted = true;
    }

    fn set_status_fn(&mut self, status: StatusFn) {
        self.status = Some(status);
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" SQL Detail ")
            .border_style(theme.border_style(focused));

        let content = self.content.lock().expect("sql detail lock poisoned");
        if !content.loaded {
            let hint = Paragraph::new("Select a session or statement to inspect its plan")
                .style(theme.muted_style())
                .block(block);
            frame.render_widget(hint, area);
            return;
        }

        let lines = Self::build_lines(&content, theme);
        let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
        self.scroll = self.scroll.min(max_scroll);

        let view = Paragraph::new(lines)
            .block(block)
            .scroll((self.scroll, 0));
        frame.render_widget(view, area);
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        let InputEvent::Key(code, modifiers) = event else {
            return false;
        };
        if *modifiers != KeyModifiers::NONE {
            return false;
        }
        match code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                true
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(SCROLL_PAGE);
                true
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(SCROLL_PAGE);
                true
            }
            KeyCode::Home => {
                self.scroll = 0;
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
    use std::time::Duration;

    use otop_db::{MockDb, Session};

    use super::*;
    use crate::context::{SessionCtx, SqlCtx};
    use crate::runtime::UiMessage;

    fn panel() -> (SqlDetailPanel, std::sync::mpsc::Receiver<UiMessage>) {
        let (ui, rx) = UiHandle::new_pair();
        let db: DbHandle = Arc::new(MockDb::sample());
        (SqlDetailPanel::new(ui, db), rx)
    }

    fn drain_one_invoke(rx: &std::sync::mpsc::Receiver<UiMessage>) {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while std::time::Instant::now() < deadline {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(UiMessage::Invoke(task)) => {
                    task();
                    return;
                }
                Ok(_) => {}
                Err(_) => {}
            }
        }
        panic!("worker never queued its install");
    }

    #[test]
    fn sql_context_triggers_fetch() {
        let (mut panel, rx) = panel();
        panel.on_context(&Context::Sql(SqlCtx {
            sql_id: "9babjv8yq8ru3".to_string(),
            sql_text: "SELECT e.ename FROM emp e".to_string(),
        }));
        drain_one_invoke(&rx);

        let content = panel.content.lock().unwrap();
        assert!(content.loaded);
        assert_eq!(content.sql_id, "9babjv8yq8ru3");
        assert!(!content.plan.is_empty());
        assert!(content.stats.is_some());
    }

    #[test]
    fn session_context_with_sql_id_triggers_fetch() {
        let (mut panel, rx) = panel();
        panel.on_context(&Context::Session(SessionCtx {
            session: Session {
                sql_id: "f7xp2k0q1m9zc".to_string(),
                sql_text: "UPDATE orders ...".to_string(),
                ..Session::default()
            },
        }));
        drain_one_invoke(&rx);
        assert_eq!(panel.content.lock().unwrap().sql_id, "f7xp2k0q1m9zc");
    }

    #[test]
    fn idle_session_context_is_ignored() {
        let (mut panel, rx) = panel();
        panel.on_context(&Context::Session(SessionCtx {
            session: Session::default(),
        }));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(!panel.content.lock().unwrap().loaded);
    }

    #[test]
    fn unknown_sql_id_still_renders_header() {
        let (mut panel, rx) = panel();
        panel.on_context(&Context::Sql(SqlCtx {
            sql_id: "zzzzzzzzzzzzz".to_string(),
            sql_text: String::new(),
        }));
        drain_one_invoke(&rx);

        let content = panel.content.lock().unwrap();
        assert!(content.loaded);
        assert!(content.plan.is_empty());
        assert!(content.stats.is_none());
        let lines = SqlDetailPanel::build_lines(&content, &Theme::dark());
        assert!(lines[0].spans.iter().any(|s| s.content.contains("SQL ID")));
    }

    #[test]
    fn plan_lines_are_indented_by_depth() {
        let content = SqlDetailContent {
            sql_id: "abc".to_string(),
            plan: vec![
                PlanRow {
                    id: 0,
                    depth: 0,
                    operation: "SELECT STATEMENT".to_string(),
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 1,
                    depth: 2,
                    operation: "TABLE ACCESS".to_string(),
                    options: "FULL".to_string(),
                    object_name: "EMP".to_string(),
                    ..PlanRow::default()
                },
            ],
            loaded: true,
            ..SqlDetailContent::default()
        };
        let lines = SqlDetailPanel::build_lines(&content, &Theme::dark());
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(rendered.contains(&"  SELECT STATEMENT".to_string()));
        assert!(rendered.contains(&"      TABLE ACCESS FULL [EMP]".to_string()));
    }

    #[test]
    fn scrolling_clamps_at_top() {
        let (mut panel, _rx) = panel();
        assert!(panel.handle_input(&InputEvent::Key(KeyCode::Up, KeyModifiers::NONE)));
        assert_eq!(panel.scroll, 0);
        panel.handle_input(&InputEvent::Key(KeyCode::PageDown, KeyModifiers::NONE));
        assert_eq!(panel.scroll, SCROLL_PAGE);
        panel.handle_input(&InputEvent::Key(KeyCode::Home, KeyModifiers::NONE));
        assert_eq!(panel.scroll, 0);
    }

    #[test]
    fn subscribes_to_both_kinds() {
        let (panel, _rx) = panel();
        assert_eq!(
            panel.subscriptions(),
            vec![ContextKind::Session, ContextKind::Sql]
        );
        assert_eq!(panel.name(), "SQLDetail");
    }
}
