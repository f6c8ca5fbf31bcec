//! Application wiring: global dispatch, overlays, render root, message pump.
//!
//! The binary owns the terminal and the event loop; [`App`] owns everything
//! behind it. Keystrokes resolve against the global keymap first and fall
//! through to the focused panel; messages queued by workers and tickers are
//! drained on the UI thread between input polls.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use otop_db::DbHandle;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction as LayoutDirection, Layout};
use ratatui::widgets::{Block, Paragraph};

use crate::keys::{GlobalAction, InputEvent, Keymap};
use crate::layout::Direction;
use crate::manager::WorkflowManager;
use crate::overlays;
use crate::palette::{PaletteOutcome, PanelPalette};
use crate::panel::{PanelEntry, PanelRegistry};
use crate::panels::register_builtin;
use crate::runtime::{UiHandle, UiMessage};
use crate::statusbar::StatusBar;
use crate::theme::Theme;
use crate::workflow::Workflow;

/// Default refresh cadence; overridable via `--refresh` or
/// `OTOP_REFRESH_INTERVAL`.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Top-level application state.
pub struct App {
    ui: UiHandle,
    rx: Receiver<UiMessage>,
    db: DbHandle,
    registry: Arc<PanelRegistry>,
    manager: WorkflowManager,
    palette: PanelPalette,
    status: StatusBar,
    theme: Theme,
    keymap: Keymap,
    help_visible: bool,
    should_quit: bool,
}

impl App {
    /// Assemble the dashboard: registry, status bar, and the seed
    /// workflows ("Sessions" with the session table, "Analysis" with the
    /// table and the SQL detail pane side by side).
    #[must_use]
    pub fn new(db: DbHandle, refresh_interval: Duration) -> Self {
        let (ui, rx) = UiHandle::new_pair();
        let registry = Arc::new(PanelRegistry::new());
        register_builtin(&registry);
        let status = StatusBar::new(ui.clone());

        let mut manager = WorkflowManager::new();

        let mut sessions =
            Workflow::new("Sessions", ui.clone(), status.clone(), refresh_interval);
        if let Some(entry) = registry.get("SessionList") {
            let cell = (entry.factory)(ui.clone(), Arc::clone(&db));
            sessions.add_panel(cell, None, Direction::Horizontal);
        }

        let mut analysis =
            Workflow::new("Analysis", ui.clone(), status.clone(), refresh_interval);
        if let Some(entry) = registry.get("SessionList") {
            let cell = (entry.factory)(ui.clone(), Arc::clone(&db));
            analysis.add_panel(cell, None, Direction::Horizontal);
            let target = analysis.focused_panel_id();
            if let Some(detail) = registry.get("SQLDetail") {
                let cell = (detail.factory)(ui.clone(), Arc::clone(&db));
                analysis.add_panel(cell, target, Direction::Vertical);
            }
        }

        manager.add_workflow(sessions);
        manager.add_workflow(analysis);

        Self {
            ui,
            rx,
            db,
            registry,
            manager,
            palette: PanelPalette::new(),
            status,
            theme: Theme::dark(),
            keymap: Keymap::default_bindings(),
            help_visible: false,
            should_quit: false,
        }
    }

    /// Whether the event loop should exit.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// A clone of the UI handle (workers and tests queue through it).
    #[must_use]
    pub fn ui_handle(&self) -> UiHandle {
        self.ui.clone()
    }

    /// The workflow manager.
    #[must_use]
    pub const fn manager(&self) -> &WorkflowManager {
        &self.manager
    }

    /// Mutable access to the workflow manager.
    pub fn manager_mut(&mut self) -> &mut WorkflowManager {
        &mut self.manager
    }

    /// The command palette.
    #[must_use]
    pub const fn palette(&self) -> &PanelPalette {
        &self.palette
    }

    /// The status bar.
    #[must_use]
    pub const fn status(&self) -> &StatusBar {
        &self.status
    }

    /// Process one input event. Returns `true` when the app should quit.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.palette.is_visible() {
            match self.palette.handle_input(event) {
                PaletteOutcome::Open(entry) => self.open_panel(entry),
                PaletteOutcome::Dismissed { prior_focus } => {
                    if let (Some(prior), Some(workflow)) =
                        (prior_focus, self.manager.active_workflow_mut())
                    {
                        workflow.focus_panel(prior);
                    }
                }
                PaletteOutcome::Consumed => {}
            }
            return false;
        }

        if self.help_visible {
            if let InputEvent::Key(code, modifiers) = event
                && matches!(
                    self.keymap.resolve(*code, *modifiers),
                    Some(GlobalAction::Dismiss | GlobalAction::ToggleHelp)
                )
            {
                self.help_visible = false;
            }
            return false;
        }

        if let InputEvent::Key(code, modifiers) = event
            && let Some(action) = self.keymap.resolve(*code, *modifiers)
        {
            return self.apply_action(action);
        }

        if let Some(workflow) = self.manager.active_workflow_mut() {
            workflow.handle_panel_input(event);
        }
        false
    }

    fn apply_action(&mut self, action: GlobalAction) -> bool {
        match action {
            GlobalAction::Quit => {
                self.should_quit = true;
                return true;
            }
            GlobalAction::ShowPalette => {
                let prior = self
                    .manager
                    .active_workflow()
                    .and_then(Workflow::focused_panel_id);
                self.palette.show(self.registry.all(), prior);
            }
            GlobalAction::ClosePanel => {
                if let Some(workflow) = self.manager.active_workflow_mut()
                    && let Some(focused) = workflow.focused_panel_id()
                {
                    workflow.remove_panel(focused);
                }
            }
            GlobalAction::NextWorkflow => self.manager.switch_next(),
            GlobalAction::PrevWorkflow => self.manager.switch_prev(),
            GlobalAction::FocusNext => {
                if let Some(workflow) = self.manager.active_workflow_mut() {
                    workflow.focus_cycle(false);
                }
            }
            GlobalAction::FocusPrev => {
                if let Some(workflow) = self.manager.active_workflow_mut() {
                    workflow.focus_cycle(true);
                }
            }
            GlobalAction::GrowHorizontal => self.resize_focused(Direction::Horizontal, 1),
            GlobalAction::ShrinkHorizontal => self.resize_focused(Direction::Horizontal, -1),
            GlobalAction::GrowVertical => self.resize_focused(Direction::Vertical, 1),
            GlobalAction::ShrinkVertical => self.resize_focused(Direction::Vertical, -1),
            GlobalAction::CycleTheme => {
                self.theme = Theme::from_preset(self.theme.preset.next());
            }
            GlobalAction::ToggleHelp => self.help_visible = true,
            GlobalAction::Dismiss => {}
        }
        false
    }

    fn resize_focused(&mut self, dir: Direction, delta: i32) {
        if let Some(workflow) = self.manager.active_workflow_mut() {
            workflow.resize_focused(dir, delta);
        }
    }

    /// Open a fresh panel of the given type next to the focused pane of
    /// the active workflow. Discarded when no workflow is active.
    fn open_panel(&mut self, entry: PanelEntry) {
        let ui = self.ui.clone();
        let db = Arc::clone(&self.db);
        let Some(workflow) = self.manager.active_workflow_mut() else {
            return;
        };
        let cell = (entry.factory)(ui, db);
        let target = workflow.focused_panel_id();
        workflow.add_panel(cell, target, Direction::Vertical);
    }

    /// Apply one queued message on the UI thread.
    pub fn on_message(&mut self, msg: UiMessage) {
        match msg {
            UiMessage::Invoke(task) => task(),
            UiMessage::Tick(workflow_id) => {
                if let Some(workflow) = self.manager.active_workflow_mut()
                    && workflow.id() == workflow_id
                {
                    workflow.refresh_panels();
                }
            }
            UiMessage::Redraw => {}
        }
    }

    /// Drain every message currently queued.
    pub fn pump_messages(&mut self) {
        loop {
            let msg = match self.rx.try_recv() {
                Ok(msg) => msg,
                Err(_) => return,
            };
            self.on_message(msg);
        }
    }

    /// Keep applying messages until the queue stays quiet for `idle`.
    /// Used by tests to wait for worker results deterministically.
    pub fn pump_until_idle(&mut self, idle: Duration) {
        loop {
            let msg = match self.rx.recv_timeout(idle) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return,
            };
            self.on_message(msg);
        }
    }

    /// Draw one frame: tab bar, active workflow, status bar, overlays.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.theme.base_style()), area);
        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.manager.render_tab_bar(frame, rows[0], &self.theme);

        let theme = self.theme;
        if let Some(workflow) = self.manager.active_workflow_mut() {
            workflow.render(frame, rows[1], &theme);
        } else {
            frame.render_widget(
                Paragraph::new("No workflows").style(theme.muted_style()),
                rows[1],
            );
        }

        self.status.render(frame, rows[2], &self.theme);

        overlays::render_palette(frame, area, &self.palette, &self.theme);
        if self.help_visible {
            overlays::render_help(frame, area, &self.theme);
        }
    }

    /// Stop tickers and unmount every panel. Called once on exit.
    pub fn shutdown(&mut self) {
        self.manager.shutdown_all();
    }
}
