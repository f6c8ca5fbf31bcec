//! Workflows: named, tab-addressable workspaces.
//!
//! A workflow owns one layout tree, one context bus, and one refresh
//! ticker, and mediates everything panel-related: insertion and removal,
//! subscription wiring, focus, resize. All of its structures are mutated
//! only on the UI thread; the ticker runs off-thread and merely posts
//! ticks back through the UI queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::context::{Bus, Context, ContextKind, Subscription};
use crate::keys::InputEvent;
use crate::layout::{Direction, LayoutNode};
use crate::panel::{PanelCell, PanelId};
use crate::runtime::UiHandle;
use crate::statusbar::StatusBar;
use crate::theme::Theme;

// ─── Identity ───────────────────────────────────────────────────────────────

/// Process-unique workflow handle, used to route ticker ticks back to the
/// workflow that scheduled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkflowId(u64);

impl WorkflowId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "workflow#{}", self.0)
    }
}

// ─── Ticker ─────────────────────────────────────────────────────────────────

struct Ticker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

// ─── Workflow ───────────────────────────────────────────────────────────────

/// One tabbed workspace: layout tree + bus + refresh ticker.
pub struct Workflow {
    id: WorkflowId,
    name: String,
    ui: UiHandle,
    bus: Bus,
    root: LayoutNode,
    panels: Vec<(PanelId, PanelCell)>,
    subs: HashMap<PanelId, Vec<Subscription>>,
    focus_order: Vec<PanelId>,
    focus_idx: usize,
    refresh_interval: Duration,
    ticker: Option<Ticker>,
    status: StatusBar,
    active: bool,
}

impl Workflow {
    /// Create an empty workflow.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ui: UiHandle,
        status: StatusBar,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            id: WorkflowId::next(),
            name: name.into(),
            ui,
            bus: Bus::new(),
            root: LayoutNode::empty_root(),
            panels: Vec::new(),
            subs: HashMap::new(),
            focus_order: Vec::new(),
            focus_idx: 0,
            refresh_interval,
            ticker: None,
            status,
            active: false,
        }
    }

    /// Stable identity handle.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.id
    }

    /// Tab label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this workflow currently owns the active tab slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the refresh ticker is currently running.
    #[must_use]
    pub const fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Insert `cell` into the layout and wire it up.
    ///
    /// The leaf lands next to `split_target` along `dir`; with no target
    /// (or an unknown one, or an empty layout) it is appended to the root
    /// split. Subscriptions, the emit capability, and the status capability
    /// are wired before `mount`, and focus moves to the new panel.
    pub fn add_panel(&mut self, cell: PanelCell, split_target: Option<PanelId>, dir: Direction) {
        let (panel_id, panel_name, kinds) = {
            let panel = cell.lock().expect("panel mutex poisoned");
            (panel.id(), panel.name(), panel.subscriptions())
        };

        let leaf = LayoutNode::leaf(panel_id, panel_name);
        match split_target {
            Some(target) if self.root.child_count() > 0 => {
                if !self.root.insert_near_target(target, &leaf, dir) {
                    self.root.add_child(leaf, 1);
                }
            }
            _ => self.root.add_child(leaf, 1),
        }

        let mut handles = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let subscriber = Arc::clone(&cell);
            handles.push(self.bus.subscribe(kind, move |ctx| {
                subscriber
                    .lock()
                    .expect("panel mutex poisoned")
                    .on_context(ctx);
            }));
        }
        self.subs.insert(panel_id, handles);

        {
            let mut panel = cell.lock().expect("panel mutex poisoned");
            let bus = self.bus.clone();
            panel.set_emit_fn(Arc::new(move |ctx| bus.emit(&ctx)));
            let status = self.status.clone();
            panel.set_status_fn(Arc::new(move |msg| status.error(msg)));
        }

        self.panels.push((panel_id, Arc::clone(&cell)));
        cell.lock().expect("panel mutex poisoned").mount();
        self.rebuild();
        self.focus_panel(panel_id);
        tracing::debug!(
            target: "otop.workflow",
            workflow = %self.id,
            panel = %panel_id,
            name = panel_name,
            "panel added"
        );
    }

    /// Remove the panel displaying `panel_id`: cancel its subscriptions,
    /// prune and collapse the tree, unmount it, and clamp focus.
    pub fn remove_panel(&mut self, panel_id: PanelId) {
        if let Some(handles) = self.subs.remove(&panel_id) {
            for handle in handles {
                handle.cancel();
            }
        }

        let cell = self
            .panels
            .iter()
            .position(|(id, _)| *id == panel_id)
            .map(|pos| self.panels.remove(pos).1);

        self.root.remove_child(panel_id);
        self.root.collapse();

        if let Some(cell) = cell {
            cell.lock().expect("panel mutex poisoned").unmount();
        }
        self.rebuild();
        tracing::debug!(
            target: "otop.workflow",
            workflow = %self.id,
            panel = %panel_id,
            "panel removed"
        );
    }

    /// Publish a context on this workflow's bus.
    pub fn emit(&self, ctx: &Context) {
        self.bus.emit(ctx);
    }

    /// Live bus registrations for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: ContextKind) -> usize {
        self.bus.subscriber_count(kind)
    }

    /// Move focus forward (or backward) through the leaf order.
    pub fn focus_cycle(&mut self, reverse: bool) {
        if self.focus_order.is_empty() {
            return;
        }
        let len = self.focus_order.len();
        self.focus_idx = if reverse {
            self.focus_idx.checked_sub(1).unwrap_or(len - 1)
        } else {
            (self.focus_idx + 1) % len
        };
    }

    /// Focus the pane displaying `panel_id` if it is in the layout.
    pub fn focus_panel(&mut self, panel_id: PanelId) {
        if let Some(pos) = self.focus_order.iter().position(|id| *id == panel_id) {
            self.focus_idx = pos;
        }
    }

    /// The focused panel, or `None` on an empty layout.
    #[must_use]
    pub fn focused_panel_id(&self) -> Option<PanelId> {
        self.focus_order.get(self.focus_idx).copied()
    }

    /// Depth-first leaf order driving focus cycling.
    #[must_use]
    pub fn focus_order(&self) -> &[PanelId] {
        &self.focus_order
    }

    /// Panels currently in this workflow, in insertion order.
    #[must_use]
    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.iter().map(|(id, _)| *id).collect()
    }

    /// Number of panels.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Look up a panel cell by id.
    #[must_use]
    pub fn panel(&self, panel_id: PanelId) -> Option<&PanelCell> {
        self.panels
            .iter()
            .find(|(id, _)| *id == panel_id)
            .map(|(_, cell)| cell)
    }

    /// Resize the focused pane by `delta` along `dir`. A pane whose
    /// containing split runs the other way is deliberately left alone.
    pub fn resize_focused(&mut self, dir: Direction, delta: i32) {
        let Some(target) = self.focused_panel_id() else {
            return;
        };
        self.root.resize_leaf(target, dir, delta);
    }

    /// Start the refresh ticker. Idempotent; called by the manager when
    /// this workflow enters the active tab slot.
    pub fn start(&mut self) {
        self.active = true;
        if self.ticker.is_some() {
            return;
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ui = self.ui.clone();
        let workflow_id = self.id;
        let interval = self.refresh_interval;
        let spawned = std::thread::Builder::new()
            .name(format!("otop-ticker-{}", self.name))
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => ui.post_tick(workflow_id),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });
        match spawned {
            Ok(handle) => {
                self.ticker = Some(Ticker {
                    stop: stop_tx,
                    handle,
                });
            }
            Err(error) => {
                tracing::error!(target: "otop.workflow", %error, "failed to spawn ticker");
            }
        }
    }

    /// Stop the refresh ticker. Idempotent; called by the manager when
    /// this workflow leaves the active tab slot.
    pub fn stop(&mut self) {
        self.active = false;
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.stop.send(());
            let _ = ticker.handle.join();
        }
    }

    /// Run one refresh pass over every panel. Invoked on the UI thread
    /// when one of this workflow's ticks is drained from the queue.
    pub fn refresh_panels(&mut self) {
        for (_, cell) in &self.panels {
            cell.lock().expect("panel mutex poisoned").refresh();
        }
    }

    /// Stop the ticker and unmount every panel. Called once when the
    /// application shuts down.
    pub fn shutdown(&mut self) {
        self.stop();
        for (panel_id, _) in &self.panels {
            if let Some(handles) = self.subs.remove(panel_id) {
                for handle in handles {
                    handle.cancel();
                }
            }
        }
        for (_, cell) in self.panels.drain(..) {
            cell.lock().expect("panel mutex poisoned").unmount();
        }
        self.root = LayoutNode::empty_root();
        self.rebuild();
    }

    /// Forward an input event to the focused panel.
    pub fn handle_panel_input(&mut self, event: &InputEvent) -> bool {
        let Some(panel_id) = self.focused_panel_id() else {
            return false;
        };
        let Some(cell) = self.panel(panel_id) else {
            return false;
        };
        let cell = Arc::clone(cell);
        cell.lock()
            .expect("panel mutex poisoned")
            .handle_input(event)
    }

    /// Draw this workflow's tree into `area`.
    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        if self.focus_order.is_empty() {
            let placeholder = Paragraph::new("No panels open. Press Ctrl-P to add one.")
                .style(theme.muted_style())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(theme.border_style(false)),
                );
            frame.render_widget(placeholder, area);
            return;
        }

        let focused = self.focused_panel_id();
        for (panel_id, rect) in self.root.split_areas(area) {
            if let Some(cell) = self.panel(panel_id) {
                let cell = Arc::clone(cell);
                cell.lock().expect("panel mutex poisoned").render(
                    frame,
                    rect,
                    self.active && focused == Some(panel_id),
                    theme,
                );
            }
        }
    }

    /// Recompute the focus order after a tree mutation, keeping the focus
    /// index inside the new order.
    fn rebuild(&mut self) {
        self.focus_order = self.root.focus_order();
        if self.focus_idx >= self.focus_order.len() {
            self.focus_idx = self.focus_order.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::context::{SqlCtx, SessionCtx};
    use crate::panel::Panel;
    use crate::runtime::UiMessage;

    #[derive(Default)]
    struct Counters {
        mounted: AtomicUsize,
        unmounted: AtomicUsize,
        refreshed: AtomicUsize,
        contexts: Mutex<Vec<Context>>,
    }

    struct TestPanel {
        id: PanelId,
        kinds: Vec<ContextKind>,
        counters: Arc<Counters>,
    }

    impl TestPanel {
        fn cell(kinds: Vec<ContextKind>) -> (PanelCell, PanelId, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let id = PanelId::next();
            let cell: PanelCell = Arc::new(Mutex::new(Self {
                id,
                kinds,
                counters: Arc::clone(&counters),
            }));
            (cell, id, counters)
        }
    }

    impl Panel for TestPanel {
        fn name(&self) -> &'static str {
            "TestPanel"
        }

        fn id(&self) -> PanelId {
            self.id
        }

        fn subscriptions(&self) -> Vec<ContextKind> {
            self.kinds.clone()
        }

        fn on_context(&mut self, ctx: &Context) {
            self.counters.contexts.lock().unwrap().push(ctx.clone());
        }

        fn refresh(&mut self) {
            self.counters.refreshed.fetch_add(1, Ordering::SeqCst);
        }

        fn mount(&mut self) {
            self.counters.mounted.fetch_add(1, Ordering::SeqCst);
        }

        fn unmount(&mut self) {
            self.counters.unmounted.fetch_add(1, Ordering::SeqCst);
        }

        fn render(&mut self, _: &mut Frame<'_>, _: Rect, _: bool, _: &Theme) {}

        fn handle_input(&mut self, _: &InputEvent) -> bool {
            false
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn workflow() -> (Workflow, std::sync::mpsc::Receiver<UiMessage>) {
        let (ui, rx) = UiHandle::new_pair();
        let status = StatusBar::new(ui.clone());
        (
            Workflow::new("Test", ui, status, Duration::from_millis(25)),
            rx,
        )
    }

    fn sql_ctx() -> Context {
        Context::Sql(SqlCtx {
            sql_id: "abc".to_string(),
            sql_text: "SELECT 1".to_string(),
        })
    }

    #[test]
    fn add_panel_mounts_subscribes_and_focuses() {
        let (mut w, _rx) = workflow();
        let (cell, id, counters) = TestPanel::cell(vec![ContextKind::Sql]);
        w.add_panel(cell, None, Direction::Horizontal);

        assert_eq!(counters.mounted.load(Ordering::SeqCst), 1);
        assert_eq!(w.subscriber_count(ContextKind::Sql), 1);
        assert_eq!(w.focused_panel_id(), Some(id));
        assert_eq!(w.panel_count(), 1);

        w.emit(&sql_ctx());
        assert_eq!(counters.contexts.lock().unwrap().len(), 1);
    }

    #[test]
    fn remove_panel_unsubscribes_and_unmounts_once() {
        let (mut w, _rx) = workflow();
        let (cell, id, counters) = TestPanel::cell(vec![ContextKind::Sql, ContextKind::Session]);
        w.add_panel(cell, None, Direction::Horizontal);
        assert_eq!(w.subscriber_count(ContextKind::Sql), 1);
        assert_eq!(w.subscriber_count(ContextKind::Session), 1);

        w.remove_panel(id);

        assert_eq!(counters.unmounted.load(Ordering::SeqCst), 1);
        assert_eq!(w.subscriber_count(ContextKind::Sql), 0);
        assert_eq!(w.subscriber_count(ContextKind::Session), 0);
        assert_eq!(w.panel_count(), 0);
        assert!(w.focused_panel_id().is_none());

        w.emit(&sql_ctx());
        assert!(counters.contexts.lock().unwrap().is_empty());
    }

    #[test]
    fn emit_forwards_only_subscribed_kinds() {
        let (mut w, _rx) = workflow();
        let (cell, _, counters) = TestPanel::cell(vec![ContextKind::Session]);
        w.add_panel(cell, None, Direction::Horizontal);

        w.emit(&sql_ctx());
        assert!(counters.contexts.lock().unwrap().is_empty());

        w.emit(&Context::Session(SessionCtx {
            session: otop_db::Session::default(),
        }));
        assert_eq!(counters.contexts.lock().unwrap().len(), 1);
    }

    #[test]
    fn focus_cycles_forward_and_backward_with_wrap() {
        let (mut w, _rx) = workflow();
        let ids: Vec<PanelId> = (0..3)
            .map(|_| {
                let (cell, id, _) = TestPanel::cell(Vec::new());
                w.add_panel(cell, None, Direction::Horizontal);
                id
            })
            .collect();

        // add_panel left focus on the last panel.
        assert_eq!(w.focused_panel_id(), Some(ids[2]));
        w.focus_cycle(false);
        assert_eq!(w.focused_panel_id(), Some(ids[0]));
        w.focus_cycle(true);
        assert_eq!(w.focused_panel_id(), Some(ids[2]));
        w.focus_cycle(true);
        assert_eq!(w.focused_panel_id(), Some(ids[1]));
    }

    #[test]
    fn insert_near_focused_panel_splits_vertically() {
        let (mut w, _rx) = workflow();
        let (first, first_id, _) = TestPanel::cell(Vec::new());
        w.add_panel(first, None, Direction::Horizontal);
        let (second, second_id, _) = TestPanel::cell(Vec::new());
        w.add_panel(second, Some(first_id), Direction::Vertical);

        assert_eq!(w.focus_order(), &[first_id, second_id]);
        assert_eq!(w.focused_panel_id(), Some(second_id));
    }

    #[test]
    fn add_panel_with_unknown_target_falls_back_to_root() {
        let (mut w, _rx) = workflow();
        let (first, _, _) = TestPanel::cell(Vec::new());
        w.add_panel(first, None, Direction::Horizontal);

        let phantom = PanelId::next();
        let (second, second_id, _) = TestPanel::cell(Vec::new());
        w.add_panel(second, Some(phantom), Direction::Vertical);

        assert_eq!(w.panel_count(), 2);
        assert_eq!(w.focused_panel_id(), Some(second_id));
    }

    #[test]
    fn resize_focused_ignores_orthogonal_axis() {
        let (mut w, _rx) = workflow();
        let (a, a_id, _) = TestPanel::cell(Vec::new());
        let (b, _, _) = TestPanel::cell(Vec::new());
        w.add_panel(a, None, Direction::Horizontal);
        w.add_panel(b, None, Direction::Horizontal);
        w.focus_panel(a_id);

        // Matching axis twice, orthogonal once.
        w.resize_focused(Direction::Horizontal, 1);
        w.resize_focused(Direction::Horizontal, 1);
        w.resize_focused(Direction::Vertical, 5);

        let (parent, idx) = w.root.find_parent(a_id).expect("leaf present");
        if let LayoutNode::Split { proportions, .. } = parent {
            assert_eq!(proportions[idx], 3);
        } else {
            panic!("parent must be a split");
        }
    }

    #[test]
    fn shrink_clamps_at_one_then_grows() {
        let (mut w, _rx) = workflow();
        let (a, a_id, _) = TestPanel::cell(Vec::new());
        let (b, _, _) = TestPanel::cell(Vec::new());
        w.add_panel(a, None, Direction::Horizontal);
        w.add_panel(b, None, Direction::Horizontal);
        w.focus_panel(a_id);

        w.resize_focused(Direction::Horizontal, -1);
        let proportion_after_shrink = {
            let (parent, idx) = w.root.find_parent(a_id).unwrap();
            if let LayoutNode::Split { proportions, .. } = parent {
                proportions[idx]
            } else {
                unreachable!()
            }
        };
        assert_eq!(proportion_after_shrink, 1);

        w.resize_focused(Direction::Horizontal, 1);
        w.resize_focused(Direction::Horizontal, 1);
        let (parent, idx) = w.root.find_parent(a_id).unwrap();
        if let LayoutNode::Split { proportions, .. } = parent {
            assert_eq!(proportions[idx], 3);
        }
    }

    #[test]
    fn ticker_posts_ticks_only_while_running() {
        let (mut w, rx) = workflow();
        w.start();
        w.start(); // idempotent

        let tick = rx.recv_timeout(Duration::from_secs(2)).expect("first tick");
        match tick {
            UiMessage::Tick(id) => assert_eq!(id, w.id()),
            other => panic!("expected tick, got {other:?}"),
        }

        w.stop();
        w.stop(); // idempotent
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(120)).is_err());
        assert!(!w.ticker_running());
    }

    #[test]
    fn refresh_panels_reaches_every_panel() {
        let (mut w, _rx) = workflow();
        let (a, _, ca) = TestPanel::cell(Vec::new());
        let (b, _, cb) = TestPanel::cell(Vec::new());
        w.add_panel(a, None, Direction::Horizontal);
        w.add_panel(b, None, Direction::Horizontal);

        w.refresh_panels();
        assert_eq!(ca.refreshed.load(Ordering::SeqCst), 1);
        assert_eq!(cb.refreshed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_unmounts_everything_exactly_once() {
        let (mut w, _rx) = workflow();
        let (a, _, ca) = TestPanel::cell(vec![ContextKind::Sql]);
        let (b, _, cb) = TestPanel::cell(Vec::new());
        w.add_panel(a, None, Direction::Horizontal);
        w.add_panel(b, None, Direction::Horizontal);
        w.start();

        w.shutdown();

        assert_eq!(ca.unmounted.load(Ordering::SeqCst), 1);
        assert_eq!(cb.unmounted.load(Ordering::SeqCst), 1);
        assert_eq!(w.panel_count(), 0);
        assert_eq!(w.subscriber_count(ContextKind::Sql), 0);
        assert!(!w.ticker_running());
    }

    #[test]
    fn removing_unfocused_panel_keeps_focus_on_survivor() {
        let (mut w, _rx) = workflow();
        let (a, a_id, _) = TestPanel::cell(Vec::new());
        let (b, b_id, _) = TestPanel::cell(Vec::new());
        w.add_panel(a, None, Direction::Horizontal);
        w.add_panel(b, None, Direction::Horizontal);

        w.remove_panel(a_id);
        assert_eq!(w.focused_panel_id(), Some(b_id));
    }
}
