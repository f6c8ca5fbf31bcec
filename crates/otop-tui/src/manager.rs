//! Workflow manager: the tab bar and the active-workflow lifecycle.
//!
//! Holds every workflow and keeps exactly one active at a time. Switching
//! tabs stops the outgoing workflow's ticker, starts the incoming one, and
//! moves focus to the first pane of the new tab.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Tabs;

use crate::theme::Theme;
use crate::workflow::{Workflow, WorkflowId};

/// Owns the workflows and the active tab slot.
#[derive(Default)]
pub struct WorkflowManager {
    workflows: Vec<Workflow>,
    active: Option<usize>,
}

impl WorkflowManager {
    /// An empty manager with no tabs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow; the first one registered becomes active.
    pub fn add_workflow(&mut self, workflow: Workflow) {
        self.workflows.push(workflow);
        if self.active.is_none() {
            self.switch_to(0);
        }
    }

    /// Activate the workflow at `index`: stop the outgoing ticker, start
    /// the incoming one. Out-of-range indices are ignored.
    pub fn switch_to(&mut self, index: usize) {
        if index >= self.workflows.len() {
            return;
        }
        if let Some(current) = self.active
            && current != index
            && let Some(workflow) = self.workflows.get_mut(current)
        {
            workflow.stop();
        }
        self.active = Some(index);
        let workflow = &mut self.workflows[index];
        workflow.start();
        if let Some(first) = workflow.focus_order().first().copied() {
            workflow.focus_panel(first);
        }
        tracing::debug!(
            target: "otop.workflow",
            workflow = %workflow.id(),
            name = workflow.name(),
            "tab activated"
        );
    }

    /// Switch to the next tab, wrapping.
    pub fn switch_next(&mut self) {
        if self.workflows.is_empty() {
            return;
        }
        let next = self.active.map_or(0, |i| (i + 1) % self.workflows.len());
        self.switch_to(next);
    }

    /// Switch to the previous tab, wrapping.
    pub fn switch_prev(&mut self) {
        if self.workflows.is_empty() {
            return;
        }
        let prev = self
            .active
            .map_or(0, |i| i.checked_sub(1).unwrap_or(self.workflows.len() - 1));
        self.switch_to(prev);
    }

    /// The active workflow, if any exist.
    #[must_use]
    pub fn active_workflow(&self) -> Option<&Workflow> {
        self.active.and_then(|i| self.workflows.get(i))
    }

    /// Mutable access to the active workflow.
    pub fn active_workflow_mut(&mut self) -> Option<&mut Workflow> {
        self.active.and_then(|i| self.workflows.get_mut(i))
    }

    /// Mutable access to a workflow by id (used to route ticker ticks).
    pub fn workflow_mut(&mut self, id: WorkflowId) -> Option<&mut Workflow> {
        self.workflows.iter_mut().find(|w| w.id() == id)
    }

    /// Number of registered workflows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.workflows.len()
    }

    /// All workflows, in tab order.
    #[must_use]
    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    /// Stop every ticker and unmount every panel.
    pub fn shutdown_all(&mut self) {
        for workflow in &mut self.workflows {
            workflow.shutdown();
        }
    }

    /// Draw the single-row tab bar: active tab inverted and bold, the
    /// rest dimmed.
    pub fn render_tab_bar(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let titles: Vec<Line<'_>> = self
            .workflows
            .iter()
            .map(|w| Line::from(format!(" {} ", w.name())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.active)
            .highlight_style(
                Style::default()
                    .fg(theme.highlight_fg)
                    .bg(theme.highlight_bg)
                    .add_modifier(Modifier::BOLD),
            )
            .style(Style::default().fg(theme.muted));
        frame.render_widget(tabs, area);
    }
}
