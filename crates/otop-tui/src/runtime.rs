//! UI-thread marshalling.
//!
//! The terminal and every panel are owned by the single UI thread that runs
//! the event loop. Background work (database reads, refresh tickers, status
//! bar timers) never touches them directly; it sends a [`UiMessage`] through
//! a [`UiHandle`] and the event loop drains the channel before each draw.
//! Queuing a message implicitly schedules a repaint.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::workflow::WorkflowId;

/// A closure queued to run on the UI thread before the next draw.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// Message consumed by the event loop on the UI thread.
pub enum UiMessage {
    /// Run a closure, then repaint. This is how workers install fetched
    /// data into panel state.
    Invoke(UiTask),
    /// A workflow refresh ticker fired. The loop resolves the id against
    /// the *currently* active workflow, so ticks from a workflow that was
    /// switched away from (or removed) in the meantime are dropped.
    Tick(WorkflowId),
    /// Repaint only.
    Redraw,
}

impl std::fmt::Debug for UiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoke(_) => f.write_str("Invoke(..)"),
            Self::Tick(id) => write!(f, "Tick({id})"),
            Self::Redraw => f.write_str("Redraw"),
        }
    }
}

/// Clonable sending half of the UI channel.
///
/// Handed to every panel at construction and captured by worker threads.
/// Sends silently become no-ops once the event loop (the receiving half)
/// has shut down.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<UiMessage>,
}

impl UiHandle {
    /// Create a handle plus the receiver the event loop drains.
    #[must_use]
    pub fn new_pair() -> (Self, Receiver<UiMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Queue a closure to run on the UI thread; a repaint follows.
    pub fn queue_update(&self, task: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(UiMessage::Invoke(Box::new(task)));
    }

    /// Request a repaint without running anything.
    pub fn request_redraw(&self) {
        let _ = self.tx.send(UiMessage::Redraw);
    }

    /// Post a refresh tick for the given workflow.
    pub(crate) fn post_tick(&self, workflow: WorkflowId) {
        let _ = self.tx.send(UiMessage::Tick(workflow));
    }
}
