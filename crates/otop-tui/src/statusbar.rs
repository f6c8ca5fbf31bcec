//! Transient status messages with versioned auto-clear.
//!
//! `error` messages show for 10 seconds, `info` messages for 5. Every
//! message bumps a version; the deferred clear captures the version it was
//! scheduled for and only clears if still current, so a later message is
//! never wiped by an earlier message's expiry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::runtime::UiHandle;
use crate::theme::Theme;

const ERROR_TTL: Duration = Duration::from_secs(10);
const INFO_TTL: Duration = Duration::from_secs(5);

/// Severity of the displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Dim informational message.
    Info,
    /// Highlighted error message.
    Error,
}

#[derive(Default)]
struct StatusState {
    text: String,
    level: Option<StatusLevel>,
    version: u64,
}

/// Single-row status strip. Clones share state; safe to call from any
/// thread (worker errors land here through the Reporter wiring).
#[derive(Clone)]
pub struct StatusBar {
    state: Arc<Mutex<StatusState>>,
    ui: UiHandle,
}

impl StatusBar {
    /// Create a status bar that repaints through `ui`.
    #[must_use]
    pub fn new(ui: UiHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(StatusState::default())),
            ui,
        }
    }

    /// Show `msg` in error style; auto-clears after 10 seconds.
    pub fn error(&self, msg: impl Into<String>) {
        self.show(msg.into(), StatusLevel::Error, ERROR_TTL);
    }

    /// Show `msg` in dim style; auto-clears after 5 seconds.
    pub fn info(&self, msg: impl Into<String>) {
        self.show(msg.into(), StatusLevel::Info, INFO_TTL);
    }

    fn show(&self, text: String, level: StatusLevel, ttl: Duration) {
        let version = {
            let mut state = self.state.lock().expect("status bar lock poisoned");
            state.version += 1;
            state.text = text;
            state.level = Some(level);
            state.version
        };

        let bar = self.clone();
        let spawned = std::thread::Builder::new()
            .name("otop-status-clear".to_string())
            .spawn(move || {
                std::thread::sleep(ttl);
                let cleared = bar.clone();
                bar.ui.queue_update(move || {
                    cleared.clear_if_current(version);
                });
            });
        if let Err(error) = spawned {
            tracing::warn!(target: "otop.status", %error, "failed to spawn clear timer");
        }

        self.ui.request_redraw();
    }

    /// Clear the bar if `version` is still the latest message. Stale
    /// versions (a newer message has been shown since) are ignored.
    pub fn clear_if_current(&self, version: u64) {
        let mut state = self.state.lock().expect("status bar lock poisoned");
        if state.version == version {
            state.text.clear();
            state.level = None;
        }
    }

    /// The current message, or `None` when the bar is empty.
    #[must_use]
    pub fn current(&self) -> Option<(String, StatusLevel)> {
        let state = self.state.lock().expect("status bar lock poisoned");
        state.level.map(|level| (state.text.clone(), level))
    }

    /// Version of the most recent message (monotonically increasing).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.lock().expect("status bar lock poisoned").version
    }

    /// Draw the strip: the transient message on the left, a short key
    /// hint on the right when idle.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let line = match self.current() {
            Some((text, StatusLevel::Error)) => {
                Line::from(Span::styled(format!(" {text}"), theme.error_style()))
            }
            Some((text, StatusLevel::Info)) => {
                Line::from(Span::styled(format!(" {text}"), theme.muted_style()))
            }
            None => Line::from(Span::styled(
                " ? help   Ctrl-P palette   q quit",
                theme.muted_style(),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
