//! Tiling workflow TUI for watching a live Oracle database.
//!
//! otop renders active sessions, the SQL they run, execution plans, and
//! per-statement statistics as composable panels inside tabbed workflows.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  main: terminal guard, event loop, CLI, tracing  │
//! ├──────────────────────────────────────────────────┤
//! │  app: global keymap dispatch, overlays, render   │
//! │  ├─ manager: tab bar, active-workflow lifecycle  │
//! │  │   └─ workflow: layout tree + bus + ticker     │
//! │  │       └─ panels: sessions / detail / editor   │
//! │  ├─ palette: open registered panels              │
//! │  └─ statusbar: transient info / error messages   │
//! ├──────────────────────────────────────────────────┤
//! │  runtime: worker -> UI thread marshalling        │
//! │  otop-db: DbAdapter (oracle / mock)              │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Every widget-touching structure is owned by the UI thread. Panel
//! workers, refresh tickers, and status timers run on worker threads and
//! report back exclusively through [`runtime::UiHandle`].

#![forbid(unsafe_code)]

pub mod app;
pub mod context;
pub mod keys;
pub mod layout;
pub mod manager;
pub mod overlays;
pub mod palette;
pub mod panel;
pub mod panels;
pub mod runtime;
pub mod statusbar;
pub mod theme;
pub mod workflow;

pub use app::{App, DEFAULT_REFRESH_INTERVAL};
pub use context::{Bus, Context, ContextKind, SessionCtx, SqlCtx, Subscription};
pub use keys::{GlobalAction, InputEvent, Keymap};
pub use layout::{Direction, LayoutNode};
pub use manager::WorkflowManager;
pub use palette::{PaletteOutcome, PanelPalette};
pub use panel::{EmitFn, Panel, PanelCell, PanelEntry, PanelFactory, PanelId, PanelRegistry, StatusFn};
pub use runtime::{UiHandle, UiMessage};
pub use statusbar::{StatusBar, StatusLevel};
pub use theme::{Theme, ThemePreset};
pub use workflow::{Workflow, WorkflowId};
