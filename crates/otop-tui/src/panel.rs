//! Panel contract and registry.
//!
//! A panel is a stateful pane with a lifecycle. Every trait method runs on
//! the UI thread; anything that might block is forked to a worker which
//! reports back through [`crate::runtime::UiHandle::queue_update`]. The
//! registry is the factory table behind the command palette.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use otop_db::DbHandle;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::context::{Context, ContextKind};
use crate::keys::InputEvent;
use crate::runtime::UiHandle;
use crate::theme::Theme;

// ─── Panel Identity ─────────────────────────────────────────────────────────

/// Process-unique handle identifying a panel.
///
/// The layout tree, focus order, and subscription bookkeeping all refer to
/// panels by id; equality of ids is handle identity. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

// ─── Capability Callbacks ───────────────────────────────────────────────────

/// Publishes a context onto the owning workflow's bus. Callable from any
/// thread; dispatch is synchronous on the calling thread.
pub type EmitFn = Arc<dyn Fn(Context) + Send + Sync>;

/// Reports a user-visible error message, marshalled to the status bar.
/// Callable from any thread.
pub type StatusFn = Arc<dyn Fn(String) + Send + Sync>;

// ─── Panel Trait ────────────────────────────────────────────────────────────

/// Lifecycle contract every pane implements.
///
/// | Operation | Contract |
/// |---|---|
/// | `name` | stable type tag, equal to the registry entry |
/// | `id` | stable handle for the panel's lifetime |
/// | `subscriptions` | context kinds to receive; read once at add time |
/// | `on_context` | must not block; may spawn a worker |
/// | `refresh` | periodic, short; may spawn a worker |
/// | `mount` | one-shot init after insertion; may trigger the initial load |
/// | `unmount` | called exactly once on removal; detaches outstanding workers |
///
/// The two optional capabilities are default no-ops: the workflow wires
/// `set_emit_fn` and `set_status_fn` unconditionally and panels that do not
/// publish or report simply ignore them.
pub trait Panel: Send {
    /// Registered type name.
    fn name(&self) -> &'static str;

    /// Stable identity handle.
    fn id(&self) -> PanelId;

    /// Context kinds this panel wants delivered to [`Panel::on_context`].
    fn subscriptions(&self) -> Vec<ContextKind> {
        Vec::new()
    }

    /// A subscribed context was emitted.
    fn on_context(&mut self, _ctx: &Context) {}

    /// Periodic refresh while the owning workflow is active.
    fn refresh(&mut self) {}

    /// One-shot initialization after the panel joined a workflow.
    fn mount(&mut self) {}

    /// Teardown before the panel leaves its workflow.
    fn unmount(&mut self) {}

    /// Accept the emit capability (panels that publish context override).
    fn set_emit_fn(&mut self, _emit: EmitFn) {}

    /// Accept the status capability (panels that report errors override).
    fn set_status_fn(&mut self, _status: StatusFn) {}

    /// Draw into `area`.
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool, theme: &Theme);

    /// Handle a key that fell through the global dispatcher. Returns
    /// whether the event was consumed.
    fn handle_input(&mut self, event: &InputEvent) -> bool;

    /// Downcast support for tests and inspection.
    fn as_any(&self) -> &dyn Any;
}

/// How panels are held by workflows and captured by bus handlers.
pub type PanelCell = Arc<Mutex<dyn Panel>>;

/// Pure constructor producing a fresh, unmounted panel.
pub type PanelFactory = fn(UiHandle, DbHandle) -> PanelCell;

// ─── Registry ───────────────────────────────────────────────────────────────

/// One palette-visible panel type.
#[derive(Clone, Copy)]
pub struct PanelEntry {
    /// Unique type name; equals [`Panel::name`] of created panels.
    pub type_name: &'static str,
    /// One-line description shown as the palette subtitle.
    pub description: &'static str,
    /// Constructor.
    pub factory: PanelFactory,
}

impl std::fmt::Debug for PanelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelEntry")
            .field("type_name", &self.type_name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Table of available panel types, shared between the palette and startup
/// wiring. Populated once by [`crate::panels::register_builtin`].
#[derive(Default)]
pub struct PanelRegistry {
    entries: RwLock<Vec<PanelEntry>>,
}

impl PanelRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Duplicate names are not rejected; [`Self::get`]
    /// stops at the first match, so the first registration wins and later
    /// duplicates are shadowed (they still show up in [`Self::all`]).
    pub fn register(&self, entry: PanelEntry) {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        entries.push(entry);
    }

    /// Snapshot of all entries in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<PanelEntry> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.clone()
    }

    /// First entry with the given type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<PanelEntry> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.iter().copied().find(|e| e.type_name == type_name)
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_factory(_ui: UiHandle, _db: DbHandle) -> PanelCell {
        unreachable!("factory never invoked in registry tests")
    }

    fn entry(name: &'static str, description: &'static str) -> PanelEntry {
        PanelEntry {
            type_name: name,
            description,
            factory: dummy_factory,
        }
    }

    #[test]
    fn panel_ids_are_unique_and_ordered() {
        let a = PanelId::next();
        let b = PanelId::next();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn register_and_get() {
        let registry = PanelRegistry::new();
        registry.register(entry("SessionList", "sessions"));
        registry.register(entry("SQLDetail", "plans"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("SQLDetail").unwrap().description, "plans");
        assert!(registry.get("Nope").is_none());
    }

    #[test]
    fn all_preserves_registration_order() {
        let registry = PanelRegistry::new();
        registry.register(entry("A", "a"));
        registry.register(entry("B", "b"));
        registry.register(entry("C", "c"));

        let names: Vec<&str> = registry.all().iter().map(|e| e.type_name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_names_first_registration_wins() {
        let registry = PanelRegistry::new();
        registry.register(entry("Dup", "first"));
        registry.register(entry("Dup", "second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Dup").unwrap().description, "first");
    }

    #[test]
    fn all_returns_a_snapshot() {
        let registry = PanelRegistry::new();
        registry.register(entry("A", "a"));
        let snapshot = registry.all();
        registry.register(entry("B", "b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
