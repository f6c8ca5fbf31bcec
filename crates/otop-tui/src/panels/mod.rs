//! Built-in panels and their registration.

mod query_editor;
mod sessions;
mod sql_detail;

pub use query_editor::QueryEditorPanel;
pub use sessions::SessionListPanel;
pub use sql_detail::SqlDetailPanel;

use crate::panel::{PanelEntry, PanelRegistry};

/// Register every built-in panel type.
///
/// Called once during startup wiring so the registry's contents are
/// explicit and testable rather than assembled by scattered module
/// initializers.
pub fn register_builtin(registry: &PanelRegistry) {
    registry.register(PanelEntry {
        type_name: "SessionList",
        description: "Active Oracle sessions with SQL and wait info",
        factory: SessionListPanel::create,
    });
    registry.register(PanelEntry {
        type_name: "SQLDetail",
        description: "Execution plan and runtime statistics for a SQL statement",
        factory: SqlDetailPanel::create,
    });
    registry.register(PanelEntry {
        type_name: "QueryEditor",
        description: "SQL query editor (pre-populated from selected statement)",
        factory: QueryEditorPanel::create,
    });
}
