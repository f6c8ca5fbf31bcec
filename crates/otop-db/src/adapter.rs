//! Database adapter trait and mock implementation.
//!
//! The [`DbAdapter`] trait decouples the TUI from the concrete backend.
//! Panels read through a shared [`DbHandle`] from worker threads; the real
//! implementation is [`crate::OracleDb`], while [`MockDb`] provides
//! synthetic data for demo mode (`--demo`) and tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DbError;
use crate::models::{PlanRow, Session, SqlStats, order_sessions};

// ─── Adapter Trait ──────────────────────────────────────────────────────────

/// Read-only query surface consumed by the dashboard.
///
/// Implementations must be safe for concurrent calls; every panel worker
/// shares one handle. All three queries are snapshot reads with no
/// transactional coupling between them.
pub trait DbAdapter: Send + Sync {
    /// All user sessions, `ACTIVE` first, ties by ascending SID.
    fn active_sessions(&self) -> Result<Vec<Session>, DbError>;

    /// Execution plan for the cursor with the smallest child number,
    /// ordered by plan line id. Unknown SQL ids yield an empty plan.
    fn execution_plan(&self, sql_id: &str) -> Result<Vec<PlanRow>, DbError>;

    /// Runtime statistics aggregated across child cursors, or `None`
    /// when the SQL id is not (or no longer) in the shared pool.
    fn sql_stats(&self, sql_id: &str) -> Result<Option<SqlStats>, DbError>;
}

/// Shared adapter handle passed to panel factories and workers.
pub type DbHandle = Arc<dyn DbAdapter>;

// ─── Mock Adapter ───────────────────────────────────────────────────────────

/// Mock adapter with canned V$ data.
///
/// Keeps the dashboard usable without a database (`--demo`) and gives
/// tests deterministic rows.
pub struct MockDb {
    sessions: Vec<Session>,
    plans: HashMap<String, Vec<PlanRow>>,
    stats: HashMap<String, SqlStats>,
}

impl MockDb {
    /// A small plausible workload: two active sessions running SQL, one
    /// idle session, with a plan and statistics for each statement.
    #[must_use]
    pub fn sample() -> Self {
        let mut sessions = vec![
            Session {
                sid: 131,
                serial: 4021,
                username: "HR".to_string(),
                status: "INACTIVE".to_string(),
                program: "sqlplus".to_string(),
                machine: "app01".to_string(),
                wait_event: "SQL*Net message from client".to_string(),
                wait_seconds: 318.0,
                ..Session::default()
            },
            Session {
                sid: 47,
                serial: 1207,
                username: "SCOTT".to_string(),
                status: "ACTIVE".to_string(),
                sql_id: "9babjv8yq8ru3".to_string(),
                sql_text: "SELECT e.ename, d.dname FROM emp e JOIN dept d ON d.deptno = e.deptno"
                    .to_string(),
                program: "JDBC Thin Client".to_string(),
                machine: "app02".to_string(),
                wait_event: "db file sequential read".to_string(),
                wait_seconds: 0.2,
                cpu_time: 1.84,
                elapsed_time: 6.31,
                physical_reads: 12_480,
                logical_reads: 384_102,
                ..Session::default()
            },
            Session {
                sid: 203,
                serial: 889,
                username: "BATCH".to_string(),
                status: "ACTIVE".to_string(),
                sql_id: "f7xp2k0q1m9zc".to_string(),
                sql_text: "UPDATE orders SET status = 'SHIPPED' WHERE order_date < :1".to_string(),
                program: "perl".to_string(),
                machine: "batch01".to_string(),
                wait_event: "log file sync".to_string(),
                wait_seconds: 1.7,
                cpu_time: 42.05,
                elapsed_time: 120.66,
                physical_reads: 1_024_557,
                logical_reads: 9_310_220,
                ..Session::default()
            },
        ];
        order_sessions(&mut sessions);

        let mut plans = HashMap::new();
        plans.insert(
            "9babjv8yq8ru3".to_string(),
            vec![
                PlanRow {
                    id: 0,
                    parent_id: None,
                    depth: 0,
                    operation: "SELECT STATEMENT".to_string(),
                    cost: 14,
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 1,
                    parent_id: Some(0),
                    depth: 1,
                    operation: "HASH JOIN".to_string(),
                    cardinality: 14,
                    bytes: 770,
                    cost: 14,
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 2,
                    parent_id: Some(1),
                    depth: 2,
                    operation: "TABLE ACCESS".to_string(),
                    options: "FULL".to_string(),
                    object_name: "DEPT".to_string(),
                    cardinality: 4,
                    bytes: 88,
                    cost: 3,
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 3,
                    parent_id: Some(1),
                    depth: 2,
                    operation: "TABLE ACCESS".to_string(),
                    options: "FULL".to_string(),
                    object_name: "EMP".to_string(),
                    cardinality: 14,
                    bytes: 462,
                    cost: 3,
                    ..PlanRow::default()
                },
            ],
        );
        plans.insert(
            "f7xp2k0q1m9zc".to_string(),
            vec![
                PlanRow {
                    id: 0,
                    parent_id: None,
                    depth: 0,
                    operation: "UPDATE STATEMENT".to_string(),
                    cost: 211,
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 1,
                    parent_id: Some(0),
                    depth: 1,
                    operation: "UPDATE".to_string(),
                    object_name: "ORDERS".to_string(),
                    ..PlanRow::default()
                },
                PlanRow {
                    id: 2,
                    parent_id: Some(1),
                    depth: 2,
                    operation: "INDEX".to_string(),
                    options: "RANGE SCAN".to_string(),
                    object_name: "ORDERS_DATE_IX".to_string(),
                    cardinality: 52_000,
                    bytes: 1_456_000,
                    cost: 211,
                    ..PlanRow::default()
                },
            ],
        );

        let mut stats = HashMap::new();
        stats.insert(
            "9babjv8yq8ru3".to_string(),
            SqlStats {
                sql_id: "9babjv8yq8ru3".to_string(),
                sql_text: "SELECT e.ename, d.dname FROM emp e JOIN dept d ON d.deptno = e.deptno"
                    .to_string(),
                executions: 1_204,
                elapsed_time_micros: 6_310_000,
                cpu_time_micros: 1_840_000,
                buffer_gets: 384_102,
                disk_reads: 12_480,
                rows: 16_856,
            },
        );
        stats.insert(
            "f7xp2k0q1m9zc".to_string(),
            SqlStats {
                sql_id: "f7xp2k0q1m9zc".to_string(),
                sql_text: "UPDATE orders SET status = 'SHIPPED' WHERE order_date < :1".to_string(),
                executions: 31,
                elapsed_time_micros: 120_660_000,
                cpu_time_micros: 42_050_000,
                buffer_gets: 9_310_220,
                disk_reads: 1_024_557,
                rows: 1_612_000,
            },
        );

        Self {
            sessions,
            plans,
            stats,
        }
    }

    /// An adapter with no sessions and no cursors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sessions: Vec::new(),
            plans: HashMap::new(),
            stats: HashMap::new(),
        }
    }
}

impl DbAdapter for MockDb {
    fn active_sessions(&self) -> Result<Vec<Session>, DbError> {
        Ok(self.sessions.clone())
    }

    fn execution_plan(&self, sql_id: &str) -> Result<Vec<PlanRow>, DbError> {
        Ok(self.plans.get(sql_id).cloned().unwrap_or_default())
    }

    fn sql_stats(&self, sql_id: &str) -> Result<Option<SqlStats>, DbError> {
        Ok(self.stats.get(sql_id).cloned())
    }
}
