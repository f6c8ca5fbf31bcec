//! Row shapes returned by the database adapter.
//!
//! These mirror the columns the dashboard actually reads from
//! `V$SESSION`, `V$SQL_PLAN` and `V$SQL`; anything the UI does not
//! display is deliberately absent.

use serde::{Deserialize, Serialize};

// ─── Session ────────────────────────────────────────────────────────────────

/// One user session, joined with the SQL it is currently executing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (`V$SESSION.SID`).
    pub sid: i64,
    /// Session serial number.
    pub serial: i64,
    /// Schema the session is logged in as.
    pub username: String,
    /// `ACTIVE`, `INACTIVE`, `KILLED`, ...
    pub status: String,
    /// SQL id of the current statement; empty when idle.
    pub sql_id: String,
    /// First chunk of the current statement's text.
    pub sql_text: String,
    /// Client program name.
    pub program: String,
    /// Client machine name.
    pub machine: String,
    /// Current wait event name.
    pub wait_event: String,
    /// Seconds spent in the current wait.
    pub wait_seconds: f64,
    /// CPU time of the current cursor, in seconds.
    pub cpu_time: f64,
    /// Elapsed time of the current cursor, in seconds.
    pub elapsed_time: f64,
    /// Physical block reads for this session.
    pub physical_reads: i64,
    /// Logical block reads (block gets + consistent gets).
    pub logical_reads: i64,
}

impl Session {
    /// Whether the session is actively executing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }
}

/// Order sessions the way the dashboard displays them: `ACTIVE` sessions
/// first, ties broken by ascending SID.
///
/// The Oracle adapter orders in SQL; the mock adapter and tests use this
/// helper so every adapter observes the same contract.
pub fn order_sessions(sessions: &mut [Session]) {
    sessions.sort_by_key(|s| (!s.is_active(), s.sid));
}

// ─── Plan Row ───────────────────────────────────────────────────────────────

/// A single step of an execution plan (`V$SQL_PLAN`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    /// Plan line id; lines are ordered by this.
    pub id: i64,
    /// Parent line id; `None` for the plan root.
    pub parent_id: Option<i64>,
    /// Nesting depth, used for display indentation.
    pub depth: i64,
    /// Operation name (`TABLE ACCESS`, `NESTED LOOPS`, ...).
    pub operation: String,
    /// Operation options (`FULL`, `BY INDEX ROWID`, ...); may be empty.
    pub options: String,
    /// Accessed object; may be empty.
    pub object_name: String,
    /// Estimated row count.
    pub cardinality: i64,
    /// Estimated bytes.
    pub bytes: i64,
    /// Optimizer cost.
    pub cost: i64,
}

impl PlanRow {
    /// Render the operation the way the plan view prints it:
    /// `OPERATION OPTIONS [OBJECT_NAME]`, skipping empty parts.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = self.operation.clone();
        if !self.options.is_empty() {
            out.push(' ');
            out.push_str(&self.options);
        }
        if !self.object_name.is_empty() {
            out.push_str(" [");
            out.push_str(&self.object_name);
            out.push(']');
        }
        out
    }
}

// ─── SQL Stats ──────────────────────────────────────────────────────────────

/// Runtime statistics for a SQL statement, aggregated across all child
/// cursors (`V$SQL`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlStats {
    /// SQL id the statistics belong to.
    pub sql_id: String,
    /// Statement text.
    pub sql_text: String,
    /// Total executions.
    pub executions: i64,
    /// Total elapsed time in microseconds.
    pub elapsed_time_micros: i64,
    /// Total CPU time in microseconds.
    pub cpu_time_micros: i64,
    /// Total buffer gets.
    pub buffer_gets: i64,
    /// Total disk reads.
    pub disk_reads: i64,
    /// Total rows processed.
    pub rows: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(sid: i64, status: &str) -> Session {
        Session {
            sid,
            status: status.to_string(),
            ..Session::default()
        }
    }

    #[test]
    fn active_sessions_sort_first() {
        let mut sessions = vec![
            session(30, "INACTIVE"),
            session(20, "ACTIVE"),
            session(10, "INACTIVE"),
            session(40, "ACTIVE"),
        ];
        order_sessions(&mut sessions);
        let order: Vec<(i64, bool)> = sessions.iter().map(|s| (s.sid, s.is_active())).collect();
        assert_eq!(order, vec![(20, true), (40, true), (10, false), (30, false)]);
    }

    #[test]
    fn ordering_is_stable_for_equal_keys() {
        let mut sessions = vec![session(5, "ACTIVE"), session(5, "ACTIVE")];
        order_sessions(&mut sessions);
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn plan_row_describe_joins_non_empty_parts() {
        let row = PlanRow {
            operation: "TABLE ACCESS".to_string(),
            options: "FULL".to_string(),
            object_name: "EMP".to_string(),
            ..PlanRow::default()
        };
        assert_eq!(row.describe(), "TABLE ACCESS FULL [EMP]");
    }

    #[test]
    fn plan_row_describe_skips_empty_parts() {
        let row = PlanRow {
            operation: "NESTED LOOPS".to_string(),
            ..PlanRow::default()
        };
        assert_eq!(row.describe(), "NESTED LOOPS");
    }

    #[test]
    fn session_serde_roundtrip() {
        let s = Session {
            sid: 42,
            serial: 7,
            username: "SCOTT".to_string(),
            status: "ACTIVE".to_string(),
            sql_id: "9babjv8yq8ru3".to_string(),
            ..Session::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let decoded: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, s);
    }
}
