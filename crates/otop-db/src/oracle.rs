//! Oracle-backed adapter implementation.
//!
//! Wraps a single rust-oracle connection behind a mutex; the dashboard's
//! query volume is a handful of snapshot reads per refresh tick, so
//! serializing them costs nothing and keeps the handle trivially shareable
//! across panel workers.

use std::sync::Mutex;

use ::oracle as ora;
use ::oracle::sql_type::ToSql;

use crate::adapter::DbAdapter;
use crate::error::DbError;
use crate::models::{PlanRow, Session, SqlStats};

// ─── Connection String ──────────────────────────────────────────────────────

/// Parsed `user/password@host:port/service` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Schema to log in as.
    pub user: String,
    /// Password.
    pub password: String,
    /// Everything after the `@`: `host:port/service`, passed verbatim
    /// to the driver as an EZConnect string.
    pub connect: String,
}

impl ConnectParams {
    /// Parse a connection string of the form `user/password@host:port/service`.
    ///
    /// The split on `@` is right-to-left so passwords containing `@`
    /// survive; the split on `/` is left-to-right so service names
    /// containing `/` survive.
    pub fn parse(input: &str) -> Result<Self, DbError> {
        let Some((credentials, connect)) = input.rsplit_once('@') else {
            return Err(DbError::InvalidConnectString {
                input: redact(input),
                reason: "missing '@' before host",
            });
        };
        let Some((user, password)) = credentials.split_once('/') else {
            return Err(DbError::InvalidConnectString {
                input: redact(input),
                reason: "missing '/' between user and password",
            });
        };
        if user.is_empty() {
            return Err(DbError::InvalidConnectString {
                input: redact(input),
                reason: "empty user",
            });
        }
        if connect.is_empty() {
            return Err(DbError::InvalidConnectString {
                input: redact(input),
                reason: "empty host/service",
            });
        }
        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
            connect: connect.to_string(),
        })
    }
}

/// Replace the password portion of a connection string for error messages.
fn redact(input: &str) -> String {
    match input.rsplit_once('@') {
        Some((credentials, connect)) => match credentials.split_once('/') {
            Some((user, _)) => format!("{user}/***@{connect}"),
            None => format!("{credentials}@{connect}"),
        },
        None => match input.split_once('/') {
            Some((user, _)) => format!("{user}/***"),
            None => input.to_string(),
        },
    }
}

// ─── Queries ────────────────────────────────────────────────────────────────

const SESSIONS_SQL: &str = "\
SELECT s.sid,
       s.serial# AS serial_no,
       s.username,
       s.status,
       s.sql_id,
       q.sql_text,
       s.program,
       s.machine,
       s.event AS wait_event,
       s.seconds_in_wait,
       q.cpu_time,
       q.elapsed_time,
       io.physical_reads,
       io.block_gets + io.consistent_gets AS logical_reads
  FROM v$session s
  LEFT JOIN v$sql q
    ON q.sql_id = s.sql_id
   AND q.child_number = 0
  LEFT JOIN v$sess_io io
    ON io.sid = s.sid
 WHERE s.type = 'USER'
   AND s.username IS NOT NULL
 ORDER BY CASE WHEN s.status = 'ACTIVE' THEN 0 ELSE 1 END, s.sid";

const PLAN_SQL: &str = "\
SELECT id,
       parent_id,
       depth,
       operation,
       options,
       object_name,
       cardinality,
       bytes,
       cost
  FROM v$sql_plan
 WHERE sql_id = :sql_id
   AND child_number = (SELECT MIN(child_number)
                         FROM v$sql_plan
                        WHERE sql_id = :sql_id)
 ORDER BY id";

const STATS_SQL: &str = "\
SELECT sql_id,
       MAX(sql_text) AS sql_text,
       SUM(executions) AS executions,
       SUM(elapsed_time) AS elapsed_time,
       SUM(cpu_time) AS cpu_time,
       SUM(buffer_gets) AS buffer_gets,
       SUM(disk_reads) AS disk_reads,
       SUM(rows_processed) AS rows_processed
  FROM v$sql
 WHERE sql_id = :sql_id
 GROUP BY sql_id";

// ─── Oracle Adapter ─────────────────────────────────────────────────────────

/// Production adapter reading the V$ views over one shared connection.
pub struct OracleDb {
    conn: Mutex<ora::Connection>,
}

impl OracleDb {
    /// Connect using a `user/password@host:port/service` string.
    pub fn connect(conn_str: &str) -> Result<Self, DbError> {
        let params = ConnectParams::parse(conn_str)?;
        let conn = ora::Connection::connect(&params.user, &params.password, &params.connect)
            .map_err(|e| DbError::ConnectFailed {
                user: params.user.clone(),
                target: params.connect.clone(),
                source: Box::new(e),
            })?;
        tracing::debug!(
            target: "otop.db",
            user = %params.user,
            connect = %params.connect,
            "connected to oracle"
        );
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl DbAdapter for OracleDb {
    fn active_sessions(&self) -> Result<Vec<Session>, DbError> {
        let conn = self.conn.lock().expect("oracle connection mutex poisoned");
        let rows = conn
            .query(SESSIONS_SQL, &[])
            .map_err(|e| query_failed("v$session", e))?;

        let mut sessions = Vec::new();
        for row_result in rows {
            let row = row_result.map_err(|e| query_failed("v$session", e))?;
            sessions.push(Session {
                sid: row.get("SID").map_err(|e| query_failed("v$session", e))?,
                serial: get_or_default(&row, "SERIAL_NO", "v$session")?,
                username: get_string(&row, "USERNAME", "v$session")?,
                status: get_string(&row, "STATUS", "v$session")?,
                sql_id: get_string(&row, "SQL_ID", "v$session")?,
                sql_text: get_string(&row, "SQL_TEXT", "v$session")?,
                program: get_string(&row, "PROGRAM", "v$session")?,
                machine: get_string(&row, "MACHINE", "v$session")?,
                wait_event: get_string(&row, "WAIT_EVENT", "v$session")?,
                wait_seconds: get_or_default(&row, "SECONDS_IN_WAIT", "v$session")?,
                cpu_time: micros_to_seconds(get_or_default(&row, "CPU_TIME", "v$session")?),
                elapsed_time: micros_to_seconds(get_or_default(
                    &row,
                    "ELAPSED_TIME",
                    "v$session",
                )?),
                physical_reads: get_or_default(&row, "PHYSICAL_READS", "v$session")?,
                logical_reads: get_or_default(&row, "LOGICAL_READS", "v$session")?,
            });
        }
        Ok(sessions)
    }

    fn execution_plan(&self, sql_id: &str) -> Result<Vec<PlanRow>, DbError> {
        let conn = self.conn.lock().expect("oracle connection mutex poisoned");
        let binds: &[(&str, &dyn ToSql)] = &[("sql_id", &sql_id)];
        let rows = conn
            .query_named(PLAN_SQL, binds)
            .map_err(|e| query_failed("v$sql_plan", e))?;

        let mut plan = Vec::new();
        for row_result in rows {
            let row = row_result.map_err(|e| query_failed("v$sql_plan", e))?;
            plan.push(PlanRow {
                id: get_or_default(&row, "ID", "v$sql_plan")?,
                parent_id: row
                    .get("PARENT_ID")
                    .map_err(|e| query_failed("v$sql_plan", e))?,
                depth: get_or_default(&row, "DEPTH", "v$sql_plan")?,
                operation: get_string(&row, "OPERATION", "v$sql_plan")?,
                options: get_string(&row, "OPTIONS", "v$sql_plan")?,
                object_name: get_string(&row, "OBJECT_NAME", "v$sql_plan")?,
                cardinality: get_or_default(&row, "CARDINALITY", "v$sql_plan")?,
                bytes: get_or_default(&row, "BYTES", "v$sql_plan")?,
                cost: get_or_default(&row, "COST", "v$sql_plan")?,
            });
        }
        Ok(plan)
    }

    fn sql_stats(&self, sql_id: &str) -> Result<Option<SqlStats>, DbError> {
        let conn = self.conn.lock().expect("oracle connection mutex poisoned");
        let binds: &[(&str, &dyn ToSql)] = &[("sql_id", &sql_id)];
        let mut rows = conn
            .query_named(STATS_SQL, binds)
            .map_err(|e| query_failed("v$sql", e))?;

        let Some(row_result) = rows.next() else {
            return Ok(None);
        };
        let row = row_result.map_err(|e| query_failed("v$sql", e))?;
        Ok(Some(SqlStats {
            sql_id: get_string(&row, "SQL_ID", "v$sql")?,
            sql_text: get_string(&row, "SQL_TEXT", "v$sql")?,
            executions: get_or_default(&row, "EXECUTIONS", "v$sql")?,
            elapsed_time_micros: get_or_default(&row, "ELAPSED_TIME", "v$sql")?,
            cpu_time_micros: get_or_default(&row, "CPU_TIME", "v$sql")?,
            buffer_gets: get_or_default(&row, "BUFFER_GETS", "v$sql")?,
            disk_reads: get_or_default(&row, "DISK_READS", "v$sql")?,
            rows: get_or_default(&row, "ROWS_PROCESSED", "v$sql")?,
        }))
    }
}

fn query_failed(view: &'static str, source: ora::Error) -> DbError {
    DbError::QueryFailed {
        view,
        source: Box::new(source),
    }
}

/// Fetch a nullable string column, mapping NULL to the empty string.
fn get_string(row: &ora::Row, column: &str, view: &'static str) -> Result<String, DbError> {
    let value: Option<String> = row.get(column).map_err(|e| query_failed(view, e))?;
    Ok(value.unwrap_or_default())
}

/// Fetch a nullable numeric column, mapping NULL to the type default.
fn get_or_default<T>(row: &ora::Row, column: &str, view: &'static str) -> Result<T, DbError>
where
    T: Default,
    Option<T>: ora::sql_type::FromSql,
{
    let value: Option<T> = row.get(column).map_err(|e| query_failed(view, e))?;
    Ok(value.unwrap_or_default())
}

const fn micros_to_seconds(micros: f64) -> f64 {
    micros / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_connect_string() {
        let params = ConnectParams::parse("scott/tiger@dbhost:1521/ORCLPDB1").unwrap();
        assert_eq!(params.user, "scott");
        assert_eq!(params.password, "tiger");
        assert_eq!(params.connect, "dbhost:1521/ORCLPDB1");
    }

    #[test]
    fn parse_password_containing_at() {
        let params = ConnectParams::parse("app/p@ss@db:1521/SVC").unwrap();
        assert_eq!(params.user, "app");
        assert_eq!(params.password, "p@ss");
        assert_eq!(params.connect, "db:1521/SVC");
    }

    #[test]
    fn parse_rejects_missing_at() {
        let err = ConnectParams::parse("scott/tiger").unwrap_err();
        assert!(matches!(err, DbError::InvalidConnectString { .. }));
    }

    #[test]
    fn parse_rejects_missing_password_separator() {
        let err = ConnectParams::parse("scott@db:1521/SVC").unwrap_err();
        assert!(matches!(err, DbError::InvalidConnectString { .. }));
    }

    #[test]
    fn parse_rejects_empty_user() {
        assert!(ConnectParams::parse("/tiger@db:1521/SVC").is_err());
        assert!(ConnectParams::parse("scott/tiger@").is_err());
    }

    #[test]
    fn redaction_hides_password() {
        let redacted = redact("scott/tiger@db:1521/SVC");
        assert!(!redacted.contains("tiger"));
        assert!(redacted.contains("scott"));
        assert!(redacted.contains("db:1521/SVC"));
    }
}
