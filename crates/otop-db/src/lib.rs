//! Database layer for the otop dashboard.
//!
//! The TUI never talks to Oracle directly; it reads through the
//! [`DbAdapter`] trait, which exposes exactly three queries: the active
//! session list, the execution plan for a SQL id, and aggregated runtime
//! statistics for a SQL id. [`OracleDb`] is the production implementation,
//! [`MockDb`] provides synthetic data for demo mode and tests.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod models;
pub mod oracle;

pub use self::adapter::{DbAdapter, DbHandle, MockDb};
pub use self::error::DbError;
pub use self::models::{PlanRow, Session, SqlStats, order_sessions};
pub use self::oracle::{ConnectParams, OracleDb};
