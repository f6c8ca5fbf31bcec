//! Error type for the database adapter layer.

/// Failure modes of the database adapter.
///
/// Connection errors abort startup; query errors are surfaced to the
/// status bar by the panel that issued them and never terminate the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The connection string did not match `user/password@host:port/service`.
    #[error("invalid connection string {input:?}: {reason}. Expected user/password@host:port/service.")]
    InvalidConnectString {
        /// The offending input (password portion redacted).
        input: String,
        /// What was missing or malformed.
        reason: &'static str,
    },

    /// Opening the connection failed.
    #[error("could not connect as {user} to {target}: {source}. Check credentials and listener availability.")]
    ConnectFailed {
        /// User name from the connection string.
        user: String,
        /// Host/service portion of the connection string.
        target: String,
        /// The underlying driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A read query against a V$ view failed.
    #[error("query against {view} failed: {source}")]
    QueryFailed {
        /// The V$ view being read.
        view: &'static str,
        /// The underlying driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
