/// Error Module
///
/// Defines the single error type used across sqlseed. The important
/// distinction is between connection-level faults, which abort whatever
/// is running, and statement-level failures, which a batch records and
/// moves past.
use crate::core::db::BatchReport;
use thiserror::Error;

/// Error type for sqlseed.
///
/// Covers:
/// - Connection faults (cannot open, closed, corrupt or unreadable database)
/// - Driver errors raised by SQLite while running a statement
/// - Statement rejections reported by non-SQLite executors
/// - Configuration loading and validation
/// - File system and serialization errors
#[derive(Error, Debug)]
pub enum SeedError {
    /// The database connection is unusable; always fatal
    #[error("Connection error: {0}")]
    Connection(String),

    /// Errors raised by SQLite outside a batch
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A single statement was rejected; the connection is still usable
    #[error("Statement error: {0}")]
    Statement(String),

    /// A connection fault stopped a batch part way through. `report`
    /// holds the outcomes of the statements that ran before it.
    #[error("{cause}")]
    BatchAborted {
        report: BatchReport,
        cause: Box<SeedError>,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SeedError {
    /// Builds a connection error from an SQLite error raised while opening
    /// or talking to the database.
    pub fn connection(context: &str, err: rusqlite::Error) -> Self {
        SeedError::Connection(format!("{}: {}", context, err))
    }

    /// Returns `true` when the error means the connection itself can no
    /// longer be used, as opposed to one statement being rejected.
    ///
    /// Driver errors are not classified by code: `ATTACH` or `VACUUM INTO`
    /// a bad path fail with `CANTOPEN` on a healthy connection. Executors
    /// check the connection and map errors to `Connection` or `Statement`.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            SeedError::Connection(_) | SeedError::BatchAborted { .. }
        )
    }

    /// The underlying error text without the category prefix, as reported
    /// next to a failed statement.
    pub fn detail(&self) -> String {
        match self {
            SeedError::Connection(msg)
            | SeedError::Statement(msg)
            | SeedError::Config(msg) => msg.clone(),
            SeedError::BatchAborted { cause, .. } => cause.detail(),
            SeedError::Database(err) => err.to_string(),
            SeedError::Io(err) => err.to_string(),
            SeedError::Json(err) => err.to_string(),
            SeedError::Toml(err) => err.to_string(),
        }
    }
}

/// Result alias with `SeedError` as the error type.
pub type Result<T> = std::result::Result<T, SeedError>;
