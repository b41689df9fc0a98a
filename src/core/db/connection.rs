/// Connection Management Module
///
/// Opens SQLite databases from an explicit `ConnectionConfig`, applies the
/// configured start-up pragmas and owns the connection for the lifetime of
/// one command.

use crate::config::ConnectionConfig;
use crate::core::{Result, SeedError};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info, warn};

/// How a session opens its database
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpenMode {
    /// Read-write on an existing database
    ReadWrite,
    /// Read-write, creating the file
    Create,
    /// Read-only on an existing database
    ReadOnly,
}

impl OpenMode {
    fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        match self {
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::Create => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
        }
    }
}

/// An open database connection owned by one command.
///
/// The connection is released when the session is closed or dropped,
/// whether or not any statement run through it failed.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    database: String,
    mode: OpenMode,
}

impl Session {
    /// Opens an existing database for reading and writing.
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        Self::open_with_mode(config, OpenMode::ReadWrite)
    }

    /// Opens an existing database read-only.
    pub fn open_read_only(config: &ConnectionConfig) -> Result<Self> {
        Self::open_with_mode(config, OpenMode::ReadOnly)
    }

    /// Opens a database with the given mode.
    ///
    /// # Errors
    ///
    /// Any failure to open the file or to apply the start-up settings is
    /// reported as `SeedError::Connection`.
    pub fn open_with_mode(config: &ConnectionConfig, mode: OpenMode) -> Result<Self> {
        debug!(database = %config.database, ?mode, "Opening database");

        let connection = Connection::open_with_flags(&config.database, mode.flags())
            .map_err(|e| SeedError::connection(&format!("cannot open '{}'", config.database), e))?;

        connection
            .busy_timeout(config.busy_timeout())
            .map_err(|e| SeedError::connection("cannot set busy timeout", e))?;

        // Read-only sessions skip pragmas that would write to the file
        if mode != OpenMode::ReadOnly {
            for (name, value) in &config.pragmas {
                debug!(pragma = %name, value = %value, "Applying pragma");
                connection
                    .pragma_update(None, name, value.as_str())
                    .map_err(|e| SeedError::connection(&format!("cannot apply PRAGMA {}", name), e))?;
            }
        }

        // SQLite opens lazily; touching the schema surfaces "not a database"
        // and permission problems here rather than on the first statement.
        connection
            .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| SeedError::connection(&format!("cannot read '{}'", config.database), e))?;

        Ok(Session {
            connection,
            database: config.database.clone(),
            mode,
        })
    }

    /// The database path or URI this session was opened with
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<()> {
        let database = self.database;
        self.connection
            .close()
            .map_err(|(_, e)| SeedError::connection(&format!("cannot close '{}'", database), e))?;
        debug!(database = %database, "Closed database");
        Ok(())
    }
}

/// Creates a new, empty database.
///
/// Refuses to touch an existing file. The configured pragmas are applied
/// and the file header is written before the connection is closed.
pub fn create_database(config: &ConnectionConfig) -> Result<()> {
    if is_memory_database(&config.database) {
        return Err(SeedError::Config(
            "cannot create an in-memory database; configure a file path".to_string(),
        ));
    }
    if Path::new(&config.database).exists() {
        return Err(SeedError::Connection(format!(
            "database '{}' already exists",
            config.database
        )));
    }

    let session = Session::open_with_mode(config, OpenMode::Create)?;
    // An empty SQLite file has no header until something writes to it
    session
        .connection()
        .pragma_update(None, "user_version", 0)
        .map_err(|e| SeedError::connection("cannot initialize database header", e))?;
    session.close()?;

    info!(database = %config.database, "Created database");
    Ok(())
}

fn is_memory_database(database: &str) -> bool {
    database == ":memory:" || database.contains("mode=memory")
}

/// Sorts an error raised by a statement on an open connection into a
/// statement rejection or a connection fault.
///
/// Result codes alone cannot tell the two apart (`ATTACH` to a missing
/// directory fails with `CANTOPEN` on a healthy connection), so the
/// connection is asked to read its schema again. If it can, only the
/// statement failed.
pub fn classify_statement_error(connection: &Connection, err: rusqlite::Error) -> SeedError {
    match connection.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => SeedError::Statement(err.to_string()),
        Err(check) => {
            warn!(error = %err, check = %check, "Connection no longer answers queries");
            SeedError::Connection(format!("{} (connection check failed: {})", err, check))
        }
    }
}
