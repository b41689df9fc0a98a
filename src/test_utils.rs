/// # Test Utilities Module
///
/// Shared fixtures for unit tests: a small seeded schema modelled on the
/// planning tables the tool is usually pointed at, and helpers for
/// file-backed databases in temporary directories.

use crate::config::ConnectionConfig;
use rusqlite::Connection;
use tempfile::TempDir;

/// Seed script for the fixture schema
pub const ATRIUM_SEED: &str = "
CREATE TABLE AT_TAAK (GC_ID INTEGER PRIMARY KEY, GC_CODE TEXT NOT NULL UNIQUE, GC_OMSCHRIJVING TEXT);
CREATE TABLE AT_WERK (GC_ID INTEGER PRIMARY KEY, GC_CODE TEXT NOT NULL UNIQUE, GC_OMSCHRIJVING TEXT);
CREATE TABLE AT_MEDEW (GC_ID INTEGER PRIMARY KEY, GC_CODE TEXT NOT NULL UNIQUE, GC_NAAM TEXT, ACTIEF_JN TEXT DEFAULT 'J');
CREATE TABLE AT_URENPER (GC_ID INTEGER PRIMARY KEY, GC_CODE TEXT NOT NULL, BEGINDATUM TEXT, EINDDATUM TEXT);

INSERT INTO AT_TAAK VALUES (1, 'ONT', 'Ontwikkeling');
INSERT INTO AT_TAAK VALUES (2, 'TST', 'Testen');
INSERT INTO AT_TAAK VALUES (3, 'ANL', 'Analyse');
INSERT INTO AT_WERK VALUES (1, 'W001', 'Intern project');
INSERT INTO AT_MEDEW VALUES (1, 'JDV', 'J. de Vries', 'J');
INSERT INTO AT_MEDEW VALUES (2, 'PJN', 'P. Jansen', 'N');
INSERT INTO AT_URENPER VALUES (1, '2024-01', '2024-01-01', '2024-01-31');
";

/// In-memory connection with the fixture schema loaded
pub fn atrium_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory database");
    conn.execute_batch(ATRIUM_SEED).expect("fixture schema");
    conn
}

/// Connection settings for `name` inside `dir`; the file is not created
pub fn file_config(dir: &TempDir, name: &str) -> ConnectionConfig {
    ConnectionConfig::new(dir.path().join(name).to_string_lossy().into_owned())
}
