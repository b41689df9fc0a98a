/// Script Batch Execution Module
///
/// Splits a SQL script into statements and runs them one by one against a
/// connection, committing after each statement and recording an outcome
/// for every statement submitted.
///
/// ## Splitting
///
/// Statements are separated by `;` with no awareness of string literals,
/// comments or trigger bodies. A `;` inside `'a;b'` ends the statement
/// early. Scripts that need semicolons inside statements are not supported.

use crate::core::db::connection::{classify_statement_error, Session};
use crate::core::{Result, SeedError};
use rusqlite::Connection;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Statement delimiter
pub const DELIMITER: char = ';';

/// Number of characters of a statement shown in reports
pub const PREVIEW_LEN: usize = 50;

/// A connection that can run one statement immediately and commit.
///
/// Implementations report statement rejections as errors for which
/// `SeedError::is_connection_fault` is `false`, and anything that leaves
/// the connection unusable as an error for which it is `true`.
pub trait ImmediateExecutor {
    /// Runs a single statement without a prepare step or bound parameters
    fn execute_immediate(&mut self, statement: &str) -> Result<()>;

    /// Commits whatever the last statement left open
    fn commit(&mut self) -> Result<()>;
}

impl ImmediateExecutor for Connection {
    fn execute_immediate(&mut self, statement: &str) -> Result<()> {
        let conn: &Connection = self;
        conn.execute_batch(statement)
            .map_err(|e| classify_statement_error(conn, e))
    }

    fn commit(&mut self) -> Result<()> {
        let conn: &Connection = self;
        // Autocommit already made the statement durable unless it opened
        // a transaction of its own.
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")
                .map_err(|e| classify_statement_error(conn, e))?;
        }
        Ok(())
    }
}

impl ImmediateExecutor for Session {
    fn execute_immediate(&mut self, statement: &str) -> Result<()> {
        self.connection_mut().execute_immediate(statement)
    }

    fn commit(&mut self) -> Result<()> {
        ImmediateExecutor::commit(self.connection_mut())
    }
}

/// Result of running one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Executed and committed
    Success { statement: String },
    /// Rejected; later statements were still attempted
    Failure { statement: String, message: String },
}

impl ExecutionOutcome {
    pub fn statement(&self) -> &str {
        match self {
            ExecutionOutcome::Success { statement } => statement,
            ExecutionOutcome::Failure { statement, .. } => statement,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    /// Leading text of the statement for human-readable reports
    pub fn preview(&self) -> &str {
        preview(self.statement())
    }
}

/// Ordered outcomes of one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<ExecutionOutcome>,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_success())
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Splits a script into trimmed, non-empty statements.
///
/// # Examples
///
/// ```
/// use sqlseed::core::db::split_statements;
///
/// let statements = split_statements("CREATE TABLE t (x INT);\n\n INSERT INTO t VALUES (1); ;");
/// assert_eq!(statements, vec!["CREATE TABLE t (x INT)", "INSERT INTO t VALUES (1)"]);
/// ```
pub fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(DELIMITER)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Returns at most `PREVIEW_LEN` characters of `statement`.
pub fn preview(statement: &str) -> &str {
    match statement.char_indices().nth(PREVIEW_LEN) {
        Some((end, _)) => &statement[..end],
        None => statement,
    }
}

/// Runs every statement of `script` against `executor` in order.
///
/// Each successful statement is committed before the next one runs.
/// Statement failures are recorded and the batch carries on; nothing is
/// rolled back.
///
/// # Errors
///
/// On a connection-level fault (`SeedError::is_connection_fault`) returns
/// `SeedError::BatchAborted` carrying the outcomes recorded so far and the
/// fault itself. Statements committed before the fault stay committed.
pub fn execute_batch<E>(executor: &mut E, script: &str) -> Result<BatchReport>
where
    E: ImmediateExecutor + ?Sized,
{
    let started = Instant::now();
    let statements = split_statements(script);
    info!(statements = statements.len(), "Executing batch");

    let mut outcomes = Vec::with_capacity(statements.len());
    for (index, statement) in statements.into_iter().enumerate() {
        debug!(index, statement = preview(statement), "Executing statement");

        let result = executor
            .execute_immediate(statement)
            .and_then(|()| executor.commit());

        match result {
            Ok(()) => outcomes.push(ExecutionOutcome::Success {
                statement: statement.to_string(),
            }),
            Err(err) if err.is_connection_fault() => {
                error!(index, error = %err, "Connection failed during batch");
                return Err(SeedError::BatchAborted {
                    report: BatchReport {
                        outcomes,
                        elapsed: started.elapsed(),
                    },
                    cause: Box::new(err),
                });
            }
            Err(err) => {
                let message = err.detail();
                warn!(index, statement = preview(statement), error = %message, "Statement failed");
                outcomes.push(ExecutionOutcome::Failure {
                    statement: statement.to_string(),
                    message,
                });
            }
        }
    }

    let report = BatchReport {
        outcomes,
        elapsed: started.elapsed(),
    };
    info!(
        total = report.total(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Executor double that records every call and rejects statements
    /// containing a marker.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Vec<String>,
        drop_connection_on: Option<&'static str>,
    }

    impl ImmediateExecutor for RecordingExecutor {
        fn execute_immediate(&mut self, statement: &str) -> Result<()> {
            self.calls.push(format!("exec {}", statement));
            if matches!(self.drop_connection_on, Some(marker) if statement.contains(marker)) {
                return Err(SeedError::Connection("connection reset by peer".to_string()));
            }
            if statement.contains("BROKEN") {
                return Err(SeedError::Statement(format!("cannot parse: {}", statement)));
            }
            Ok(())
        }

        fn commit(&mut self) -> Result<()> {
            self.calls.push("commit".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_split_statements_basic() {
        let script = "CREATE TABLE a (x INT);\nINSERT INTO a VALUES (1);\n";
        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE a (x INT)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[test]
    fn test_split_statements_without_trailing_delimiter() {
        assert_eq!(split_statements("SELECT 1; SELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_split_statements_empty_and_blank() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("  ; ;  ;").is_empty());
        assert!(split_statements("\n\t\n").is_empty());
    }

    #[test]
    fn test_split_statements_breaks_inside_literals() {
        // Known limitation: no literal awareness
        assert_eq!(
            split_statements("INSERT INTO t VALUES ('a;b')"),
            vec!["INSERT INTO t VALUES ('a", "b')"]
        );
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let short = "SELECT 1";
        assert_eq!(preview(short), short);

        let long = "é".repeat(80);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_LEN);
        assert!(long.starts_with(p));
    }

    #[test]
    fn test_empty_script_makes_no_calls() {
        let mut executor = RecordingExecutor::default();
        let report = execute_batch(&mut executor, "").unwrap();
        assert!(report.outcomes.is_empty());
        assert!(executor.calls.is_empty());

        let report = execute_batch(&mut executor, "  ; ;  ;").unwrap();
        assert!(report.outcomes.is_empty());
        assert!(executor.calls.is_empty());
    }

    #[test]
    fn test_commit_follows_each_statement() {
        let mut executor = RecordingExecutor::default();
        execute_batch(&mut executor, "A; B;").unwrap();
        assert_eq!(executor.calls, vec!["exec A", "commit", "exec B", "commit"]);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let mut executor = RecordingExecutor::default();
        let report = execute_batch(&mut executor, "A; BROKEN; C;").unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.has_failures());
        assert_eq!(
            report.outcomes[1],
            ExecutionOutcome::Failure {
                statement: "BROKEN".to_string(),
                message: "cannot parse: BROKEN".to_string(),
            }
        );
        // No commit after the rejected statement
        assert_eq!(
            executor.calls,
            vec!["exec A", "commit", "exec BROKEN", "exec C", "commit"]
        );
    }

    #[test]
    fn test_connection_fault_aborts_batch() {
        let mut executor = RecordingExecutor {
            drop_connection_on: Some("B"),
            ..Default::default()
        };
        let err = execute_batch(&mut executor, "A; B; C;").unwrap_err();

        assert!(err.is_connection_fault());
        assert_eq!(executor.calls, vec!["exec A", "commit", "exec B"]);
    }

    #[test]
    fn test_connection_fault_keeps_completed_outcomes() {
        let mut executor = RecordingExecutor {
            drop_connection_on: Some("C"),
            ..Default::default()
        };
        match execute_batch(&mut executor, "A; BROKEN; C; D;") {
            Err(SeedError::BatchAborted { report, cause }) => {
                assert_eq!(report.total(), 2);
                assert!(report.outcomes[0].is_success());
                assert_eq!(report.outcomes[1].statement(), "BROKEN");
                assert!(!report.outcomes[1].is_success());
                assert!(matches!(*cause, SeedError::Connection(_)));
            }
            other => panic!("Expected BatchAborted, got {:?}", other),
        }
    }

    fn assert_middle_statement_failed(conn: &mut Connection, middle: &str) {
        let script = format!(
            "CREATE TABLE t (x INTEGER); {}; INSERT INTO t VALUES (1);",
            middle
        );
        let report = execute_batch(conn, &script).unwrap();

        assert_eq!(report.total(), 3);
        assert!(report.outcomes[0].is_success());
        match &report.outcomes[1] {
            ExecutionOutcome::Failure { statement, message } => {
                assert_eq!(statement, middle);
                assert!(message.contains("unable to open"), "unexpected message: {}", message);
            }
            other => panic!("Expected failure, got {:?}", other),
        }
        assert!(report.outcomes[2].is_success());

        let count: i64 = conn.query_row("SELECT count(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_attach_to_missing_directory_is_statement_failure() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_middle_statement_failed(
            &mut conn,
            "ATTACH DATABASE '/nonexistent_dir/other.db' AS other",
        );
    }

    #[test]
    fn test_vacuum_into_missing_directory_is_statement_failure() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_middle_statement_failed(&mut conn, "VACUUM INTO '/nonexistent_dir/backup.db'");
    }

    #[test]
    fn test_sqlite_batch_with_invalid_statement() {
        let mut conn = Connection::open_in_memory().unwrap();
        let script = "CREATE TABLE t (x INTEGER); INSERT INTO nowhere VALUES (1); INSERT INTO t VALUES (7);";
        let report = execute_batch(&mut conn, script).unwrap();

        assert_eq!(report.total(), 3);
        assert!(report.outcomes[0].is_success());
        match &report.outcomes[1] {
            ExecutionOutcome::Failure { message, .. } => assert!(message.contains("no such table")),
            other => panic!("Expected failure, got {:?}", other),
        }
        assert!(report.outcomes[2].is_success());

        let count: i64 = conn.query_row("SELECT count(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_statement_opening_transaction_is_committed() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = execute_batch(
            &mut conn,
            "CREATE TABLE t (x INTEGER); BEGIN; INSERT INTO t VALUES (1);",
        )
        .unwrap();

        assert_eq!(report.succeeded(), 3);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = ExecutionOutcome::Failure {
            statement: "X".to_string(),
            message: "bad".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["statement"], "X");
        assert_eq!(json["message"], "bad");
    }
}
