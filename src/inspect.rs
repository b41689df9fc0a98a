//! Read-only diagnostic queries against a configured set of tables.
use crate::config::is_identifier;
use crate::core::db::{classify_statement_error, QueryExecutor, QueryResult};
use crate::core::{Result, SeedError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One table to dump, optionally narrowed to some columns and ordered.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableQuery {
    pub name: String,
    pub columns: Option<Vec<String>>,
    pub order_by: Option<Vec<String>>,
}

impl TableQuery {
    /// Query every column of `name` in storage order
    pub fn all(name: impl Into<String>) -> Self {
        TableQuery {
            name: name.into(),
            columns: None,
            order_by: None,
        }
    }

    /// Rejects names that cannot be interpolated as bare identifiers.
    pub fn validate(&self) -> Result<()> {
        let names = std::iter::once(&self.name)
            .chain(self.columns.iter().flatten())
            .chain(self.order_by.iter().flatten());
        for name in names {
            if !is_identifier(name) {
                return Err(SeedError::Config(format!(
                    "invalid identifier '{}' in inspect table '{}'",
                    name, self.name
                )));
            }
        }
        if matches!(&self.columns, Some(columns) if columns.is_empty()) {
            return Err(SeedError::Config(format!(
                "inspect table '{}' lists no columns",
                self.name
            )));
        }
        Ok(())
    }

    /// Builds the SELECT for this table. Call `validate` first.
    pub fn to_sql(&self) -> String {
        let columns = match &self.columns {
            Some(columns) => columns.join(", "),
            None => "*".to_string(),
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.name);
        if let Some(order_by) = self.order_by.as_ref().filter(|o| !o.is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        sql
    }
}

/// Rows of one table, or why they could not be read
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,
    pub sql: String,
    #[serde(flatten)]
    pub result: TableResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableResult {
    Rows(QueryResult),
    Error { message: String },
}

/// Runs the query for every table in order.
///
/// A table that cannot be queried (missing table, unknown column) gets an
/// error entry and the remaining tables are still inspected. Connection
/// faults abort.
pub fn inspect_tables(connection: &Connection, tables: &[TableQuery]) -> Result<Vec<TableReport>> {
    let executor = QueryExecutor::new(connection);
    let mut reports = Vec::with_capacity(tables.len());

    for table in tables {
        table.validate()?;
        let sql = table.to_sql();
        debug!(table = %table.name, sql = %sql, "Inspecting table");

        let result = match executor.execute(&sql).map_err(|err| match err {
            SeedError::Database(e) => classify_statement_error(connection, e),
            other => other,
        }) {
            Ok(rows) => TableResult::Rows(rows),
            Err(err) if err.is_connection_fault() => return Err(err),
            Err(err) => {
                warn!(table = %table.name, error = %err, "Table query failed");
                TableResult::Error {
                    message: err.detail(),
                }
            }
        };
        reports.push(TableReport {
            table: table.name.clone(),
            sql,
            result,
        });
    }
    Ok(reports)
}
