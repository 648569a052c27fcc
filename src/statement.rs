//! Statement shape classification.
//!
//! Generated SQL is executed verbatim, without any safety gate. The shape
//! only decides how it is run: statements that return rows are fetched,
//! everything else is executed for its affected-row count.

use std::fmt;

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::db::DatabaseBackend;

/// How a SQL string should be run against the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementShape {
    /// Returns a result set (SELECT, WITH, SHOW, EXPLAIN, DESCRIBE, PRAGMA).
    Rows,
    /// Modifies data or schema and reports an affected-row count.
    Effect,
    /// Could not be parsed; fetched as-is so the database reports the problem.
    Unparsed,
}

impl StatementShape {
    /// Returns true if the statement should be run with a fetch.
    pub fn returns_rows(&self) -> bool {
        matches!(self, Self::Rows | Self::Unparsed)
    }
}

impl fmt::Display for StatementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Effect => write!(f, "effect"),
            Self::Unparsed => write!(f, "unparsed"),
        }
    }
}

/// Classifies SQL text using the dialect of the given backend.
///
/// Multiple statements count as `Rows` if any of them returns rows.
pub fn classify(sql: &str, backend: DatabaseBackend) -> StatementShape {
    let dialect: Box<dyn Dialect> = match backend {
        DatabaseBackend::MySql => Box::new(MySqlDialect {}),
        DatabaseBackend::Sqlite => Box::new(SQLiteDialect {}),
    };

    let statements = match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(statements) if !statements.is_empty() => statements,
        _ => return StatementShape::Unparsed,
    };

    if statements.iter().any(returns_rows) {
        StatementShape::Rows
    } else {
        StatementShape::Effect
    }
}

fn returns_rows(statement: &Statement) -> bool {
    matches!(
        statement,
        Statement::Query(_)
            | Statement::Explain { .. }
            | Statement::ExplainTable { .. }
            | Statement::Pragma { .. }
            | Statement::ShowVariable { .. }
            | Statement::ShowTables { .. }
            | Statement::ShowColumns { .. }
            | Statement::ShowCreate { .. }
            | Statement::ShowFunctions { .. }
            | Statement::ShowStatus { .. }
            | Statement::ShowCollation { .. }
    )
}
