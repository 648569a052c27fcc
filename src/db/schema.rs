//! Database schema types for sqlchat.
//!
//! Represents the structure of a database (tables, columns, foreign keys)
//! together with a few sample rows per table, and renders it as the
//! plain-text description embedded in model prompts.

use super::types::{render_row_truncated, Row};
use super::SAMPLE_VALUE_CHARS;

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// All tables in the schema, ordered by name.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats the schema for inclusion in a model prompt.
    ///
    /// Output depends only on the schema contents, so an unchanged database
    /// always yields the same text.
    pub fn format_for_llm(&self) -> String {
        if self.tables.is_empty() {
            return "Database Schema:\n\n(no tables)\n".to_string();
        }

        let tables_text = self
            .tables
            .iter()
            .map(|table| self.format_table_for_llm(table))
            .collect::<Vec<_>>()
            .join("");

        let foreign_keys_text = if self.foreign_keys.is_empty() {
            String::new()
        } else {
            let fk_lines = self
                .foreign_keys
                .iter()
                .map(|fk| {
                    format!(
                        "  - {}.{} -> {}.{}\n",
                        fk.from_table,
                        fk.from_columns.join(", "),
                        fk.to_table,
                        fk.to_columns.join(", ")
                    )
                })
                .collect::<String>();
            format!("Foreign Keys:\n{fk_lines}")
        };

        format!("Database Schema:\n\n{tables_text}{foreign_keys_text}")
    }

    fn format_table_for_llm(&self, table: &Table) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| self.format_column_for_llm(table, column))
            .collect::<String>();

        let samples = if table.sample_rows.is_empty() {
            String::new()
        } else {
            let header = table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("\t");
            let rows = table
                .sample_rows
                .iter()
                .map(|row| {
                    format!("    {}\n", render_row_truncated(row, SAMPLE_VALUE_CHARS))
                })
                .collect::<String>();
            format!(
                "  Sample rows ({} from {}):\n    {header}\n{rows}",
                table.sample_rows.len(),
                table.name
            )
        };

        format!("Table: {}\n{column_lines}{samples}\n", table.name)
    }

    fn format_column_for_llm(&self, table: &Table, column: &Column) -> String {
        let fk_refs = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.from_table == table.name)
            .filter_map(|fk| {
                let pos = fk.from_columns.iter().position(|c| c == &column.name)?;
                let target = fk.to_columns.get(pos).map(String::as_str).unwrap_or("");
                Some(format!("FK -> {}.{}", fk.to_table, target))
            });

        let mut annotations: Vec<String> = [
            table.primary_key.contains(&column.name).then_some("PK"),
            (!column.is_nullable).then_some("NOT NULL"),
        ]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .chain(fk_refs)
        .collect();

        if let Some(default) = &column.default {
            annotations.push(format!("DEFAULT {default}"));
        }

        if annotations.is_empty() {
            format!("  - {}: {}\n", column.name, column.data_type)
        } else {
            format!(
                "  - {}: {} ({})\n",
                column.name,
                column.data_type,
                annotations.join(", ")
            )
        }
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table, in declaration order.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,

    /// A few rows read from the table to illustrate its contents.
    pub sample_rows: Vec<Row>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "int", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}
