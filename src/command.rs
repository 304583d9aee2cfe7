//! Wipe steps produced by the planner.

use std::fmt;

/// An abstract wipe step, rendered to SQL by a [`StatementRenderer`].
///
/// [`StatementRenderer`]: crate::coordinator::StatementRenderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WipeCommand {
    /// Delete every row of the table.
    ClearTable { table: String },
    /// Set the column to NULL on every row of the table.
    NullColumn { table: String, column: String },
}

impl WipeCommand {
    pub fn clear_table(table: impl Into<String>) -> Self {
        Self::ClearTable {
            table: table.into(),
        }
    }

    pub fn null_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::NullColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::ClearTable { table } | Self::NullColumn { table, .. } => table,
        }
    }
}

impl fmt::Display for WipeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearTable { table } => write!(f, "clear {table}"),
            Self::NullColumn { table, column } => write!(f, "null {table}.{column}"),
        }
    }
}
