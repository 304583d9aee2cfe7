//! Foreign-key relation records.

use std::collections::HashSet;

/// A foreign key as reported by a schema source.
///
/// `source_table.source_column` references `target_table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub target_table: String,
    pub source_table: String,
    pub source_column: String,
    pub source_is_nullable: bool,
}

impl Relation {
    pub fn new(
        target_table: impl Into<String>,
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        source_is_nullable: bool,
    ) -> Self {
        Self {
            target_table: target_table.into(),
            source_table: source_table.into(),
            source_column: source_column.into(),
            source_is_nullable,
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.target_table == self.source_table
    }
}

/// A directed dependency between two distinct, known tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationEdge {
    target_table: String,
    source_table: String,
    source_column: String,
    is_nullable: bool,
}

impl RelationEdge {
    /// Build an edge from a relation.
    ///
    /// Returns `None` for self references and for relations where either
    /// side is missing from `tables`.
    pub fn from_relation(relation: &Relation, tables: &HashSet<&str>) -> Option<Self> {
        if relation.is_self_reference()
            || !tables.contains(relation.target_table.as_str())
            || !tables.contains(relation.source_table.as_str())
        {
            return None;
        }

        Some(Self {
            target_table: relation.target_table.clone(),
            source_table: relation.source_table.clone(),
            source_column: relation.source_column.clone(),
            is_nullable: relation.source_is_nullable,
        })
    }

    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }
}

#[cfg(test)]
pub(crate) fn edge(source: &str, column: &str, target: &str, nullable: bool) -> RelationEdge {
    RelationEdge {
        target_table: target.to_string(),
        source_table: source.to_string(),
        source_column: column.to_string(),
        is_nullable: nullable,
    }
}
