//! Schema source backed by parsed DDL.

use std::convert::Infallible;

use tracing::debug;

use super::dialect::Dialect;
use super::parser::{Ddl, SqlParseError, parse_ddl};
use crate::coordinator::SchemaSource;
use crate::relation::Relation;

/// Tables and foreign keys declared in a DDL script.
#[derive(Debug, Clone, Default)]
pub struct DdlSchema {
    ddl: Ddl,
}

impl DdlSchema {
    pub fn parse(input: &str, dialect: Dialect) -> Result<Self, SqlParseError> {
        let ddl = parse_ddl(input, dialect)?;
        debug!(
            dialect = ?ddl.dialect,
            tables = ddl.tables.len(),
            foreign_keys = ddl.foreign_keys.len(),
            "parsed ddl"
        );
        Ok(Self { ddl })
    }

    /// One relation per foreign key column, with both ends in canonical form.
    ///
    /// Ends that resolve to no declared table keep the name as written; columns
    /// of such tables count as non-nullable.
    pub fn foreign_keys(&self) -> Vec<Relation> {
        let mut relations = Vec::new();
        for fk in &self.ddl.foreign_keys {
            let source = self.ddl.resolve_table(&fk.table);
            let target = self.ddl.resolve_table(&fk.target);
            let source_name = source.map_or(&fk.table, |t| &t.name).to_string();
            let target_name = target.map_or(&fk.target, |t| &t.name).to_string();

            for column in &fk.columns {
                let nullable = source.is_some_and(|t| self.ddl.is_nullable(t, column));
                relations.push(Relation::new(
                    target_name.as_str(),
                    source_name.as_str(),
                    column.as_str(),
                    nullable,
                ));
            }
        }
        relations
    }
}

impl SchemaSource for DdlSchema {
    type Error = Infallible;

    fn tables(&self) -> Result<Vec<String>, Infallible> {
        Ok(self.ddl.table_names())
    }

    fn relations(&self) -> Result<Vec<Relation>, Infallible> {
        Ok(self.foreign_keys())
    }
}
