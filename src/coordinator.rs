//! End-to-end wipe: read the schema, plan, render and execute.

use std::collections::HashSet;
use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::WipeCommand;
use crate::planner::{PlanError, plan};
use crate::relation::Relation;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Table and foreign-key metadata of a live schema.
pub trait SchemaSource {
    type Error: StdError + Send + Sync + 'static;

    /// Schema-qualified table names.
    fn tables(&self) -> Result<Vec<String>, Self::Error>;

    /// Every single-column foreign key between those tables.
    fn relations(&self) -> Result<Vec<Relation>, Self::Error>;
}

/// Turns abstract commands into dialect-specific statements.
pub trait StatementRenderer {
    fn clear_table(&self, table: &str) -> String;

    fn null_column(&self, table: &str, column: &str) -> String;

    fn render(&self, command: &WipeCommand) -> String {
        match command {
            WipeCommand::ClearTable { table } => self.clear_table(table),
            WipeCommand::NullColumn { table, column } => self.null_column(table, column),
        }
    }
}

/// Runs statements in issue order, typically inside the caller's transaction.
pub trait StatementExecutor {
    type Error: StdError + Send + Sync + 'static;

    /// Execute one statement, returning the affected row count.
    fn execute(&mut self, statement: &str) -> Result<u64, Self::Error>;
}

#[derive(Debug, Error)]
pub enum WipeError {
    #[error("Failed to read schema: {0}")]
    Schema(#[source] BoxError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(
        "Excluded table {excluded} is linked to {retained} by foreign key {table}.{column}"
    )]
    ExcludedDependency {
        excluded: String,
        retained: String,
        table: String,
        column: String,
    },
    #[error("Statement {index} failed: {statement}: {source}")]
    Execute {
        index: usize,
        statement: String,
        #[source]
        source: BoxError,
    },
}

/// One planned command and its rendered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeStep {
    pub command: WipeCommand,
    pub statement: String,
}

/// Outcome of an executed wipe, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeReport {
    pub steps: Vec<WipeStep>,
    pub rows: Vec<u64>,
}

impl WipeReport {
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.statement.as_str())
    }

    pub fn total_rows(&self) -> u64 {
        self.rows.iter().sum()
    }
}

/// Wipe configuration and orchestration.
pub struct WipeCoordinator<R> {
    renderer: R,
    excluded: HashSet<String>,
}

impl<R: StatementRenderer> WipeCoordinator<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            excluded: HashSet::new(),
        }
    }

    /// Leave the named tables untouched.
    pub fn exclude<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Plan and render without executing anything.
    pub fn prepare<S: SchemaSource>(&self, source: &S) -> Result<Vec<WipeStep>, WipeError> {
        let tables = source
            .tables()
            .map_err(|e| WipeError::Schema(Box::new(e)))?;
        let relations = source
            .relations()
            .map_err(|e| WipeError::Schema(Box::new(e)))?;
        info!(
            tables = tables.len(),
            relations = relations.len(),
            "read schema"
        );

        let (tables, relations) = self.apply_exclusions(tables, relations)?;
        let commands = plan(&tables, &relations)?;
        info!(commands = commands.len(), "planned wipe");

        Ok(commands
            .into_iter()
            .map(|command| WipeStep {
                statement: self.renderer.render(&command),
                command,
            })
            .collect())
    }

    /// Plan the full wipe, then execute it statement by statement.
    ///
    /// Nothing is executed when planning fails. Executor errors stop the
    /// wipe at the failing statement.
    pub fn wipe<S, E>(&self, source: &S, executor: &mut E) -> Result<WipeReport, WipeError>
    where
        S: SchemaSource,
        E: StatementExecutor,
    {
        let steps = self.prepare(source)?;
        let mut rows = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            debug!(index, statement = %step.statement, "executing");
            let affected =
                executor
                    .execute(&step.statement)
                    .map_err(|e| WipeError::Execute {
                        index,
                        statement: step.statement.clone(),
                        source: Box::new(e),
                    })?;
            rows.push(affected);
        }

        info!(statements = steps.len(), "wipe complete");
        Ok(WipeReport { steps, rows })
    }

    fn apply_exclusions(
        &self,
        tables: Vec<String>,
        relations: Vec<Relation>,
    ) -> Result<(Vec<String>, Vec<Relation>), WipeError> {
        let known: HashSet<&str> = tables.iter().map(String::as_str).collect();
        for name in &self.excluded {
            if !known.contains(name.as_str()) {
                warn!(table = %name, "excluded table not found in schema");
            }
        }

        for rel in &relations {
            if !known.contains(rel.target_table.as_str()) || !known.contains(rel.source_table.as_str()) {
                warn!(
                    table = %rel.source_table,
                    column = %rel.source_column,
                    references = %rel.target_table,
                    "ignoring foreign key to unknown table"
                );
                continue;
            }

            let source_excluded = self.excluded.contains(&rel.source_table);
            let target_excluded = self.excluded.contains(&rel.target_table);

            // Clearing a retained table referenced from an excluded one would
            // break the excluded rows; nulling them would modify excluded data.
            let blocked = match (source_excluded, target_excluded) {
                (true, false) => true,
                (false, true) => !rel.source_is_nullable,
                _ => false,
            };
            if blocked {
                let (excluded, retained) = if source_excluded {
                    (&rel.source_table, &rel.target_table)
                } else {
                    (&rel.target_table, &rel.source_table)
                };
                return Err(WipeError::ExcludedDependency {
                    excluded: excluded.clone(),
                    retained: retained.clone(),
                    table: rel.source_table.clone(),
                    column: rel.source_column.clone(),
                });
            }
        }

        let tables: Vec<String> = tables
            .into_iter()
            .filter(|t| !self.excluded.contains(t))
            .collect();
        let relations = relations
            .into_iter()
            .filter(|r| {
                !self.excluded.contains(&r.source_table) && !self.excluded.contains(&r.target_table)
            })
            .collect();

        Ok((tables, relations))
    }
}
