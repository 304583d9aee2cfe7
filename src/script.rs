//! Dry-run executor that records statements as a SQL script.

use std::convert::Infallible;

use crate::coordinator::StatementExecutor;

/// Records every statement instead of running it.
#[derive(Debug, Clone, Default)]
pub struct ScriptExecutor {
    statements: Vec<String>,
}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// One `;`-terminated statement per line.
    pub fn script(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push_str(";\n");
        }
        out
    }
}

impl StatementExecutor for ScriptExecutor {
    type Error = Infallible;

    fn execute(&mut self, statement: &str) -> Result<u64, Infallible> {
        self.statements.push(statement.to_string());
        Ok(0)
    }
}
