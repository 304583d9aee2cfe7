//! SQL dialect detection and statement rendering.

use super::name::split_qualified;
use crate::coordinator::StatementRenderer;

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Auto-detect from dump content
    #[default]
    Auto,
    /// Standard SQL
    Generic,
    /// PostgreSQL
    PostgreSQL,
    /// MySQL / MariaDB
    MySQL,
    /// Microsoft SQL Server
    SqlServer,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "generic" | "ansi" => Some(Self::Generic),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "mssql" | "sqlserver" | "tsql" => Some(Self::SqlServer),
            _ => None,
        }
    }

    /// Detect dialect from SQL content.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        // Dump headers
        if lower.contains("postgresql database dump") || lower.contains("pg_dump") {
            return Self::PostgreSQL;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") || lower.contains("mariadb dump") {
            return Self::MySQL;
        }

        // Syntax hints
        if lower.contains("alter table only") || lower.contains("timestamptz") || lower.contains("::") {
            return Self::PostgreSQL;
        }
        if lower.contains('`') || lower.contains("engine=") || lower.contains("auto_increment") {
            return Self::MySQL;
        }
        if lower.contains("[dbo]") || lower.contains("identity(") || lower.contains("nvarchar") {
            return Self::SqlServer;
        }

        Self::Generic
    }

    /// Resolve Auto to a concrete dialect.
    pub fn resolve(self, content: &str) -> Self {
        match self {
            Self::Auto => Self::detect(content),
            other => other,
        }
    }

    /// Normalize a declared identifier.
    ///
    /// PostgreSQL and standard SQL fold unquoted names to lower case; MySQL and
    /// SQL Server keep the spelling and compare case-insensitively instead.
    pub fn fold_ident(self, ident: &str, quoted: bool) -> String {
        match self {
            Self::Auto | Self::Generic | Self::PostgreSQL if !quoted => ident.to_ascii_lowercase(),
            _ => ident.to_string(),
        }
    }

    /// Compare two folded identifiers.
    pub fn ident_eq(self, a: &str, b: &str) -> bool {
        match self {
            Self::MySQL | Self::SqlServer => a.to_lowercase() == b.to_lowercase(),
            Self::Auto | Self::Generic | Self::PostgreSQL => a == b,
        }
    }

    /// Schema that unqualified names live in, if the dialect has one.
    pub fn default_schema(self) -> Option<&'static str> {
        match self {
            Self::Auto | Self::Generic | Self::PostgreSQL => Some("public"),
            Self::SqlServer => Some("dbo"),
            Self::MySQL => None,
        }
    }

    /// Quote one identifier, doubling embedded closing quotes.
    pub fn quote_ident(self, ident: &str) -> String {
        let (open, close) = match self {
            Self::MySQL => ('`', '`'),
            Self::SqlServer => ('[', ']'),
            Self::Auto | Self::Generic | Self::PostgreSQL => ('"', '"'),
        };

        let mut out = String::with_capacity(ident.len() + 2);
        out.push(open);
        for c in ident.chars() {
            if c == close {
                out.push(close);
            }
            out.push(c);
        }
        out.push(close);
        out
    }

    /// Quote a canonical, possibly schema-qualified table name segment by segment.
    pub fn quote_table(self, table: &str) -> String {
        split_qualified(table)
            .iter()
            .map(|segment| self.quote_ident(segment))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl StatementRenderer for Dialect {
    fn clear_table(&self, table: &str) -> String {
        format!("DELETE FROM {}", self.quote_table(table))
    }

    fn null_column(&self, table: &str, column: &str) -> String {
        format!(
            "UPDATE {} SET {} = NULL",
            self.quote_table(table),
            self.quote_ident(column)
        )
    }
}
