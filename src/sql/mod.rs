//! DDL-backed schema discovery and dialect-specific rendering.

mod dialect;
mod lexer;
mod name;
mod parser;
mod schema;

pub use dialect::Dialect;
pub use lexer::Token;
pub use name::TableName;
pub use parser::{ColumnDef, Ddl, ForeignKeyDef, SqlParseError, TableDef, parse_ddl};
pub use schema::DdlSchema;
