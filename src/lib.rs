pub mod command;
pub mod coordinator;
pub mod graph;
pub mod planner;
pub mod relation;
pub mod report;
pub mod script;
pub mod sql;

use wasm_bindgen::prelude::*;

pub use command::WipeCommand;
pub use coordinator::{
    SchemaSource, StatementExecutor, StatementRenderer, WipeCoordinator, WipeError, WipeReport,
    WipeStep,
};
pub use planner::{PlanError, plan};
pub use relation::{Relation, RelationEdge};

use script::ScriptExecutor;
use sql::{DdlSchema, Dialect};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Build the wipe script for a DDL dump, leaving `exclude` untouched.
pub fn wipe_script(ddl: &str, dialect: Dialect, exclude: &[String]) -> Result<String, String> {
    let dialect = dialect.resolve(ddl);
    let schema = DdlSchema::parse(ddl, dialect).map_err(|e| e.to_string())?;
    let coordinator = WipeCoordinator::new(dialect).exclude(exclude.iter().cloned());

    let mut executor = ScriptExecutor::new();
    coordinator
        .wipe(&schema, &mut executor)
        .map_err(|e| e.to_string())?;

    Ok(executor.script())
}

/// Render a DDL dump to a foreign-key safe wipe script.
/// `exclude` is a comma separated list of table names.
#[wasm_bindgen(js_name = "wipeScript")]
pub fn wipe_script_js(
    ddl: &str,
    dialect: Option<String>,
    exclude: Option<String>,
) -> Result<String, String> {
    let dialect = match dialect.as_deref() {
        Some(name) => Dialect::from_str(name).ok_or_else(|| format!("Unknown dialect: {name}"))?,
        None => Dialect::Auto,
    };
    let exclude: Vec<String> = exclude
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    wipe_script(ddl, dialect, &exclude)
}
