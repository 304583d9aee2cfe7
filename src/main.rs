use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fkwipe::WipeCoordinator;
use fkwipe::report::PlanReport;
use fkwipe::script::ScriptExecutor;
use fkwipe::sql::{DdlSchema, Dialect};

#[derive(Parser)]
#[command(
    name = "fkwipe",
    about = "Print a foreign-key safe script that empties every table of a DDL dump"
)]
struct Cli {
    /// DDL file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// SQL dialect: auto, generic, postgres, mysql, mssql
    #[arg(long, short = 'd', default_value = "auto", value_parser = parse_dialect)]
    dialect: Dialect,

    /// Table to leave untouched (repeatable)
    #[arg(long, short = 'x')]
    exclude: Vec<String>,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print the plan as a table instead of a script
    #[arg(long)]
    plan: bool,

    /// Log planning steps to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    Dialect::from_str(s).ok_or_else(|| format!("unknown dialect: {s}"))
}

fn fail(message: String) -> ! {
    eprintln!("ERROR: {message}");
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("failed to read {}: {e}", path.display()))),
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                fail(format!("failed to read stdin: {e}"));
            }
            buf
        }
    };

    let dialect = cli.dialect.resolve(&input);
    let schema =
        DdlSchema::parse(&input, dialect).unwrap_or_else(|e| fail(format!("parse error: {e}")));
    let coordinator = WipeCoordinator::new(dialect).exclude(cli.exclude.iter().cloned());

    let output = if cli.plan {
        let steps = coordinator
            .prepare(&schema)
            .unwrap_or_else(|e| fail(e.to_string()));
        PlanReport::default().render(&steps)
    } else {
        let mut executor = ScriptExecutor::new();
        if let Err(e) = coordinator.wipe(&schema, &mut executor) {
            fail(e.to_string());
        }
        executor.script()
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &output) {
                fail(format!("failed to write {}: {e}", path.display()));
            }
        }
        None => print!("{output}"),
    }
}
