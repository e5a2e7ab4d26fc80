use clap::Parser;
use rectable::command::{self, CommandResult};
use rectable::storage::{CoercionRegistry, NullPolicy, RecordTable, TableFactory};
use rectable::{console, echo, echo_lines, errors, error};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "rectable",
    version = VERSION,
    about = "In-memory schema-checked record table."
)]
struct Cli {
    /// Execute a command. May be repeated.
    #[arg(short, long)]
    command: Vec<String>,

    /// Execute every line of a script file.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// What a non-nullable column without a default stores for NULL: keep or type-default.
    #[arg(long, env = "RECTABLE_NULL_POLICY", default_value = "keep")]
    null_policy: NullPolicy,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut registry = CoercionRegistry::with_builtins();
    registry.set_null_policy(cli.null_policy);
    let factory = TableFactory::new(registry);
    let mut table = factory.new_table();
    info!(null_policy = ?cli.null_policy, "Table created");

    if let Err(e) = run(&cli, &mut table) {
        error!("{}\n", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, table: &mut RecordTable) -> Result<(), errors::Error> {
    if let Some(path) = &cli.script {
        for result in command::run_script(table, path)? {
            print_result(&result);
        }
    }
    for statement in &cli.command {
        let result = command::execute(table, command::parse(statement)?)?;
        print_result(&result);
    }
    if cli.script.is_some() || !cli.command.is_empty() {
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let result = command::execute(table, command::parse(line)?)?;
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &CommandResult) {
    match result {
        CommandResult::Ok { affected_rows } => {
            echo!("OK, {} rows affected\n", affected_rows);
        }
        CommandResult::ResultSet { columns, rows } => {
            echo_lines!("{}", console::render_table(columns, rows));
            echo!("{} rows in set\n", rows.len());
        }
    }
}
