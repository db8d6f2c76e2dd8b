// ABOUTME: CLI entry point for table-copy
// ABOUTME: Parses arguments, loads config, runs the transfer, and maps errors to exit codes

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use table_copy::commands::{self, TransferRequest, DEFAULT_BATCH_SIZE};
use table_copy::config;
use table_copy::error::{exit_code_for, TransferError, EXIT_VALIDATION};
use table_copy::migration::InheritedStdioRunner;
use table_copy::postgres::PgConnector;

#[derive(Parser)]
#[command(name = "table-copy")]
#[command(
    about = "Copy one table between connections or flat files using an external bulk-copy tool",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Source: "connection:table" or "file:path"
    #[arg(long)]
    src: Option<String>,
    /// Destination: "connection[:table]" or "file:path" (table defaults to the source table)
    #[arg(long)]
    dest: Option<String>,
    /// Transaction batch size passed to the bulk-copy commands
    #[arg(long = "batchSize", visible_alias = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: u64,
    /// Config file to load (repeatable, later files win); defaults to ./.config.json and ./.config.local.json
    #[arg(long = "config")]
    config: Vec<PathBuf>,
    /// Run all checks and print the bulk-copy commands without executing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            let _ = e.print();
            std::process::exit(EXIT_VALIDATION);
        }
    };

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<TransferError>() {
            Some(TransferError::Usage(message)) => {
                eprintln!("{}\n", message);
                let _ = Cli::command().print_help();
            }
            // the report itself was already printed line by line
            Some(TransferError::SchemaMismatch(_)) => tracing::error!("{}", err),
            _ => tracing::error!("{:#}", err),
        }
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let request =
        TransferRequest::resolve(cli.src.as_deref(), cli.dest.as_deref(), cli.batch_size)?
            .with_dry_run(cli.dry_run);

    let config_paths = if cli.config.is_empty() {
        config::default_config_paths()
    } else {
        cli.config
    };
    let config = config::load_config(&config_paths)?;

    commands::transfer(
        &request,
        &config,
        &mut PgConnector,
        &mut InheritedStdioRunner,
    )
    .await?;
    Ok(())
}
