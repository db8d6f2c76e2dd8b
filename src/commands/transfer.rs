// ABOUTME: Transfer command that copies one table between endpoints
// ABOUTME: Validates endpoints, reconciles schemas, then runs export and import commands

use crate::config::{ConnectionConfig, TransferConfig};
use crate::database::{Connector, Database};
use crate::endpoint::Endpoint;
use crate::error::TransferError;
use crate::migration::{diff, synthesize_with, ExternalCommand, ProcessRunner, TableSchema};
use crate::template::{render, RenderOptions, Tags};
use crate::utils::sanitize_identifier;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default number of rows per bulk-copy batch
pub const DEFAULT_BATCH_SIZE: u64 = 10_000;

/// Stages a transfer moves through; any validation gate may abort instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Init,
    ResolveEndpoints,
    ValidateDistinctness,
    IntrospectNonFile,
    ReconcileSchema,
    ValidateDestinationEmpty,
    Export,
    Import,
    Done,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Init => "init",
            TransferStage::ResolveEndpoints => "resolve endpoints",
            TransferStage::ValidateDistinctness => "validate distinctness",
            TransferStage::IntrospectNonFile => "introspect",
            TransferStage::ReconcileSchema => "reconcile schema",
            TransferStage::ValidateDestinationEmpty => "validate destination empty",
            TransferStage::Export => "export",
            TransferStage::Import => "import",
            TransferStage::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: TransferStage) {
    tracing::debug!("Transfer stage: {}", stage);
}

/// A resolved transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub batch_size: u64,
    /// Validate and render commands without executing anything
    pub dry_run: bool,
}

impl TransferRequest {
    /// Resolve endpoints from `--src` and `--dest` specifiers
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Usage`] when either specifier is missing or
    /// malformed.
    pub fn resolve(
        src: Option<&str>,
        dest: Option<&str>,
        batch_size: u64,
    ) -> Result<Self, TransferError> {
        enter(TransferStage::Init);
        enter(TransferStage::ResolveEndpoints);

        let src = src.ok_or_else(|| TransferError::Usage("--src is required".to_string()))?;
        let dest = dest.ok_or_else(|| TransferError::Usage("--dest is required".to_string()))?;
        let source = Endpoint::parse_source(src)?;
        let destination = Endpoint::parse_destination(dest, &source)?;

        Ok(Self {
            source,
            destination,
            batch_size,
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// What a finished transfer did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// DDL synthesized for a missing destination table or a file destination
    pub ddl: Option<String>,
    /// Whether the DDL was executed against the destination connection
    pub table_created: bool,
    /// Where the DDL was written when the destination is a file
    pub ddl_file: Option<PathBuf>,
    /// Commands run (or, in a dry run, rendered) in order
    pub commands: Vec<ExternalCommand>,
}

/// A table endpoint with its open connection and introspected columns
struct OpenTable<'a, D> {
    connection: &'a str,
    table: &'a str,
    settings: &'a ConnectionConfig,
    db: D,
    schema: TableSchema,
}

impl<D> OpenTable<'_, D> {
    fn database_label(&self) -> String {
        self.settings
            .database()
            .unwrap_or_else(|| self.connection.to_string())
    }
}

async fn open_table<'a, C: Connector>(
    connector: &mut C,
    config: &'a TransferConfig,
    connection: &'a str,
    table: &'a str,
) -> Result<OpenTable<'a, C::Db>> {
    let settings = config.connection(connection)?;

    tracing::info!("Connecting to {}...", connection);
    let db = connector.connect(connection, settings).await?;

    tracing::info!(
        "Fetching table information for {} > {}...",
        settings.database().unwrap_or_else(|| connection.to_string()),
        sanitize_identifier(table)
    );
    let schema = db
        .table_schema(table)
        .await
        .with_context(|| format!("Failed to introspect {}:{}", connection, table))?;

    Ok(OpenTable {
        connection,
        table,
        settings,
        db,
        schema,
    })
}

/// Sibling file that receives DDL for a file destination
pub fn ddl_file_for(destination: &Path) -> Result<PathBuf, TransferError> {
    let file_name = destination.file_name().ok_or_else(|| {
        TransferError::Validation(format!(
            "Destination path {} has no file name",
            destination.display()
        ))
    })?;
    let mut ddl_name = file_name.to_os_string();
    ddl_name.push("-create.sql");
    Ok(match destination.parent() {
        Some(parent) => parent.join(ddl_name),
        None => PathBuf::from(ddl_name),
    })
}

fn command_tags(
    table_key: &str,
    table: &str,
    temp_file_name: &str,
    settings: &ConnectionConfig,
    batch_size: u64,
) -> Tags {
    let mut tags = Tags::new();
    tags.insert(table_key, table)
        .insert("tempFileName", temp_file_name)
        .extend_from_json(settings.fields())
        .insert("batchSize", batch_size);
    tags
}

fn run_command<R: ProcessRunner>(
    runner: &mut R,
    template: &str,
    tags: &Tags,
    dry_run: bool,
) -> Result<ExternalCommand> {
    let command = ExternalCommand::shell(render(template, tags, &RenderOptions::default()));
    if dry_run {
        println!("{}", command.command_line);
    } else {
        tracing::debug!("Running: {}", command.command_line);
        runner.run(&command)?;
    }
    Ok(command)
}

/// Copy one table from `request.source` to `request.destination`
///
/// Steps:
/// 1. Rejects identical endpoints and file-to-file copies
/// 2. Checks file endpoints on disk and introspects table endpoints
/// 3. Creates the destination table from the source columns when it is
///    missing, or diffs the two column lists when it exists
/// 4. Requires the destination table to be empty
/// 5. Runs the download command (table source) and the upload command
///    (table destination)
///
/// Nothing is written before step 3. A failure in step 5 leaves any created
/// table and intermediate file in place.
///
/// # Errors
///
/// Gate failures are returned as [`TransferError`] inside the
/// `anyhow::Error`; use [`crate::error::exit_code_for`] to map them to an
/// exit code.
pub async fn transfer<C, R>(
    request: &TransferRequest,
    config: &TransferConfig,
    connector: &mut C,
    runner: &mut R,
) -> Result<TransferOutcome>
where
    C: Connector,
    R: ProcessRunner,
{
    let source = &request.source;
    let destination = &request.destination;
    let mut outcome = TransferOutcome::default();

    enter(TransferStage::ValidateDistinctness);
    if source.same_location(destination) {
        return Err(TransferError::Validation(
            "Source and destination tables are the same".to_string(),
        )
        .into());
    }
    if source.is_file() && destination.is_file() {
        return Err(TransferError::Validation(
            "Source and destination connections cannot be both file".to_string(),
        )
        .into());
    }

    enter(TransferStage::IntrospectNonFile);
    let source_table = match source {
        Endpoint::File { path } => {
            if !path.exists() {
                return Err(TransferError::Validation(format!(
                    "Source file {} not found",
                    path.display()
                ))
                .into());
            }
            None
        }
        Endpoint::Table { connection, table } => {
            let opened = open_table(connector, config, connection, table).await?;
            if !opened.schema.exists() {
                return Err(TransferError::Validation(format!(
                    "Table {} not found in source connection {}.",
                    table, connection
                ))
                .into());
            }
            Some(opened)
        }
    };

    let dest_table = match destination {
        Endpoint::File { path } => {
            if path.exists() {
                return Err(TransferError::Validation(format!(
                    "Destination file {} already exists",
                    path.display()
                ))
                .into());
            }
            None
        }
        Endpoint::Table { connection, table } => {
            Some(open_table(connector, config, connection, table).await?)
        }
    };

    enter(TransferStage::ReconcileSchema);
    let mut dest_is_new = false;
    match (&source_table, &dest_table) {
        (Some(src), None) => {
            let quote = src.settings.identifier_quote()?;
            let ddl = synthesize_with(&src.schema.columns, src.table, quote)?;
            // destination is a file; only the DDL is written next to it
            if let Some(path) = destination.path() {
                let ddl_path = ddl_file_for(path)?;
                if request.dry_run {
                    tracing::info!("Would write create table SQL to {}", ddl_path.display());
                } else {
                    tracing::info!("Writing create table SQL to {}", ddl_path.display());
                    std::fs::write(&ddl_path, &ddl).with_context(|| {
                        format!("Failed to write {}", ddl_path.display())
                    })?;
                }
                outcome.ddl_file = Some(ddl_path);
            }
            outcome.ddl = Some(ddl);
        }
        (Some(src), Some(dest)) if !dest.schema.exists() => {
            tracing::info!(
                "Table {} not found in destination connection {}.",
                dest.table,
                dest.connection
            );
            let quote = dest.settings.identifier_quote()?;
            let ddl = synthesize_with(&src.schema.columns, dest.table, quote)?;
            if request.dry_run {
                tracing::info!("Would create target table:\n{}", ddl);
            } else {
                tracing::info!("Creating target table...");
                tracing::warn!(
                    "⚠ Table creation only copies column types, nullability, and defaults. \
                     Please make sure the table is created with the correct schema."
                );
                dest.db
                    .execute(&ddl)
                    .await
                    .with_context(|| format!("Failed to create table {}", dest.table))?;
                outcome.table_created = true;
            }
            dest_is_new = true;
            outcome.ddl = Some(ddl);
        }
        (Some(src), Some(dest)) => {
            let errors = diff(&src.schema.columns, &dest.schema.columns);
            if !errors.is_empty() {
                for error in &errors {
                    println!("{}", error);
                }
                return Err(TransferError::SchemaMismatch(errors).into());
            }
            tracing::info!("✓ Source and destination schemas match");
        }
        (None, Some(dest)) if !dest.schema.exists() => {
            return Err(TransferError::Validation(format!(
                "Table {} not found in destination connection {}; a file source has no schema to create it from",
                dest.table, dest.connection
            ))
            .into());
        }
        (None, _) => {}
    }

    enter(TransferStage::ValidateDestinationEmpty);
    if let Some(dest) = &dest_table {
        if dest_is_new {
            tracing::debug!("Skipping row count for newly created table {}", dest.table);
        } else {
            let rows = dest.db.row_count(dest.table).await?;
            if rows > 0 {
                return Err(TransferError::DestinationNotEmpty {
                    table: dest.table.to_string(),
                    rows,
                }
                .into());
            }
        }
    }

    let temp_file_name = match (source, destination) {
        (_, Endpoint::File { path }) | (Endpoint::File { path }, _) => {
            path.to_string_lossy().into_owned()
        }
        _ => config.temp_file_name.clone(),
    };

    enter(TransferStage::Export);
    if let Some(src) = &source_table {
        tracing::info!(
            "Fetching data from {} {} > {}...",
            src.connection,
            src.database_label(),
            src.table
        );
        let tags = command_tags(
            "sourceTable",
            src.table,
            &temp_file_name,
            src.settings,
            request.batch_size,
        );
        let command = run_command(
            runner,
            config.commands.download()?,
            &tags,
            request.dry_run,
        )
        .context("Export failed")?;
        outcome.commands.push(command);
    }

    enter(TransferStage::Import);
    if let Some(dest) = &dest_table {
        tracing::info!(
            "Pushing data to {} {} > {}...",
            dest.connection,
            dest.database_label(),
            dest.table
        );
        let tags = command_tags(
            "targetTable",
            dest.table,
            &temp_file_name,
            dest.settings,
            request.batch_size,
        );
        let command = run_command(runner, config.commands.upload()?, &tags, request.dry_run)
            .context("Import failed")?;
        outcome.commands.push(command);
    }

    enter(TransferStage::Done);
    tracing::info!("✅ Transfer complete");
    Ok(outcome)
}
