// ABOUTME: Error kinds for a table transfer run and their process exit codes
// ABOUTME: Carried inside anyhow::Error and recovered in main via downcast

use thiserror::Error;

/// Exit code for usage and validation failures
pub const EXIT_VALIDATION: i32 = 1;
/// Exit code when the destination schema does not match the source
pub const EXIT_SCHEMA_MISMATCH: i32 = 2;
/// Exit code when the destination table already holds rows
pub const EXIT_NOT_EMPTY: i32 = 3;

/// Failures that abort a transfer with a specific exit code
#[derive(Error, Debug)]
pub enum TransferError {
    /// Bad or missing command line arguments
    #[error("{0}")]
    Usage(String),

    /// A validation gate rejected the run before anything was written
    #[error("{0}")]
    Validation(String),

    /// Column Differ found incompatible or extra columns
    #[error("Schema mismatch between source and destination ({} problem(s))", .0.len())]
    SchemaMismatch(Vec<String>),

    /// Destination table is not empty
    #[error("Table {table} already has {rows} rows. Aborting...")]
    DestinationNotEmpty { table: String, rows: i64 },

    /// A column has no data type, so no DDL can be produced for it
    #[error("Data type not found for column {column}")]
    MissingDataType { column: String },

    /// External bulk-copy command failed to spawn or exited non-zero
    #[error("Command exited with code {}: {command}", .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    ExternalProcess { command: String, code: Option<i32> },
}

impl TransferError {
    /// Process exit code this error should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            TransferError::Usage(_)
            | TransferError::Validation(_)
            | TransferError::MissingDataType { .. } => EXIT_VALIDATION,
            TransferError::SchemaMismatch(_) => EXIT_SCHEMA_MISMATCH,
            TransferError::DestinationNotEmpty { .. } => EXIT_NOT_EMPTY,
            TransferError::ExternalProcess { code, .. } => match code {
                Some(c) if *c != 0 => *c,
                _ => EXIT_VALIDATION,
            },
        }
    }
}

/// Exit code for an arbitrary error returned from a run
///
/// Errors that are not a [`TransferError`] (connection failures, bad config)
/// map to the generic failure code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TransferError>())
        .map(TransferError::exit_code)
        .unwrap_or(EXIT_VALIDATION)
}
