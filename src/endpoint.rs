// ABOUTME: Source and destination endpoint parsing
// ABOUTME: Turns "connection:table" and "file:path" specifiers into typed endpoints

use crate::error::TransferError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Connection name that marks a flat-file endpoint
pub const FILE_CONNECTION: &str = "file";

/// Where table data is read from or written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A table reachable through a named connection from the config
    Table { connection: String, table: String },
    /// A flat file on the local filesystem
    File { path: PathBuf },
}

impl Endpoint {
    /// Parse a source specifier; both parts are required
    pub fn parse_source(spec: &str) -> Result<Self, TransferError> {
        let (connection, table) = split_specifier(spec);
        match (connection, table) {
            (Some(connection), Some(table)) => Ok(Self::build(connection, table)),
            _ => Err(TransferError::Usage(format!(
                "Invalid source '{}': expected \"connection:table\" or \"file:path\"",
                spec
            ))),
        }
    }

    /// Parse a destination specifier, defaulting the table to the source's
    pub fn parse_destination(spec: &str, source: &Endpoint) -> Result<Self, TransferError> {
        let (connection, table) = split_specifier(spec);
        let Some(connection) = connection else {
            return Err(TransferError::Usage(format!(
                "Invalid destination '{}': expected \"connection[:table]\" or \"file:path\"",
                spec
            )));
        };
        let table = table.unwrap_or_else(|| source.name());
        Ok(Self::build(connection, table))
    }

    fn build(connection: &str, table: &str) -> Self {
        if connection == FILE_CONNECTION {
            Endpoint::File {
                path: PathBuf::from(table),
            }
        } else {
            Endpoint::Table {
                connection: connection.to_string(),
                table: table.to_string(),
            }
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Endpoint::File { .. })
    }

    /// Table name, or the file path for file endpoints
    pub fn name(&self) -> &str {
        match self {
            Endpoint::Table { table, .. } => table,
            // Paths that are not valid UTF-8 never come from a CLI string
            Endpoint::File { path } => path.to_str().unwrap_or_default(),
        }
    }

    pub fn connection(&self) -> &str {
        match self {
            Endpoint::Table { connection, .. } => connection,
            Endpoint::File { .. } => FILE_CONNECTION,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Endpoint::File { path } => Some(path),
            Endpoint::Table { .. } => None,
        }
    }

    /// True when both endpoints name the same connection and table
    pub fn same_location(&self, other: &Endpoint) -> bool {
        self.connection() == other.connection() && self.name() == other.name()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.connection(), self.name())
    }
}

fn split_specifier(spec: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(s: &str) -> Option<&str> {
        let s = s.trim();
        (!s.is_empty()).then_some(s)
    }
    match spec.split_once(':') {
        Some((connection, table)) => (non_empty(connection), non_empty(table)),
        None => (non_empty(spec), None),
    }
}
