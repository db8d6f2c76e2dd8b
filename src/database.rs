// ABOUTME: Collaborator seams for schema introspection and connection setup
// ABOUTME: Lets the transfer orchestrator run against PostgreSQL or in-memory fakes

use crate::config::ConnectionConfig;
use crate::migration::TableSchema;
use anyhow::Result;

/// Queries the orchestrator needs from one endpoint's connection
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Ordered column list of `table`; empty when the table is absent
    async fn table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Number of rows currently in `table`
    async fn row_count(&self, table: &str) -> Result<i64>;

    /// Execute a raw statement such as generated DDL
    async fn execute(&self, statement: &str) -> Result<()>;
}

/// Opens a connection for a named endpoint
///
/// Called once per endpoint per run; the returned handle is reused for every
/// query against that endpoint.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Db: Database;

    async fn connect(&mut self, name: &str, config: &ConnectionConfig) -> Result<Self::Db>;
}
