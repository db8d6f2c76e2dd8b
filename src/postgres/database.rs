// ABOUTME: PostgreSQL implementation of the transfer database seams
// ABOUTME: One client per endpoint, reused for introspection, counts, and DDL

use super::connection::{client_config, connect_with_retry};
use crate::config::ConnectionConfig;
use crate::database::{Connector, Database};
use crate::migration::{count_rows, fetch_table_schema, TableSchema};
use anyhow::{Context, Result};
use tokio_postgres::Client;

/// Connects named endpoints to PostgreSQL
#[derive(Debug, Default)]
pub struct PgConnector;

impl Connector for PgConnector {
    type Db = PgDatabase;

    async fn connect(&mut self, name: &str, config: &ConnectionConfig) -> Result<PgDatabase> {
        let client_config = client_config(config)
            .with_context(|| format!("Invalid settings for connection '{}'", name))?;
        let client = connect_with_retry(&client_config)
            .await
            .with_context(|| format!("Failed to connect to '{}'", name))?;
        Ok(PgDatabase { client })
    }
}

/// An open PostgreSQL endpoint
pub struct PgDatabase {
    client: Client,
}

impl PgDatabase {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Database for PgDatabase {
    async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        fetch_table_schema(&self.client, table).await
    }

    async fn row_count(&self, table: &str) -> Result<i64> {
        count_rows(&self.client, table).await
    }

    async fn execute(&self, statement: &str) -> Result<()> {
        self.client
            .batch_execute(statement)
            .await
            .context("Failed to execute statement")
    }
}
