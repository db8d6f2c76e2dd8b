// ABOUTME: PostgreSQL backend for transfer endpoints
// ABOUTME: Exports connection management and the Database implementation

pub mod connection;
pub mod database;

pub use connection::{client_config, connect, connect_with_config, connect_with_retry};
pub use database::{PgConnector, PgDatabase};
