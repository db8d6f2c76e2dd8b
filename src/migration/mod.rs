// ABOUTME: Schema reconciliation and bulk-copy building blocks
// ABOUTME: Column introspection, diffing, DDL synthesis, and external process runs

pub mod bulk_copy;
pub mod ddl;
pub mod diff;
pub mod schema;

pub use bulk_copy::{ExternalCommand, InheritedStdioRunner, ProcessRunner};
pub use ddl::{synthesize, synthesize_with, IdentifierQuote};
pub use diff::{diff, MismatchReport};
pub use schema::{count_rows, fetch_table_schema, ColumnDescriptor, TableSchema};
