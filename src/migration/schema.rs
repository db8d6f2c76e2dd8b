// ABOUTME: Column metadata model and schema introspection queries
// ABOUTME: Reads INFORMATION_SCHEMA.COLUMNS into ordered column descriptors

use anyhow::{Context, Result};
use tokio_postgres::{Client, Row};

/// Types whose precision and scale belong in a column definition
const PRECISION_TYPES: &[&str] = &["numeric", "decimal"];

/// Normalized metadata for one table column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: Option<String>,
    pub is_nullable: bool,
    /// Character length; `-1` means unbounded (MAX)
    pub max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    /// Nullable column of the given type with no length or default
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
            is_nullable: true,
            ..Default::default()
        }
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_max_length(mut self, length: i32) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.numeric_precision = Some(precision);
        self.numeric_scale = Some(scale);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    fn from_row(row: &Row) -> Self {
        let is_nullable: String = row.get("is_nullable");
        Self {
            name: row.get("column_name"),
            data_type: row.get("udt_name"),
            is_nullable: !is_nullable.eq_ignore_ascii_case("NO"),
            max_length: row.get("character_maximum_length"),
            numeric_precision: row.get("numeric_precision"),
            numeric_scale: row.get("numeric_scale"),
            default_value: row.get("column_default"),
        }
        .normalize_postgres()
    }

    /// Reduce PostgreSQL catalog values to what a column definition can reuse
    ///
    /// The type is expected to be the `udt_name` (`int4`, `varchar`, `bpchar`),
    /// so character types keep their length. Precision and scale survive only
    /// for numeric types: `int4` reports a binary precision of 32 that is not
    /// part of its declaration. Sequence defaults are dropped because the
    /// sequence does not exist on the other side, and type casts are stripped
    /// from literal defaults.
    fn normalize_postgres(mut self) -> Self {
        let is_numeric = self
            .data_type
            .as_deref()
            .is_some_and(|t| PRECISION_TYPES.contains(&t.to_ascii_lowercase().as_str()));
        if !is_numeric {
            self.numeric_precision = None;
            self.numeric_scale = None;
        }

        let is_char = self
            .data_type
            .as_deref()
            .is_some_and(|t| t.to_ascii_uppercase().ends_with("CHAR"));
        self.default_value = self
            .default_value
            .take()
            .and_then(|default| postgres_default(&default, is_char));
        self
    }
}

/// Literal part of a PostgreSQL column default, `None` for sequence defaults
///
/// `'abc'::character varying` becomes `abc` for character columns (the DDL
/// quotes those itself) and `'abc'` otherwise; `(0)::numeric` becomes `(0)`.
fn postgres_default(default: &str, is_char: bool) -> Option<String> {
    let default = default.trim();
    if default.to_ascii_lowercase().starts_with("nextval(") {
        return None;
    }

    let literal = quoted_literal(default).filter(|literal| {
        let rest = &default[literal.len()..];
        rest.is_empty() || rest.strip_prefix("::").is_some_and(is_type_name)
    });
    if let Some(literal) = literal {
        let value = if is_char {
            literal[1..literal.len() - 1].to_string()
        } else {
            literal.to_string()
        };
        return Some(value);
    }

    let value = match default.rsplit_once("::") {
        Some((value, cast)) if is_type_name(cast) => value.trim(),
        _ => default,
    };
    Some(value.to_string())
}

/// Leading single-quoted literal, including its quotes
fn quoted_literal(value: &str) -> Option<&str> {
    if !value.starts_with('\'') {
        return None;
    }
    let bytes = value.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(&value[..=i]);
        }
        i += 1;
    }
    None
}

fn is_type_name(cast: &str) -> bool {
    !cast.is_empty()
        && cast.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ',' | '[' | ']' | '"')
        })
}

/// Introspected columns of one endpoint, in ordinal order
///
/// An empty column list means the table does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn exists(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// Split an optionally schema-qualified table name
fn split_qualified(table: &str) -> (Option<&str>, &str) {
    match table.split_once('.') {
        Some((schema, name)) => (Some(schema), name),
        None => (None, table),
    }
}

/// Double-quote a possibly schema-qualified name so it matches exactly
fn quoted_table_name(table: &str) -> String {
    let quote = |part: &str| format!("\"{}\"", part.replace('"', "\"\""));
    match split_qualified(table) {
        (Some(schema), name) => format!("{}.{}", quote(schema), quote(name)),
        (None, name) => quote(name),
    }
}

/// Fetch the ordered column list for a table
///
/// Names match exactly (case-sensitive); an unqualified name is looked up in
/// the session's current schema. Returns an empty schema when the table is
/// absent.
pub async fn fetch_table_schema(client: &Client, table: &str) -> Result<TableSchema> {
    tracing::debug!("Fetching columns for {}", table);

    let (schema, name) = split_qualified(table);
    let rows = client
        .query(
            "SELECT
                column_name::text AS column_name,
                udt_name::text AS udt_name,
                is_nullable::text AS is_nullable,
                character_maximum_length::int4 AS character_maximum_length,
                numeric_precision::int4 AS numeric_precision,
                numeric_scale::int4 AS numeric_scale,
                column_default::text AS column_default
             FROM information_schema.columns
             WHERE table_name = $1
               AND table_schema = COALESCE($2::text, current_schema())
             ORDER BY ordinal_position",
            &[&name, &schema],
        )
        .await
        .with_context(|| format!("Failed to fetch columns for table {}", table))?;

    Ok(TableSchema::new(
        rows.iter().map(ColumnDescriptor::from_row).collect(),
    ))
}

/// Count the rows currently in a table
pub async fn count_rows(client: &Client, table: &str) -> Result<i64> {
    let row = client
        .query_one(
            &format!("SELECT COUNT(*) AS count FROM {}", quoted_table_name(table)),
            &[],
        )
        .await
        .with_context(|| format!("Failed to count rows in {}", table))?;

    Ok(row.get("count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::connect;

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("dbo.orders"), (Some("dbo"), "orders"));
        assert_eq!(split_qualified("orders"), (None, "orders"));
    }

    #[test]
    fn test_quoted_table_name_preserves_case() {
        assert_eq!(quoted_table_name("Orders"), "\"Orders\"");
        assert_eq!(quoted_table_name("sales.Orders"), "\"sales\".\"Orders\"");
        assert_eq!(quoted_table_name("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_builder_defaults() {
        let col = ColumnDescriptor::new("id", "int").not_null();
        assert_eq!(col.data_type.as_deref(), Some("int"));
        assert!(!col.is_nullable);
        assert_eq!(col.max_length, None);
        assert!(TableSchema::new(vec![col]).exists());
        assert!(!TableSchema::default().exists());
    }

    #[test]
    fn test_integer_loses_binary_precision() {
        let col = ColumnDescriptor::new("id", "int4")
            .not_null()
            .with_precision(32, 0)
            .normalize_postgres();
        assert_eq!(col.numeric_precision, None);
        assert_eq!(col.numeric_scale, None);
        assert_eq!(
            crate::migration::synthesize(&[col], "t").unwrap(),
            "CREATE TABLE t (\n    [id] int4 NOT NULL\n);"
        );
    }

    #[test]
    fn test_numeric_keeps_precision_and_varchar_keeps_length() {
        let amount = ColumnDescriptor::new("amount", "numeric")
            .with_precision(10, 2)
            .normalize_postgres();
        assert_eq!(amount.numeric_precision, Some(10));
        assert_eq!(amount.numeric_scale, Some(2));

        let code = ColumnDescriptor::new("code", "varchar")
            .with_max_length(10)
            .normalize_postgres();
        assert_eq!(
            crate::migration::synthesize(&[code], "t").unwrap(),
            "CREATE TABLE t (\n    [code] varchar(10)\n);"
        );
    }

    #[test]
    fn test_sequence_default_is_dropped() {
        let col = ColumnDescriptor::new("id", "int4")
            .with_default("nextval('orders_id_seq'::regclass)")
            .normalize_postgres();
        assert_eq!(col.default_value, None);
    }

    #[test]
    fn test_literal_defaults_lose_casts() {
        assert_eq!(
            postgres_default("'new'::character varying", true).as_deref(),
            Some("new")
        );
        assert_eq!(
            postgres_default("'it''s'::text", false).as_deref(),
            Some("'it''s'")
        );
        assert_eq!(postgres_default("(0)::numeric", false).as_deref(), Some("(0)"));
        assert_eq!(postgres_default("now()", false).as_deref(), Some("now()"));
        assert_eq!(postgres_default("42", false).as_deref(), Some("42"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_table_schema() {
        let url = std::env::var("TEST_SOURCE_URL").unwrap();
        let client = connect(&url).await.unwrap();

        let schema = fetch_table_schema(&client, "pg_catalog.pg_class")
            .await
            .unwrap();

        assert!(schema.exists());
        println!("Found {} columns", schema.columns.len());
        for col in schema.columns.iter().take(10) {
            println!("  - {} {:?}", col.name, col.data_type);
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_missing_table_is_empty() {
        let url = std::env::var("TEST_SOURCE_URL").unwrap();
        let client = connect(&url).await.unwrap();

        let schema = fetch_table_schema(&client, "definitely_not_a_table_xyz")
            .await
            .unwrap();
        assert!(!schema.exists());
    }
}
