// ABOUTME: CREATE TABLE synthesis from introspected column metadata
// ABOUTME: Used when the destination table does not exist yet

use super::schema::ColumnDescriptor;
use crate::error::TransferError;
use serde::Deserialize;

/// How column names are quoted in generated DDL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierQuote {
    /// `[name]`
    #[default]
    Bracket,
    /// `"name"`
    Double,
    /// bare `name`
    None,
}

impl IdentifierQuote {
    pub fn quote(self, identifier: &str) -> String {
        match self {
            IdentifierQuote::Bracket => format!("[{}]", identifier.replace(']', "]]")),
            IdentifierQuote::Double => format!("\"{}\"", identifier.replace('"', "\"\"")),
            IdentifierQuote::None => identifier.to_string(),
        }
    }
}

fn is_char_type(data_type: &str) -> bool {
    data_type.to_ascii_uppercase().ends_with("CHAR")
}

fn column_definition(
    column: &ColumnDescriptor,
    quote: IdentifierQuote,
) -> Result<String, TransferError> {
    let data_type = column
        .data_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| TransferError::MissingDataType {
            column: column.name.clone(),
        })?;
    let is_char = is_char_type(data_type);

    let mut definition = format!("    {} {}", quote.quote(&column.name), data_type);

    match (column.max_length, column.numeric_precision) {
        (Some(-1), _) => definition.push_str("(MAX)"),
        (Some(length), _) if is_char => definition.push_str(&format!("({})", length)),
        (_, Some(precision)) => definition.push_str(&format!(
            "({},{})",
            precision,
            column.numeric_scale.unwrap_or(0)
        )),
        _ => {}
    }

    if !column.is_nullable {
        definition.push_str(" NOT NULL");
    }

    if let Some(default) = &column.default_value {
        if is_char {
            definition.push_str(&format!(" DEFAULT '{}'", default));
        } else {
            definition.push_str(&format!(" DEFAULT {}", default));
        }
    }

    Ok(definition)
}

/// Build a `CREATE TABLE` statement with bracket-quoted column names
pub fn synthesize(columns: &[ColumnDescriptor], table: &str) -> Result<String, TransferError> {
    synthesize_with(columns, table, IdentifierQuote::default())
}

/// Build a `CREATE TABLE` statement using the given identifier quoting
///
/// # Errors
///
/// Returns [`TransferError::MissingDataType`] for the first column without a
/// data type.
pub fn synthesize_with(
    columns: &[ColumnDescriptor],
    table: &str,
    quote: IdentifierQuote,
) -> Result<String, TransferError> {
    let definitions = columns
        .iter()
        .map(|column| column_definition(column, quote))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!(
        "CREATE TABLE {} (\n{}\n);",
        table,
        definitions.join(",\n")
    ))
}
