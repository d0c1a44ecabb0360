//! Parsing of engine-reported schemas and result payloads.
//!
//! Every function here is all-or-nothing: one bad entry or line fails the
//! whole parse.

use super::types::{ColumnDef, Row, TableDescriptor, TableEntry, BASE_TABLE};
use crate::error::{Result, TdError};

/// Parses a JSON-encoded array of `[name, type, ...]` entries.
///
/// Extra trailing elements (Treasure Data appends column aliases) are ignored.
pub fn parse_schema(schema: &str) -> Result<Vec<ColumnDef>> {
    let entries: Vec<Vec<String>> = serde_json::from_str(schema)
        .map_err(|e| TdError::parse(format!("invalid schema {schema:?}: {e}")))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut parts = entry.into_iter();
            match (parts.next(), parts.next()) {
                (Some(name), Some(data_type)) => Ok(ColumnDef::new(name, data_type)),
                _ => Err(TdError::parse(format!(
                    "schema entry {i} is not a [name, type] pair"
                ))),
            }
        })
        .collect()
}

/// Parses a result schema into its ordered column names.
pub fn parse_field_names(schema: &str) -> Result<Vec<String>> {
    Ok(parse_schema(schema)?.into_iter().map(|c| c.name).collect())
}

/// Parses a newline-delimited JSON payload, one array per non-empty line.
pub fn parse_rows(payload: &str) -> Result<Vec<Row>> {
    payload
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Row>(line)
                .map_err(|e| TdError::parse(format!("result line {}: {e}", i + 1)))
        })
        .collect()
}

/// Builds a table descriptor from a listing entry.
pub fn table_descriptor(entry: TableEntry) -> Result<TableDescriptor> {
    let columns = match entry.schema.as_deref() {
        Some(schema) if !schema.trim().is_empty() => {
            parse_schema(schema).map_err(|e| match e {
                TdError::Parse(msg) => TdError::parse(format!("table {}: {msg}", entry.name)),
                other => other,
            })?
        }
        _ => Vec::new(),
    };

    Ok(TableDescriptor {
        name: entry.name,
        columns,
        count: entry.count,
        kind: BASE_TABLE.to_string(),
    })
}
