//! Rendering of query results and table metadata for the terminal.

use std::str::FromStr;

use crate::engine::{QueryResult, TableDescriptor, TableSummary};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Renders headers and rows as an aligned text table.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let line = |cells: &[String]| -> String {
        widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{cell:<w$}")
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Renders a query result.
pub fn render_result(result: &QueryResult, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = result
                .rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_display_string()).collect())
                .collect();
            let mut out = render_table(&result.fields, &rows);
            let n = result.row_count();
            out.push_str(&format!("({} row{})\n", n, if n == 1 { "" } else { "s" }));
            Ok(out)
        }
    }
}

/// Renders a table listing.
pub fn render_tables(tables: &[TableDescriptor], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(tables),
        OutputFormat::Text => {
            let headers = ["Name", "Columns", "Rows", "Type"].map(String::from);
            let rows: Vec<Vec<String>> = tables
                .iter()
                .map(|t| {
                    vec![
                        t.name.clone(),
                        t.columns.len().to_string(),
                        t.count.to_string(),
                        t.kind.clone(),
                    ]
                })
                .collect();
            Ok(render_table(&headers, &rows))
        }
    }
}

/// Renders the column definitions of one table.
pub fn render_summary(summary: &TableSummary, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary),
        OutputFormat::Text => Ok(format!(
            "{}\n\n{}",
            summary.name,
            render_result(&summary.defs, OutputFormat::Text)?
        )),
    }
}
