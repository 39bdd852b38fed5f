//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Records,
//! lists and dry-run previews are formatted into strings first so the CLI
//! can print them and tests can assert on them.
//!
//! | format | record          | list                | preview                 |
//! |--------|-----------------|---------------------|-------------------------|
//! | table  | `KEY: value`    | prettytable         | `DRY RUN:` line + body  |
//! | json   | pretty JSON     | raw response        | request descriptors     |
//! | yaml   | YAML            | raw response        | request descriptors     |
//! | csv    | one-row CSV     | table as CSV        | `DRY RUN:` line + body  |

use std::fmt::Display;
use std::str::FromStr;

use prettytable::{Cell, Row, Table};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::ApiRequest;
use crate::core::payload::{display_value, value_at};
use crate::engine::{BatchReport, Candidate};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Errors while formatting output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to format YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to format CSV: {0}")]
    Csv(String),
}

/// Selected output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Csv,
}

impl OutputFormat {
    /// Format from the `--json/--yaml/--csv` flags, falling back to `default`.
    pub fn from_flags(json: bool, yaml: bool, csv: bool, default: OutputFormat) -> Self {
        if json {
            OutputFormat::Json
        } else if yaml {
            OutputFormat::Yaml
        } else if csv {
            OutputFormat::Csv
        } else {
            default
        }
    }

    fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

fn structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?.trim_end().to_string()),
        _ => Ok(serde_json::to_string_pretty(value)?),
    }
}

fn csv(table: &Table) -> Result<String, RenderError> {
    let writer = table
        .to_csv(Vec::new())
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RenderError::Csv(e.to_string()))
}

/// Short form of a nested value for a table cell.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("id"))
            .map(display_value)
            .unwrap_or_else(|| value.to_string()),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => display_value(other),
    }
}

/// Build a table from rows using `(title, dot-path)` columns.
pub fn table(rows: &[Value], columns: &[(&str, &str)]) -> Table {
    let mut table = Table::new();
    table.set_titles(Row::new(columns.iter().map(|(title, _)| Cell::new(title)).collect()));
    for row in rows {
        table.add_row(Row::new(
            columns
                .iter()
                .map(|(_, path)| Cell::new(&value_at(row, path).map(cell_text).unwrap_or_default()))
                .collect(),
        ));
    }
    table
}

/// Format one record.
pub fn format_record(record: &Value, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => structured(record, format),
        OutputFormat::Csv => {
            let columns: Vec<(&str, &str)> = record
                .as_object()
                .map(|m| m.keys().map(|k| (k.as_str(), k.as_str())).collect())
                .unwrap_or_default();
            csv(&table(std::slice::from_ref(record), &columns))
        }
        OutputFormat::Table => {
            let Some(map) = record.as_object() else {
                return Ok(display_value(record));
            };
            let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
            Ok(map
                .iter()
                .map(|(key, value)| {
                    format!("{:<width$}  {}", format!("{}:", key), cell_text(value), width = width + 1)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

/// Format list rows. Structured formats print the raw response.
pub fn format_list(
    rows: &[Value],
    raw: &Value,
    columns: &[(&str, &str)],
    format: OutputFormat,
) -> Result<String, RenderError> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => structured(raw, format),
        OutputFormat::Csv => csv(&table(rows, columns)),
        OutputFormat::Table if rows.is_empty() => Ok("No records found.".to_string()),
        OutputFormat::Table => Ok(table(rows, columns).to_string().trim_end().to_string()),
    }
}

/// Format dry-run previews, one block per request.
pub fn format_previews(requests: &[ApiRequest], format: OutputFormat) -> Result<String, RenderError> {
    if format.is_structured() {
        return structured(requests, format);
    }
    let mut blocks = Vec::with_capacity(requests.len());
    for request in requests {
        let mut block = format!("DRY RUN: {}", request);
        if let Some(body) = &request.body {
            block.push('\n');
            block.push_str(&serde_json::to_string_pretty(body)?);
        }
        blocks.push(block);
    }
    Ok(blocks.join("\n"))
}

/// Candidate table printed for an ambiguous name.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("ID"), Cell::new("NAME")]));
    for candidate in candidates {
        table.add_row(Row::new(vec![
            Cell::new(&candidate.id.to_string()),
            Cell::new(&candidate.name),
        ]));
    }
    table.to_string().trim_end().to_string()
}

/// Per-item summary of a batch.
pub fn format_batch(report: &BatchReport, format: OutputFormat) -> Result<String, RenderError> {
    if format.is_structured() {
        return structured(report, format);
    }
    Ok(report
        .items
        .iter()
        .map(|item| match &item.error {
            None => format!("{} {} ({}): ok", report.verb, item.name, item.id),
            Some(err) => format!("{} {} ({}): failed: {}", report.verb, item.name, item.id, err),
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dispatcher::ItemResult;
    use serde_json::json;

    #[test]
    fn format_flags_pick_first_set() {
        assert_eq!(OutputFormat::from_flags(false, false, false, OutputFormat::Yaml), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_flags(true, false, false, OutputFormat::Table), OutputFormat::Json);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn record_table_aligns_keys() {
        let out = format_record(
            &json!({"id": 4, "name": "edge", "type": {"id": 3, "name": "Tier-1"}}),
            OutputFormat::Table,
        )
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["id:    4", "name:  edge", "type:  Tier-1"]);
    }

    #[test]
    fn list_uses_kind_columns() {
        let rows = vec![json!({"id": 1, "name": "a", "type": {"name": "T"}})];
        let out = format_list(&rows, &json!({}), &[("ID", "id"), ("TYPE", "type.name")], OutputFormat::Table).unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains("TYPE"));
        assert!(out.contains('T'));

        let csv = format_list(&rows, &json!({}), &[("ID", "id"), ("NAME", "name")], OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["ID,NAME", "1,a"]);
    }

    #[test]
    fn empty_list_says_so() {
        let out = format_list(&[], &json!({"roles": []}), &[("ID", "id")], OutputFormat::Table).unwrap();
        assert_eq!(out, "No records found.");
    }

    #[test]
    fn previews_render_line_and_body() {
        let requests = vec![
            ApiRequest::put("/api/instances/10/stop"),
            ApiRequest::post("/api/roles", json!({"role": {"authority": "ops"}})),
        ];
        let out = format_previews(&requests, OutputFormat::Table).unwrap();
        assert!(out.starts_with("DRY RUN: PUT /api/instances/10/stop\nDRY RUN: POST /api/roles\n{"));
        assert!(out.contains("\"authority\": \"ops\""));

        let json_out = format_previews(&requests, OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&json_out).unwrap();
        assert_eq!(parsed[0]["method"], "PUT");
    }

    #[test]
    fn candidates_table_has_id_and_name() {
        let out = format_candidates(&[
            Candidate { id: 1, name: "db".into() },
            Candidate { id: 2, name: "db".into() },
        ]);
        assert!(out.contains("ID"));
        assert_eq!(out.matches("db").count(), 2);
    }

    #[test]
    fn batch_lines_report_each_item() {
        let report = BatchReport {
            verb: "stop".into(),
            items: vec![
                ItemResult { id: 10, name: "a".into(), error: None },
                ItemResult { id: 11, name: "b".into(), error: Some("500 - boom".into()) },
            ],
        };
        let out = format_batch(&report, OutputFormat::Table).unwrap();
        insta::assert_snapshot!(out, @r"
        stop a (10): ok
        stop b (11): failed: 500 - boom
        ");
    }
}
