//! Output formatters for execution results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use gym_core::query::{ExecutionResult, PhaseTimings, Relation};

use crate::error::CliError;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// Tab-separated values
    Tsv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

/// Render a result in the given format.
pub fn format_result(result: &ExecutionResult, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(format!(
            "{}\n{}\n{}",
            result.name,
            relation_table(&result.relation),
            format_timings(&result.timings)
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Tsv => Ok(result.relation.to_tsv()),
    }
}

fn relation_table(relation: &Relation) -> String {
    if relation.columns().is_empty() {
        return format!("{} row(s)", relation.len());
    }

    let mut table = Table::new();
    table.set_header(relation.columns().iter().map(Cell::new));
    for row in relation.rows() {
        table.add_row(row.iter().map(Cell::new));
    }
    format!("{}\n{} row(s)", table, relation.len())
}

/// One-line summary of the phase timings.
pub fn format_timings(timings: &PhaseTimings) -> String {
    format!(
        "materialize {:?}, upward {:?}, downward {:?}, join {:?}, total {:?}",
        timings.materialize, timings.upward, timings.downward, timings.join, timings.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ExecutionResult {
        ExecutionResult {
            name: "q1".to_string(),
            relation: Relation::with_rows(
                vec!["s".into(), "o".into()],
                vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]],
            ),
            timings: PhaseTimings::default(),
        }
    }

    #[test]
    fn test_tsv() {
        assert_eq!(
            format_result(&result(), OutputFormat::Tsv).unwrap(),
            "s\to\na\tb\nc\td\n"
        );
    }

    #[test]
    fn test_table() {
        let out = format_result(&result(), OutputFormat::Table).unwrap();
        assert!(out.starts_with("q1\n"));
        assert!(out.contains("2 row(s)"));
        assert!(out.contains("materialize"));
    }

    #[test]
    fn test_json() {
        let out = format_result(&result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "q1");
        assert_eq!(value["relation"]["rows"][1][0], "c");
    }
}
