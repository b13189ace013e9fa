//! Table-ready data structures for statistics output.
//!
//! `StatsTable` is a presentation-ready structure that a front end can print
//! or serialize to JSON. It only formats data: aggregation happens in
//! [`Totals`], and the rows are sorted here once so every front end shows
//! the same order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::stats::{LineCounts, StatisticsResult, Totals};

/// A single row in the table (data row or footer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Row label (code type name, file path or "Total (N files)")
    pub label: String,
    /// Values for each column after the label, ready for display
    pub values: Vec<String>,
}

/// Table-ready statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsTable {
    /// Column headers, label column first
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<TableRow>,
    /// Summary row
    pub footer: TableRow,
    /// Optional note below the table (e.g. "2 files could not be analyzed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StatsTable {
    /// Headers of a [`StatsTable::by_type`] table.
    pub fn type_headers() -> Vec<String> {
        build_headers("Type", Some("Files"))
    }

    /// Headers of a [`StatsTable::by_file`] table.
    pub fn file_headers() -> Vec<String> {
        build_headers("File", Some("Type"))
    }

    /// One row per code type, largest code count first.
    pub fn by_type(totals: &Totals) -> Self {
        let mut entries: Vec<_> = totals.by_type.iter().collect();
        entries.sort_by(|(a_name, a), (b_name, b)| {
            b.counts
                .code
                .cmp(&a.counts.code)
                .then_with(|| a_name.cmp(b_name))
        });

        let rows = entries
            .into_iter()
            .map(|(name, entry)| {
                let mut values = vec![entry.file_count.to_string()];
                values.extend(format_counts(&entry.counts));
                TableRow {
                    label: name.clone(),
                    values,
                }
            })
            .collect();

        let mut footer_values = vec![totals.file_count.to_string()];
        footer_values.extend(format_counts(&totals.counts));

        Self {
            headers: Self::type_headers(),
            rows,
            footer: TableRow {
                label: "Total".to_string(),
                values: footer_values,
            },
            note: failure_note(totals),
        }
    }

    /// One row per file, sorted by path. Paths under `base` are shown relative
    /// to it.
    pub fn by_file(results: &[StatisticsResult], totals: &Totals, base: Option<&Path>) -> Self {
        let mut sorted: Vec<&StatisticsResult> = results.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let rows = sorted
            .into_iter()
            .map(|result| file_row(result, base))
            .collect();

        Self {
            headers: Self::file_headers(),
            rows,
            footer: file_footer(totals),
            note: failure_note(totals),
        }
    }
}

/// Summary row of a [`StatsTable::by_file`] table.
pub fn file_footer(totals: &Totals) -> TableRow {
    TableRow {
        label: format!("Total ({} files)", totals.file_count),
        values: std::iter::once(String::new())
            .chain(format_counts(&totals.counts))
            .collect(),
    }
}

/// Format a single result the way [`StatsTable::by_file`] does.
pub fn file_row(result: &StatisticsResult, base: Option<&Path>) -> TableRow {
    let path = base
        .and_then(|base| result.path.strip_prefix(base).ok())
        .unwrap_or(&result.path);

    let mut values = vec![result.code_type.clone()];
    values.extend(format_counts(&result.counts));
    TableRow {
        label: path.display().to_string(),
        values,
    }
}

fn build_headers(label: &str, extra: Option<&str>) -> Vec<String> {
    let mut headers = vec![label.to_string()];
    if let Some(extra) = extra {
        headers.push(extra.to_string());
    }
    headers.extend(
        ["Code", "Comments", "Blanks", "Total"]
            .iter()
            .map(|h| h.to_string()),
    );
    headers
}

fn format_counts(counts: &LineCounts) -> Vec<String> {
    vec![
        counts.code.to_string(),
        counts.comments.to_string(),
        counts.blanks.to_string(),
        counts.total.to_string(),
    ]
}

/// Note shown below a table when some files could not be analyzed.
pub fn failure_note(totals: &Totals) -> Option<String> {
    match totals.failure_count {
        0 => None,
        1 => Some("1 file could not be analyzed".to_string()),
        n => Some(format!("{n} files could not be analyzed")),
    }
}
