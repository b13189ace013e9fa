//! Plain-text rendering of statistics tables.

use codestatlib::{StatsTable, TableRow};
use console::Style;

/// Width of every value column
const CELL_WIDTH: usize = 10;

/// Width of the label column
pub fn label_width(by_file: bool) -> usize {
    if by_file {
        60
    } else {
        24
    }
}

/// Truncate a name to fit within max_len, adding ".." prefix if needed
fn truncate_name(name: &str, max_len: usize) -> String {
    let len = name.chars().count();
    if len > max_len {
        let tail: String = name.chars().skip(len - max_len + 2).collect();
        format!("..{tail}")
    } else {
        name.to_string()
    }
}

fn format_line(label: &str, values: &[String], width: usize) -> String {
    let mut line = format!("{:<width$}", truncate_name(label, width - 2), width = width);
    for value in values {
        line.push_str(&format!("{:>width$}", value, width = CELL_WIDTH));
    }
    line
}

/// Header line followed by a separator.
pub fn format_header(headers: &[String], width: usize) -> String {
    let Some((label, values)) = headers.split_first() else {
        return String::new();
    };
    let header = format_line(label, values, width);
    let separator = "-".repeat(width + values.len() * CELL_WIDTH);
    format!("{}\n{}", Style::new().bold().apply_to(header), separator)
}

pub fn format_row(row: &TableRow, width: usize) -> String {
    format_line(&row.label, &row.values, width)
}

/// Separator, summary row and optional dimmed note.
pub fn format_footer(footer: &TableRow, note: Option<&str>, width: usize) -> String {
    let separator = "-".repeat(width + footer.values.len() * CELL_WIDTH);
    let mut out = format!(
        "{}\n{}",
        separator,
        Style::new().bold().apply_to(format_row(footer, width))
    );
    if let Some(note) = note {
        out.push('\n');
        out.push_str(&Style::new().dim().apply_to(note).to_string());
    }
    out
}

/// Render a complete table.
pub fn format_table(table: &StatsTable, width: usize) -> String {
    let mut lines = vec![format_header(&table.headers, width)];
    lines.extend(table.rows.iter().map(|row| format_row(row, width)));
    lines.push(format_footer(&table.footer, table.note.as_deref(), width));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short", 10), "short");
        assert_eq!(truncate_name("src/very/long/path.rs", 10), "../path.rs");
        assert_eq!(truncate_name("ünïcödé/ñame.rs", 9), "..ñame.rs");
    }

    #[test]
    fn test_format_row_alignment() {
        let row = TableRow {
            label: "Rust".to_string(),
            values: vec!["2".to_string(), "15".to_string()],
        };
        let line = format_row(&row, 8);
        assert_eq!(line, format!("Rust    {:>10}{:>10}", "2", "15"));
    }

    #[test]
    fn test_format_footer_with_note() {
        console::set_colors_enabled(false);
        let footer = TableRow {
            label: "Total (2 files)".to_string(),
            values: vec![String::new(), "15".to_string()],
        };

        let text = format_footer(&footer, Some("1 file could not be analyzed"), 20);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "-".repeat(40));
        assert_eq!(lines[1], format!("{:<20}{:>10}{:>10}", "Total (2 files)", "", "15"));
        assert_eq!(lines[2], "1 file could not be analyzed");

        assert_eq!(format_footer(&footer, None, 20).lines().count(), 2);
    }

    #[test]
    fn test_format_table_contains_everything() {
        let table = StatsTable {
            headers: vec!["Type".to_string(), "Code".to_string()],
            rows: vec![TableRow {
                label: "Python".to_string(),
                values: vec!["10".to_string()],
            }],
            footer: TableRow {
                label: "Total".to_string(),
                values: vec!["10".to_string()],
            },
            note: Some("1 file could not be analyzed".to_string()),
        };

        let text = format_table(&table, 12);
        assert!(text.contains("Type"));
        assert!(text.contains("Python"));
        assert!(text.contains("Total"));
        assert!(text.contains("1 file could not be analyzed"));
    }
}
