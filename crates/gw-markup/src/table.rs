//! Table synthesis from `^`/`|` grid notation.
//!
//! Runs over the scanned line list. A `^ A ^ B ^` header opens a table, and
//! each following `| 1 | 2 |` row with the same number of cells joins it.
//! The first non-matching line closes the table, which is rendered as a
//! fixed-width grid inside a fence.

use crate::block::{Line, escape_raw};
use crate::rules::{LINE_BREAK, restore_brackets};

/// Transient table state, local to a single conversion.
#[derive(Debug)]
struct TableAccumulator {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableAccumulator {
    fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Parse `text` as a row of this table.
    fn row(&self, text: &str) -> Option<Vec<String>> {
        split_cells(text, '|').filter(|cells| cells.len() == self.header.len())
    }

    /// Render into fenced lines, or `None` if no row was collected.
    fn render(self) -> Option<Vec<Line>> {
        if self.rows.is_empty() {
            return None;
        }

        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_owned()
        };
        let separator = widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(Line::Fence);
        lines.push(Line::Raw(escape_raw(&format_row(&self.header))));
        lines.push(Line::Raw(separator));
        for row in &self.rows {
            lines.push(Line::Raw(escape_raw(&format_row(row))));
        }
        lines.push(Line::Fence);
        Some(lines)
    }
}

/// Split a `sep`-delimited line into cleaned cells.
///
/// The line must start with `sep`. A trailing `sep` is optional.
fn split_cells(text: &str, sep: char) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix(sep)?;
    let inner = inner.strip_suffix(sep).unwrap_or(inner);
    Some(inner.split(sep).map(clean_cell).collect())
}

/// Flatten a cell onto one line: rule-inserted line breaks become spaces.
fn clean_cell(cell: &str) -> String {
    let flat = restore_brackets(&cell.replace(LINE_BREAK, " "));
    flat.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_header(text: &str) -> Option<Vec<String>> {
    split_cells(text, '^').filter(|cells| cells.iter().any(|c| !c.is_empty()))
}

/// Replace table notation in `lines` with rendered table blocks.
///
/// Tables never span raw blocks: a fence or raw line closes an open table.
pub(crate) fn synthesize(lines: Vec<Line>, warnings: &mut Vec<String>) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    let mut table: Option<TableAccumulator> = None;

    for line in lines {
        if let Line::Text(text) = &line {
            if let Some(acc) = table.as_mut()
                && let Some(cells) = acc.row(text)
            {
                acc.rows.push(cells);
                continue;
            }

            if let Some(acc) = table.take() {
                flush(acc, &mut out, warnings);
            }
            if let Some(header) = parse_header(text) {
                table = Some(TableAccumulator::new(header));
                continue;
            }
        } else if let Some(acc) = table.take() {
            flush(acc, &mut out, warnings);
        }

        out.push(line);
    }

    if let Some(acc) = table.take() {
        flush(acc, &mut out, warnings);
    }
    out
}

fn flush(acc: TableAccumulator, out: &mut Vec<Line>, warnings: &mut Vec<String>) {
    let header = acc.header.join(", ");
    match acc.render() {
        Some(lines) => out.extend(lines),
        None => warnings.push(format!("Table with columns [{header}] has no rows, dropped")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(s: &str) -> Line {
        Line::Text(s.to_owned())
    }

    fn raw(s: &str) -> Line {
        Line::Raw(s.to_owned())
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(
            split_cells("^ A ^ B ^", '^'),
            Some(vec!["A".to_owned(), "B".to_owned()])
        );
        assert_eq!(
            split_cells("| 1 | 2", '|'),
            Some(vec!["1".to_owned(), "2".to_owned()])
        );
        assert_eq!(split_cells("no table", '|'), None);
    }

    #[test]
    fn test_single_row_table() {
        let mut warnings = Vec::new();
        let lines = synthesize(vec![text("^A^B^"), text("|1|2|"), text("")], &mut warnings);

        assert_eq!(
            lines,
            vec![
                Line::Fence,
                raw("A | B"),
                raw("--+--"),
                raw("1 | 2"),
                Line::Fence,
                text(""),
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_columns_padded_to_widest_cell() {
        let mut warnings = Vec::new();
        let lines = synthesize(
            vec![
                text("^ Name ^ Size ^"),
                text("| logo.png | 12 KiB |"),
                text("| a | 1 |"),
            ],
            &mut warnings,
        );

        assert_eq!(
            lines,
            vec![
                Line::Fence,
                raw("Name     | Size"),
                raw("---------+-------"),
                raw("logo.png | 12 KiB"),
                raw("a        | 1"),
                Line::Fence,
            ]
        );
    }

    #[test]
    fn test_header_without_rows_renders_nothing() {
        let mut warnings = Vec::new();
        let lines = synthesize(vec![text("^A^B^"), text("after")], &mut warnings);

        assert_eq!(lines, vec![text("after")]);
        assert_eq!(warnings, vec!["Table with columns [A, B] has no rows, dropped"]);
    }

    #[test]
    fn test_mismatched_row_closes_table() {
        let mut warnings = Vec::new();
        let lines = synthesize(
            vec![text("^A^B^"), text("|1|2|"), text("|1|2|3|")],
            &mut warnings,
        );

        assert_eq!(
            lines,
            vec![
                Line::Fence,
                raw("A | B"),
                raw("--+--"),
                raw("1 | 2"),
                Line::Fence,
                text("|1|2|3|"),
            ]
        );
    }

    #[test]
    fn test_raw_boundary_closes_table() {
        let mut warnings = Vec::new();
        let lines = synthesize(
            vec![text("^A^"), text("|1|"), Line::Fence, raw("|2|"), Line::Fence],
            &mut warnings,
        );

        assert_eq!(
            lines,
            vec![
                Line::Fence,
                raw("A"),
                raw("-"),
                raw("1"),
                Line::Fence,
                Line::Fence,
                raw("|2|"),
                Line::Fence,
            ]
        );
    }

    #[test]
    fn test_cells_flatten_line_breaks() {
        let mut warnings = Vec::new();
        let lines = synthesize(
            vec![
                text("^ Page ^"),
                text(&format!("| \n=> /start Home\n {LINE_BREAK}x |")),
            ],
            &mut warnings,
        );

        assert_eq!(lines[3], raw("=> /start Home x"));
    }

    #[test]
    fn test_rows_without_header_pass_through() {
        let mut warnings = Vec::new();
        let lines = synthesize(vec![text("|1|2|")], &mut warnings);

        assert_eq!(lines, vec![text("|1|2|")]);
    }
}
