//! Plain-text table rendering for terminal output.
//!
//! Widths are measured in terminal columns: ANSI colour sequences take no
//! space and East Asian wide characters take two.

use std::{borrow::Cow, fmt::Write as _};

const COLUMN_GAP: &str = "  ";
const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_cell_width: Option<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Cells wider than `width` columns are cut and end with an ellipsis.
    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = Some(width.max(2));
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let headers = self.cells(&self.headers);
        let rows = self.rows.iter().map(|row| self.cells(row)).collect::<Vec<_>>();

        let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
        for row in &rows {
            for (idx, cell) in row.iter().enumerate().take(widths.len()) {
                widths[idx] = widths[idx].max(display_width(cell));
            }
        }
        for width in &mut widths {
            *width = (*width).max(3);
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", format_row(&headers, &widths));
        let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
        let _ = writeln!(output, "{}", format_row(&separator, &widths));
        for row in &rows {
            let _ = writeln!(output, "{}", format_row(row, &widths));
        }
        output
    }

    fn cells(&self, values: &[String]) -> Vec<String> {
        values
            .iter()
            .map(|value| {
                let sanitized = sanitize_cell(value);
                match self.max_cell_width {
                    Some(limit) => truncate(&sanitized, limit),
                    None => sanitized.into_owned(),
                }
            })
            .collect()
    }
}

pub fn print_table(table: &Table) {
    print!("{}", table.render());
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let padding = width.saturating_sub(display_width(value));
            format!("{value}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn char_width(ch: char) -> usize {
    match ch {
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{303E}'
        | '\u{3041}'..='\u{33FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{A000}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}'
        | '\u{20000}'..='\u{3FFFD}' => 2,
        ch if ch.is_control() => 0,
        _ => 1,
    }
}

pub fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[1;33m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += char_width(ch);
        }
    }
    width
}

/// Cut plain text to at most `limit` columns. Text carrying ANSI sequences is
/// left alone.
fn truncate(value: &str, limit: usize) -> String {
    if value.contains('\u{1b}') || display_width(value) <= limit {
        return value.to_string();
    }
    let mut width = 0;
    let mut cut = String::new();
    for ch in value.chars() {
        let next = char_width(ch);
        if width + next + 1 > limit {
            break;
        }
        width += next;
        cut.push(ch);
    }
    cut.push(ELLIPSIS);
    cut
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
