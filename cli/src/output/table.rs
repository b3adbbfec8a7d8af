//! Bordered table rendering for `list` and `show` replies.
//!
//! ```text
//! +-------------+---------+---------+------+
//! | Domain name | Status  | Address | Port |
//! +-------------+---------+---------+------+
//! | vm1         | running | ::      |  623 |
//! +-------------+---------+---------+------+
//! ```
//!
//! Columns whose every value is an integer are right-aligned.

use console::measure_text_width;
use owo_colors::OwoColorize as _;

use crate::output::Styles;

/// Render `header` and `rows` as a table, one line per element.
///
/// Rows shorter than the header are padded with empty cells; extra cells
/// are dropped.
#[must_use]
pub fn render(header: &[String], rows: &[Vec<String>], styles: &Styles) -> Vec<String> {
    let cols = header.len();

    let widths: Vec<usize> = (0..cols)
        .map(|i| {
            rows.iter()
                .map(|r| measure_text_width(cell(r, i)))
                .chain(std::iter::once(measure_text_width(&header[i])))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let numeric: Vec<bool> = (0..cols)
        .map(|i| !rows.is_empty() && rows.iter().all(|r| cell(r, i).parse::<i64>().is_ok()))
        .collect();

    let border = {
        let line = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        format!("+{line}+").style(styles.dim).to_string()
    };
    let bar = "|".style(styles.dim).to_string();

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(border.clone());
    let titles: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!(" {} ", pad(h, *w, false).style(styles.header)))
        .collect();
    lines.push(format!("{bar}{}{bar}", titles.join(&bar)));
    lines.push(border.clone());
    for row in rows {
        let cells: Vec<String> = (0..cols)
            .map(|i| {
                let text = cell(row, i);
                format!(" {} ", pad(text, widths[i], numeric[i]).style(styles.cell(text)))
            })
            .collect();
        lines.push(format!("{bar}{}{bar}", cells.join(&bar)));
    }
    lines.push(border);
    lines
}

/// Cell `i` of `row`, empty when the row is short.
fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map_or("", String::as_str)
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(measure_text_width(text)));
    if right {
        format!("{fill}{text}")
    } else {
        format!("{text}{fill}")
    }
}
