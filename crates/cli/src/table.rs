//! Plain-text grid for the solution list.
//!
//! Entity kind and id stay hidden; the checkbox column mirrors the selection model.

use solman_core::{SelectionModel, Solution};

const MIN_WIDTH: usize = 60;
const DEFAULT_WIDTH: usize = 120;

/// Visible width, from `COLUMNS` when the shell exports it.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(DEFAULT_WIDTH)
        .max(MIN_WIDTH)
}

struct Column {
    title: &'static str,
    percent: usize,
}

// Share of the flexible width, in percent.
const COLUMNS: [Column; 5] = [
    Column { title: "Friendly name", percent: 20 },
    Column { title: "Unique name", percent: 20 },
    Column { title: "Version", percent: 10 },
    Column { title: "Installed on", percent: 10 },
    Column { title: "Description", percent: 30 },
];

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{text:<width$}");
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn cells(solution: &Solution) -> [String; 5] {
    [
        solution.friendly_name.clone(),
        solution.unique_name.clone(),
        solution.version.clone(),
        solution
            .installed_on
            .map(|ts| ts.date().to_string())
            .unwrap_or_default(),
        solution
            .description
            .as_deref()
            .unwrap_or_default()
            .replace(['\r', '\n'], " "),
    ]
}

/// Renders numbered rows (1-based) with a `[x]` marker for selected solutions.
pub fn render(rows: &[&Solution], selection: &SelectionModel, width: usize) -> String {
    let index_width = rows.len().max(1).to_string().len();
    let fixed = index_width + 1 + 3 + 1;
    let flexible = width.max(MIN_WIDTH).saturating_sub(fixed + COLUMNS.len());
    let widths: Vec<usize> = COLUMNS
        .iter()
        .map(|c| (flexible * c.percent / 90).max(c.title.len().min(8)))
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{:>index_width$} {:3}", "#", ""));
    for (col, w) in COLUMNS.iter().zip(&widths) {
        out.push(' ');
        out.push_str(&fit(col.title, *w));
    }
    out = out.trim_end().to_string();
    out.push('\n');

    for (i, solution) in rows.iter().enumerate() {
        let mark = if selection.is_selected(&solution.solution_id) {
            "[x]"
        } else {
            "[ ]"
        };
        let mut line = format!("{:>index_width$} {mark}", i + 1);
        for (cell, w) in cells(solution).iter().zip(&widths) {
            line.push(' ');
            line.push_str(&fit(cell, *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
