//! Terminal rendering for info mode and the final session summary.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use drill_core::model::{Mastery, SessionStats};
use services::catalog::CatalogRow;

const HEADERS: [&str; 7] = ["s_id", "s_name", "c_id", "c_name", "m_id", "m_name", "m_mastery"];

fn cells(row: &CatalogRow) -> [String; 7] {
    [
        row.subject_id.to_string(),
        row.subject_name.clone(),
        row.course_id.to_string(),
        row.course_name.clone(),
        row.module_id.to_string(),
        row.module_name.clone(),
        row.mastery.to_string(),
    ]
}

fn paint_mastery(text: &str, mastery: Mastery) -> String {
    if mastery.value() >= 0.85 {
        text.bright_green().to_string()
    } else if mastery.value() >= 0.5 {
        text.yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

/// Aligned table of every module, one line per row.
pub fn render_catalog(rows: &[CatalogRow], color: bool) -> String {
    let body: Vec<[String; 7]> = rows.iter().map(cells).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    if color {
        let _ = writeln!(out, "{}", header.trim_end().bold());
    } else {
        let _ = writeln!(out, "{}", header.trim_end());
    }

    for (row, line) in rows.iter().zip(&body) {
        let padded: Vec<String> = line
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        let mut rendered = padded[..6].join("  ");
        rendered.push_str("  ");
        let mastery = padded[6].trim_end();
        if color {
            rendered.push_str(&paint_mastery(mastery, row.mastery));
        } else {
            rendered.push_str(mastery);
        }
        let _ = writeln!(out, "{rendered}");
    }
    out
}

pub fn render_stats(stats: &SessionStats) -> String {
    let accuracy = stats
        .accuracy()
        .map_or_else(|| "n/a".to_string(), |a| format!("{:.1}%", a * 100.0));
    format!(
        "{} {}  {} {}  {} {}  {} {}  accuracy {}",
        "correct".green(),
        stats.correct,
        "wrong".red(),
        stats.wrong,
        "lessons".cyan(),
        stats.lessons_completed,
        "cached".cyan(),
        stats.cache_hits,
        accuracy
    )
}
