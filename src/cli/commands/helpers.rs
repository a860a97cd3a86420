//! Shared helper functions for CLI commands.

use serde::Serialize;

/// How a command prints records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for a terminal
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Widest a table column may grow before values are cut.
const MAX_COLUMN_WIDTH: usize = 48;

/// Truncate a string to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    // Newlines would break table rows
    let flat = s.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as left-aligned columns sized to their content.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", truncate(c, *w), width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let rule = "-".repeat(total.max(20));

    println!("{}", rule);
    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()));
    println!("{}", rule);
    for row in rows {
        println!("{}", line(row.clone()));
    }
}

/// Display an optional count, `-` when unknown.
pub fn opt_count(n: Option<i64>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ünïcödé text", 5), "ünïc…");
        assert_eq!(truncate("line\nbreak", 20), "line break");
    }

    #[test]
    fn unknown_counts_render_as_dash() {
        assert_eq!(opt_count(None), "-");
        assert_eq!(opt_count(Some(0)), "0");
    }
}
