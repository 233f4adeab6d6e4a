//! Terminal output helpers.

use colored::Colorize;

/// Column alignment for [`format_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Render rows under a highlighted header. Columns without an entry in
/// `align` are left aligned.
pub fn format_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = render_row(headers.iter().copied(), &widths, align);
    output.push_str(&format!("{}\n", header.bright_cyan().bold()));

    let sep = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&format!("{}\n", sep));

    for row in rows {
        output.push_str(&render_row(row.iter().map(String::as_str), &widths, align));
        output.push('\n');
    }

    output
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], align: &[Align]) -> String {
    cells
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| match align.get(i) {
            Some(Align::Right) => format!("{:>width$}", cell),
            _ => format!("{:<width$}", cell),
        })
        .collect::<Vec<_>>()
        .join(" │ ")
}

/// Format a key-value list.
pub fn format_kv_list(items: &[(&str, String)]) -> String {
    let max_key_len = items.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    items
        .iter()
        .map(|(k, v)| format!("  {}: {}", format!("{:max_key_len$}", k).bright_cyan(), v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration given in nanoseconds.
pub fn format_nanos(nanos: f64) -> String {
    if nanos < 1_000.0 {
        format!("{:.1} ns", nanos)
    } else if nanos < 1_000_000.0 {
        format!("{:.2} µs", nanos / 1_000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.2} ms", nanos / 1_000_000.0)
    } else {
        format!("{:.2} s", nanos / 1_000_000_000.0)
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!("\n{}", title.bright_green().bold());
    println!("{}", "─".repeat(title.chars().count()).bright_green());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".bright_green(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".bright_red(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".bright_yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        colored::control::set_override(false);
        let rows = vec![
            vec!["0".to_string(), "0.25".to_string()],
            vec!["10".to_string(), "1".to_string()],
        ];
        let table = format_table(&["i", "p"], &rows, &[Align::Right, Align::Left]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], " i │ p   ");
        assert_eq!(lines[1], "───┼─────");
        assert_eq!(lines[2], " 0 │ 0.25");
        assert_eq!(lines[3], "10 │ 1   ");
    }

    #[test]
    fn test_empty_table() {
        assert!(format_table(&["a"], &[], &[]).is_empty());
    }

    #[test]
    fn test_format_nanos() {
        assert_eq!(format_nanos(12.34), "12.3 ns");
        assert_eq!(format_nanos(1_500.0), "1.50 µs");
        assert_eq!(format_nanos(2_500_000.0), "2.50 ms");
        assert_eq!(format_nanos(3_000_000_000.0), "3.00 s");
    }
}
