use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Left-aligned columns separated by two spaces. The last column is not
/// padded, so long notes and paths don't leave trailing whitespace.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    print_row(&widths, headers);
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).take(widths.len()).collect();
        print_row(&widths, &cells);
    }
}

fn print_row(widths: &[usize], cells: &[&str]) {
    let last = cells.len().saturating_sub(1);
    let line: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == last {
                cell.to_string()
            } else {
                format!("{cell:width$}", width = widths[i])
            }
        })
        .collect();
    println!("{}", line.join("  "));
}

/// Warnings go to stderr so `--json` stdout stays parseable.
pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
