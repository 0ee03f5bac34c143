//! Output formatting (JSON/text).
//!
//! Text output is a fixed-width table: one header, one rule line, then a
//! row per record. JSON output is an array of objects, one per record.

mod printable;

pub use printable::ClassifierRow;

use std::io::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Show the full classifier breakdown.
    pub extensive: bool,
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// A table column: title, padded width and the rule printed under it.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
    pub rule: &'static str,
}

impl Column {
    pub const fn new(title: &'static str, width: usize, rule: &'static str) -> Self {
        Self { title, width, rule }
    }
}

/// Write one left-aligned, space-separated row.
pub fn write_cells<W: Write, S: AsRef<str>>(
    w: &mut W,
    columns: &[Column],
    cells: &[S],
) -> std::io::Result<()> {
    let mut line = String::new();
    for (i, (col, cell)) in columns.iter().zip(cells).enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&format!("{:<width$}", cell.as_ref(), width = col.width));
    }
    writeln!(w, "{}", line.trim_end())
}

/// Write the header and rule lines for `columns`.
pub fn write_header<W: Write>(w: &mut W, columns: &[Column]) -> std::io::Result<()> {
    let titles: Vec<_> = columns.iter().map(|c| c.title).collect();
    let rules: Vec<_> = columns.iter().map(|c| c.rule).collect();
    write_cells(w, columns, &titles)?;
    write_cells(w, columns, &rules)
}

/// Trait for types that can be printed.
pub trait Printable {
    /// Print the table header preceding a list of these items.
    fn print_header<W: Write>(_w: &mut W, _opts: &OutputOptions) -> std::io::Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()>;

    /// Convert to JSON value.
    fn to_json(&self) -> serde_json::Value;
}

/// Write a list of items, with a header in text mode.
pub fn write_all<W: Write, T: Printable>(
    w: &mut W,
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => {
            T::print_header(w, opts)?;
            for item in items {
                item.print_text(w, opts)?;
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = items.iter().map(|i| i.to_json()).collect();
            if opts.pretty {
                serde_json::to_writer_pretty(&mut *w, &json)?;
            } else {
                serde_json::to_writer(&mut *w, &json)?;
            }
            writeln!(w)?;
        }
    }
    Ok(())
}

/// Print a list of items to stdout.
///
/// # Example
/// ```ignore
/// let rows = correlate(&snapshot, &config.ifb_dev, false);
/// print_all(&rows, format, &opts)?;
/// ```
pub fn print_all<T: Printable>(
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_all(&mut stdout, items, format, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: [Column; 2] = [Column::new("IP", 6, "---"), Column::new("HITS", 4, "----")];

    #[test]
    fn test_write_header() {
        let mut out = Vec::new();
        write_header(&mut out, &COLS).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "IP     HITS\n---    ----\n");
    }

    #[test]
    fn test_wide_cell_not_truncated() {
        let mut out = Vec::new();
        write_cells(&mut out, &COLS, &["10.0.0.1", "7"]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10.0.0.1 7\n");
    }
}
