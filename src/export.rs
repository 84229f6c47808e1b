//! Saving the joined table.

use crate::error::Result;
use crate::join::{joined_header, JoinedRow};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rows shown when the table is previewed instead of saved
pub const PREVIEW_ROWS: usize = 5;

/// What [`save_joined`] did with the rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// CSV written; `rows` may be zero, leaving only the header
    Written { path: PathBuf, rows: usize },
    /// Output path is not a CSV file; nothing written
    Previewed { preview: String, total: usize },
}

/// Whether `path` names a `.csv` file.
pub fn is_csv_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}

/// Save rows as CSV, or render a preview if the path is not a `.csv` file.
///
/// # Errors
///
/// Returns error if the CSV file cannot be created or written.
pub fn save_joined(path: &Path, rows: &[JoinedRow]) -> Result<SaveOutcome> {
    if !is_csv_path(path) {
        warn!(path = %path.display(), "Output file must be a CSV file, printing preview instead");
        return Ok(SaveOutcome::Previewed {
            preview: render_preview(rows, PREVIEW_ROWS),
            total: rows.len(),
        });
    }

    if rows.is_empty() {
        warn!(path = %path.display(), "No data collected, writing header only");
    }

    let file = std::fs::File::create(path)?;
    write_csv(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Saved CSV");

    Ok(SaveOutcome::Written {
        path: path.to_path_buf(),
        rows: rows.len(),
    })
}

/// Write the header line, then one record per row.
pub fn write_csv<W: Write>(writer: W, rows: &[JoinedRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(joined_header(rows))?;
    for row in rows {
        wtr.write_record(row.to_record())?;
    }
    wtr.flush()?;
    Ok(())
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(3)).collect();
        clipped.push_str("...");
        clipped
    }
}

/// Fixed-width text table of the first `limit` rows.
pub fn render_preview(rows: &[JoinedRow], limit: usize) -> String {
    let mut out = format!(
        "{:<16} {:<6} {:>9} {:<14} {:<20} {:<40}\n",
        "article_id", "year", "citations", "scholar_id", "NAMA", "title"
    );
    for row in rows.iter().take(limit) {
        out.push_str(&format!(
            "{:<16} {:<6} {:>9} {:<14} {:<20} {:<40}\n",
            clip(&row.article_id, 16),
            clip(&row.year, 6),
            row.num_of_citations,
            clip(&row.scholar_id, 14),
            clip(&row.display_name, 20),
            clip(&row.title, 40),
        ));
    }
    out.push_str(&format!("[{} of {} rows]", rows.len().min(limit), rows.len()));
    out
}
