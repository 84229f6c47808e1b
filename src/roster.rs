//! Researcher roster loading and sampling.
//!
//! The roster is a spreadsheet (xlsx, xlsm, xls, ods) or CSV file with at
//! least a `NAMA` column (display name) and a `scholar_id` column. Any other
//! named columns ride along on each [`ResearcherRef`] in file order.

use crate::error::{Result, ScholarError};
use calamine::{open_workbook_auto, Reader};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

/// Column holding the researcher's display name
pub const NAME_COLUMN: &str = "NAMA";

/// Column holding the Google Scholar user id
pub const ID_COLUMN: &str = "scholar_id";

/// A researcher to scrape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearcherRef {
    pub scholar_id: String,
    pub display_name: String,
    /// Remaining roster columns as (header, value), in file order
    pub extra: Vec<(String, String)>,
}

/// Header row plus raw cell rows of a roster file
struct RosterTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Load the roster, picking the reader from the file extension.
///
/// Rows with an empty `scholar_id` are skipped.
///
/// # Errors
///
/// Returns error if the file is missing, unreadable, or lacks a required column.
pub fn load_roster(path: &Path) -> Result<Vec<ResearcherRef>> {
    if !path.exists() {
        return Err(ScholarError::Config(format!("Input file {} not found", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        _ => read_csv(path)?,
    };

    let (name_idx, id_idx) = column_indexes(table.headers.iter().map(String::as_str))?;
    let extra_columns: Vec<(usize, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != name_idx && *i != id_idx && !h.is_empty())
        .map(|(i, h)| (i, h.as_str()))
        .collect();

    let mut roster = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let display_name = cell(name_idx);
        let scholar_id = cell(id_idx);
        if scholar_id.is_empty() {
            warn!(row = index + 1, name = %display_name, "Skipping roster row without scholar_id");
            continue;
        }
        roster.push(ResearcherRef {
            scholar_id,
            display_name,
            extra: extra_columns
                .iter()
                .map(|(i, header)| (header.to_string(), cell(*i)))
                .collect(),
        });
    }

    info!(count = roster.len(), path = %path.display(), "Loaded roster");
    Ok(roster)
}

/// Position of each required column in a header row.
fn column_indexes<'a>(headers: impl Iterator<Item = &'a str>) -> Result<(usize, usize)> {
    let headers: Vec<&str> = headers.map(str::trim).collect();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| ScholarError::Validation(format!("Roster is missing column '{}'", name)))
    };
    Ok((find(NAME_COLUMN)?, find(ID_COLUMN)?))
}

fn read_csv(path: &Path) -> Result<RosterTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(RosterTable { headers, rows })
}

fn read_spreadsheet(path: &Path) -> Result<RosterTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScholarError::Spreadsheet(format!("{} has no worksheets", path.display())))??;

    let mut sheet_rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect::<Vec<_>>());
    let headers = sheet_rows.next().unwrap_or_default();
    Ok(RosterTable {
        headers,
        rows: sheet_rows.collect(),
    })
}

/// Pick `count` distinct researchers at random.
///
/// # Errors
///
/// Returns a config error if `count` exceeds the roster size.
pub fn sample_researchers<R: Rng + ?Sized>(
    roster: &[ResearcherRef],
    count: usize,
    rng: &mut R,
) -> Result<Vec<ResearcherRef>> {
    if count > roster.len() {
        return Err(ScholarError::Config(format!(
            "Cannot sample {} researchers from a roster of {}",
            count,
            roster.len()
        )));
    }
    Ok(roster.choose_multiple(rng, count).cloned().collect())
}
