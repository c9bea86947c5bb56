use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{IntakeError, Result};
use crate::models::{RawRow, UploadSource};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Spreadsheet,
}

fn detect_kind(file_path: &Path) -> Result<FileKind> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(FileKind::Csv),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" | "xlsm" | "ods" => Ok(FileKind::Spreadsheet),
        _ => Err(IntakeError::UnsupportedFormat(
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string(),
        )),
    }
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

/// Decode the first worksheet of an export into positional rows.
///
/// The size ceiling is checked before anything is decoded.
pub fn read_rows(file_path: &Path, skip_header: bool, max_bytes: u64) -> Result<Vec<RawRow>> {
    let size = std::fs::metadata(file_path)?.len();
    if size > max_bytes {
        return Err(IntakeError::FileTooLarge { size, limit: max_bytes });
    }

    let mut rows = match detect_kind(file_path)? {
        FileKind::Csv => read_csv(file_path)?,
        #[cfg(feature = "xlsx")]
        FileKind::Spreadsheet => read_spreadsheet(file_path)?,
    };
    if skip_header && !rows.is_empty() {
        rows.remove(0);
    }
    debug!(file = %file_path.display(), rows = rows.len(), "worksheet decoded");
    Ok(rows)
}

pub fn checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

pub fn upload_source(file_path: &Path, row_count: usize) -> Result<UploadSource> {
    Ok(UploadSource {
        filename: file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string(),
        checksum: checksum(file_path)?,
        row_count,
    })
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(file_path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file_path)?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// XLSX / XLS (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn read_spreadsheet(file_path: &Path) -> Result<Vec<RawRow>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| IntakeError::Spreadsheet(format!("Failed to open workbook: {e}")))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IntakeError::NoSheets)?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| IntakeError::Spreadsheet(format!("Failed to read sheet '{first}': {e}")))?;

    // The range starts at the first non-empty cell; re-anchor it at A1 so
    // column indices match the export layout.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<RawRow> = (0..start_row).map(|_| Vec::new()).collect();
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(String::new())
            .take(start_col as usize)
            .chain(row.iter().map(cell_text))
            .collect()
    }));
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Phone and account numbers often arrive as numeric cells.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Error(e) => e.to_string(),
    }
}
