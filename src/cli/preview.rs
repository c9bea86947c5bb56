use std::path::PathBuf;

use crate::error::{IntakeError, Result};
use crate::parser::parse_rows;
use crate::settings::load_settings;
use crate::workbook::read_rows;

use super::preview_table;

pub fn run(file: &str, brand: &str, skip_header: bool, json: bool) -> Result<()> {
    let brand = brand.trim();
    if brand.is_empty() {
        return Err(IntakeError::MissingBrand);
    }
    let settings = load_settings();
    let rows = read_rows(&PathBuf::from(file), skip_header, settings.max_upload_bytes)?;
    let records = parse_rows(&rows, brand);

    if json {
        let out = serde_json::to_string_pretty(&records)
            .map_err(|e| IntakeError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if records.is_empty() {
        println!("No member rows found ({} row(s) read).", rows.len());
        return Ok(());
    }
    println!("{}", preview_table(&records));
    println!(
        "{} member(s) parsed from {} row(s), {} without a phone number.",
        records.len(),
        rows.len(),
        records.iter().filter(|r| r.phone_number.is_empty()).count()
    );
    Ok(())
}
