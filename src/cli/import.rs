use std::path::PathBuf;

use colored::Colorize;
use dialoguer::{Confirm, Input};

use crate::db::{get_connection, init_db};
use crate::error::{IntakeError, Result};
use crate::fmt::import_summary;
use crate::gateway::SqliteGateway;
use crate::importer::Intake;
use crate::settings::{db_path, load_settings};
use crate::staging::StagingStore;
use crate::workbook::{read_rows, upload_source};

use super::preview_table;

pub fn run(file: &str, brand: &str, skip_header: bool, yes: bool) -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let conn = get_connection(&db_path(&data_dir))?;
    init_db(&conn)?;

    let file_path = PathBuf::from(file);
    let rows = read_rows(&file_path, skip_header, settings.max_upload_bytes)?;
    let source = upload_source(&file_path, rows.len())?;

    let store = StagingStore::with_ttl_minutes(settings.session_ttl_minutes);
    let mut intake = Intake::new(store, SqliteGateway::new(&conn));
    let staged = intake.stage_upload(&rows, brand, Some(source))?;

    println!("{}", preview_table(&staged.records));
    println!(
        "{} member(s) staged for brand '{}'.",
        staged.records.len(),
        staged.brand_name
    );

    let brand = if yes {
        staged.brand_name.clone()
    } else {
        let brand: String = Input::new()
            .with_prompt("Brand")
            .default(staged.brand_name.clone())
            .interact_text()
            .unwrap_or_else(|_| staged.brand_name.clone());
        let proceed = Confirm::new()
            .with_prompt(format!("Import into '{}'?", brand.trim()))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !proceed {
            intake.discard(&staged.token);
            println!("{}", "Import cancelled, nothing was saved.".yellow());
            return Ok(());
        }
        brand
    };

    let outcome = intake.confirm_import(&staged.token, Some(brand.as_str()))?;
    let summary = import_summary(&outcome);
    if !outcome.is_success() {
        return Err(IntakeError::Other(summary));
    }
    println!("{}", summary.green());
    Ok(())
}
