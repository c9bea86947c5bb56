use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::db::{count_by_brand, get_connection};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{db_path, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = db_path(&data_dir);

    println!("Data dir:     {}", data_dir.display());
    println!("Database:     {}", db_path.display());
    println!("Session TTL:  {} min", settings.session_ttl_minutes);
    println!("Upload limit: {}", format_bytes(settings.max_upload_bytes));

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `followup init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:      {}", format_bytes(size));

    let conn = get_connection(&db_path)?;
    let counts = count_by_brand(&conn)?;
    println!();
    if counts.is_empty() {
        println!("No members imported yet.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Brand", "Members"]);
    for (brand, count) in &counts {
        table.add_row(vec![Cell::new(brand), Cell::new(count)]);
    }
    println!("{table}");
    Ok(())
}
