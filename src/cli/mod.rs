pub mod import;
pub mod init;
pub mod preview;
pub mod status;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::or_dash;
use crate::models::{DepositStatus, ParsedMemberRecord};

#[derive(Parser)]
#[command(
    name = "followup",
    about = "Stage and import member spreadsheet exports into the member database."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for followup data (default: ~/Documents/followup)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Parse an export and show the members it contains, without saving.
    Preview {
        /// Path to an XLSX, XLS or CSV export
        file: String,
        /// Brand the members belong to
        #[arg(long)]
        brand: String,
        /// Treat the first row as a header
        #[arg(long = "skip-header")]
        skip_header: bool,
        /// Print parsed records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stage an export, review it, and import new members.
    Import {
        /// Path to an XLSX, XLS or CSV export
        file: String,
        /// Brand the members belong to
        #[arg(long)]
        brand: String,
        /// Treat the first row as a header
        #[arg(long = "skip-header")]
        skip_header: bool,
        /// Import without prompting
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show the database location and member counts per brand.
    Status,
}

pub(crate) fn deposit_cell(status: Option<DepositStatus>) -> Cell {
    match status {
        Some(s @ DepositStatus::NewDeposit) => Cell::new(s.as_str().yellow()),
        Some(s @ DepositStatus::Redeposit) => Cell::new(s.as_str().green()),
        None => Cell::new("-"),
    }
}

pub(crate) fn preview_table(records: &[ParsedMemberRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "#", "Username", "Phone", "Email", "Bank", "Account", "Balance", "Turnover", "Status",
        "Uplink",
    ]);
    for (i, r) in records.iter().enumerate() {
        let phone = if r.phone_number.is_empty() {
            Cell::new("(none)".red())
        } else {
            Cell::new(&r.phone_number)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&r.username),
            phone,
            Cell::new(or_dash(r.membership_email.as_deref())),
            Cell::new(or_dash(r.bank_name.as_deref())),
            Cell::new(or_dash(r.account_number.as_deref())),
            Cell::new(or_dash(r.balance.as_deref())),
            Cell::new(or_dash(r.turnover.as_deref())),
            deposit_cell(r.deposit_status),
            Cell::new(or_dash(r.uplink.as_deref())),
        ]);
    }
    table
}
