use std::fmt;

use serde::{Deserialize, Serialize};

/// One worksheet row as decoded from the export, cells in column order.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositStatus {
    #[serde(rename = "New Deposit")]
    NewDeposit,
    #[serde(rename = "Redeposit")]
    Redeposit,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewDeposit => "New Deposit",
            Self::Redeposit => "Redeposit",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical member produced from one spreadsheet row.
///
/// `username` and `brand_name` are non-empty on every record that survives
/// row admission. `phone_number` is digits only and may be empty; the
/// importer skips those rows. Optional sub-fields are `None` when the cell
/// did not carry them, never `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMemberRecord {
    pub username: String,
    pub ip_address: Option<String>,
    /// Raw "last seen" text, not parsed as a date.
    pub last_login: Option<String>,
    pub membership_status: Option<String>,
    pub phone_number: String,
    pub membership_email: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    /// Display form, e.g. `Rp 150.000`.
    pub balance: Option<String>,
    pub turnover: Option<String>,
    pub win_loss: Option<String>,
    pub points: Option<String>,
    pub join_date: Option<String>,
    pub referral: Option<String>,
    pub uplink: Option<String>,
    pub brand_name: String,
    pub deposit_status: Option<DepositStatus>,
}

/// Where a staged batch came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSource {
    pub filename: String,
    /// SHA-256 of the file bytes, hex encoded.
    pub checksum: String,
    pub row_count: usize,
}
