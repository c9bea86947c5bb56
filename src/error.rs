use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported file format: {0} (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat(String),

    #[error("File is too large ({size} bytes, limit is {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("No valid member rows found in file")]
    EmptyBatch,

    #[error("Brand name is required")]
    MissingBrand,

    #[error("Upload session not found or expired; upload the file again")]
    SessionNotFound,

    #[error("Failed to save new members: {0}")]
    Write(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
