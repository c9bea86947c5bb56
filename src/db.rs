use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    ip_address TEXT,
    last_login TEXT,
    membership_status TEXT,
    phone_number TEXT NOT NULL,
    membership_email TEXT,
    bank_name TEXT,
    account_name TEXT,
    account_no TEXT,
    saldo TEXT,
    turnover TEXT,
    win_loss TEXT,
    points TEXT,
    join_date TEXT,
    referral TEXT,
    uplink TEXT,
    status TEXT,
    brand_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    uploaded_at TEXT DEFAULT (datetime('now')),
    UNIQUE (phone_number, brand_name),
    UNIQUE (username, brand_name)
);

CREATE INDEX IF NOT EXISTS idx_members_brand ON members (brand_name);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Member totals per brand, largest first.
pub fn count_by_brand(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT brand_name, count(*) FROM members GROUP BY brand_name ORDER BY count(*) DESC, brand_name",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
