use rusqlite::Connection;
use tracing::warn;

use crate::error::{IntakeError, Result};
use crate::models::ParsedMemberRecord;

/// Storage seen by the importer: a natural-key lookup and an atomic write.
pub trait MemberGateway {
    /// Does a member with this `(phone_number, brand_name)` already exist?
    fn exists(&self, phone_number: &str, brand_name: &str) -> Result<bool>;

    /// Insert all records or none. Returns the number committed.
    fn bulk_insert(&mut self, records: &[ParsedMemberRecord]) -> Result<usize>;
}

const INSERT_MEMBER: &str = "INSERT INTO members (
    username, ip_address, last_login, membership_status, phone_number, membership_email,
    bank_name, account_name, account_no, saldo, turnover, win_loss, points,
    join_date, referral, uplink, status, brand_name
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)";

pub struct SqliteGateway<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteGateway<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl MemberGateway for SqliteGateway<'_> {
    fn exists(&self, phone_number: &str, brand_name: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM members WHERE phone_number = ?1 AND brand_name = ?2")?;
        Ok(stmt.exists(rusqlite::params![phone_number, brand_name])?)
    }

    fn bulk_insert(&mut self, records: &[ParsedMemberRecord]) -> Result<usize> {
        // Dropping `tx` without commit rolls back, on error returns and unwinding alike.
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare_cached(INSERT_MEMBER)?;
            for m in records {
                stmt.execute(rusqlite::params![
                    m.username,
                    m.ip_address,
                    m.last_login,
                    m.membership_status,
                    m.phone_number,
                    m.membership_email,
                    m.bank_name,
                    m.account_holder_name,
                    m.account_number,
                    m.balance,
                    m.turnover,
                    m.win_loss,
                    m.points,
                    m.join_date,
                    m.referral,
                    m.uplink,
                    m.deposit_status.map(|s| s.as_str()),
                    m.brand_name,
                ])
                .map_err(|e| {
                    warn!(
                        username = %m.username,
                        phone = %m.phone_number,
                        brand = %m.brand_name,
                        error = %e,
                        "member insert failed, rolling back batch"
                    );
                    IntakeError::Write(format!("username {}: {e}", m.username))
                })?;
                inserted += 1;
            }
        }
        tx.commit().map_err(|e| {
            warn!(batch = inserted, error = %e, "commit failed, rolling back batch");
            IntakeError::Write(format!("commit: {e}"))
        })?;
        Ok(inserted)
    }
}
