use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DepositStatus, ParsedMemberRecord, RawRow};

// Fixed column layout of the platform's member export. Column 0 is the
// export's running number and column 6 is not used.
const COL_IDENTITY: usize = 1;
const COL_MEMBERSHIP: usize = 2;
const COL_BANK: usize = 3;
const COL_FINANCIALS: usize = 4;
const COL_JOIN_DATE: usize = 5;
const COL_REFERRAL: usize = 7;
const COL_UPLINK: usize = 8;

const EMAIL_PLACEHOLDER: &str = "---";

static IP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"IP:\s*([0-9.]+)").unwrap());
static LAST_SEEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Terakhir Terlihat:\s*(.+)").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8,15}$").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").unwrap()
});
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Rp\s*([0-9,.]+)").unwrap());
static TURNOVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Turnover:\s*Rp\s*([0-9,.]+)").unwrap());
static WIN_LOSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Kemenangan\s*(\d+)\s*Kekalahan\s*(\d+)").unwrap());
static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Points:\s*(\d+)").unwrap());

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn lines(cell: &str) -> Vec<String> {
    cell.replace("\r\n", "\n")
        .split('\n')
        .map(|l| l.trim().to_string())
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| non_empty(m.as_str()))
}

/// Strip everything but digits; a bare 8–15 digit mobile number starting
/// with `8` gets the trunk prefix `0`.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if PHONE_RE.is_match(&digits) && digits.starts_with('8') {
        format!("0{digits}")
    } else {
        digits
    }
}

/// Derive deposit status from a display balance such as `Rp 150.000`.
///
/// Returns `None` when the cleaned balance is neither empty/`0` nor carries
/// a non-zero digit (e.g. `Rp 0.000` cleans to `0000`).
pub fn deposit_status(balance: Option<&str>) -> Option<DepositStatus> {
    let cleaned: String = balance
        .unwrap_or("")
        .replace("Rp", "")
        .chars()
        .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "0" {
        Some(DepositStatus::NewDeposit)
    } else if cleaned.chars().any(|c| ('1'..='9').contains(&c)) {
        Some(DepositStatus::Redeposit)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Compound cells
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
struct Identity {
    username: String,
    ip_address: Option<String>,
    last_login: Option<String>,
}

fn parse_identity(cell: &str) -> Identity {
    let lines = lines(cell);
    let mut identity = Identity {
        username: lines.first().cloned().unwrap_or_default(),
        ..Default::default()
    };
    for line in &lines {
        if line.starts_with("IP:") {
            if let Some(ip) = capture(&IP_RE, line) {
                identity.ip_address = Some(ip);
            }
        }
        if line.starts_with("Terakhir Terlihat:") {
            if let Some(seen) = capture(&LAST_SEEN_RE, line) {
                identity.last_login = Some(seen);
            }
        }
    }
    identity
}

#[derive(Debug, Default, PartialEq)]
struct Membership {
    status: Option<String>,
    phone_number: String,
    email: Option<String>,
}

fn parse_membership(cell: &str) -> Membership {
    let lines = lines(cell);
    let mut membership = Membership {
        status: lines.first().and_then(|l| non_empty(l)),
        ..Default::default()
    };
    if let Some(phone) = lines.get(1) {
        membership.phone_number = normalize_phone(phone);
    }
    if let Some(email) = lines.get(2) {
        if !email.is_empty() && email.as_str() != EMAIL_PLACEHOLDER && EMAIL_RE.is_match(email) {
            membership.email = Some(email.clone());
        }
    }
    membership
}

#[derive(Debug, Default, PartialEq)]
struct Bank {
    name: Option<String>,
    holder: Option<String>,
    account: Option<String>,
}

fn parse_bank(cell: &str) -> Bank {
    let lines = lines(cell);
    Bank {
        name: lines.first().and_then(|l| non_empty(l)),
        holder: lines.get(1).and_then(|l| non_empty(l)),
        account: lines
            .get(2)
            .and_then(|l| DIGITS_RE.find(l))
            .map(|m| m.as_str().to_string()),
    }
}

#[derive(Debug, Default, PartialEq)]
struct Financials {
    balance: Option<String>,
    turnover: Option<String>,
    win_loss: Option<String>,
    points: Option<String>,
}

fn parse_financials(cell: &str) -> Financials {
    let lines = lines(cell);
    let mut fin = Financials {
        balance: lines
            .first()
            .and_then(|l| capture(&BALANCE_RE, l))
            .map(|amount| format!("Rp {amount}")),
        ..Default::default()
    };
    for line in &lines {
        if line.contains("Turnover:") {
            if let Some(amount) = capture(&TURNOVER_RE, line) {
                fin.turnover = Some(format!("Rp {amount}"));
            }
        }
        if line.contains("Kemenangan") || line.contains("Kekalahan") {
            if let Some(c) = WIN_LOSS_RE.captures(line) {
                fin.win_loss = Some(format!("Win: {}, Loss: {}", &c[1], &c[2]));
            }
        }
        if line.contains("Points:") {
            if let Some(points) = capture(&POINTS_RE, line) {
                fin.points = Some(points);
            }
        }
    }
    fin
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Parse one export row. Total: missing cells and sub-fields degrade to
/// empty values, nothing here fails.
pub fn parse_row(row: &[String], brand_name: &str) -> ParsedMemberRecord {
    let identity = parse_identity(cell(row, COL_IDENTITY));
    let membership = parse_membership(cell(row, COL_MEMBERSHIP));
    let bank = parse_bank(cell(row, COL_BANK));
    let fin = parse_financials(cell(row, COL_FINANCIALS));
    let uplink = cell(row, COL_UPLINK).replace("\r\n", "\n").replace('\n', " ");

    let status = deposit_status(fin.balance.as_deref());

    ParsedMemberRecord {
        username: identity.username,
        ip_address: identity.ip_address,
        last_login: identity.last_login,
        membership_status: membership.status,
        phone_number: membership.phone_number,
        membership_email: membership.email,
        bank_name: bank.name,
        account_holder_name: bank.holder,
        account_number: bank.account,
        balance: fin.balance,
        turnover: fin.turnover,
        win_loss: fin.win_loss,
        points: fin.points,
        join_date: non_empty(cell(row, COL_JOIN_DATE)),
        referral: non_empty(cell(row, COL_REFERRAL)),
        uplink: non_empty(&uplink),
        brand_name: brand_name.trim().to_string(),
        deposit_status: status,
    }
}

/// A row is admitted only when its identity cell names a username.
pub fn is_admissible(row: &[String]) -> bool {
    lines(cell(row, COL_IDENTITY))
        .first()
        .is_some_and(|username| !username.is_empty())
}

/// Admit and parse a decoded worksheet, keeping row order.
pub fn parse_rows(rows: &[RawRow], brand_name: &str) -> Vec<ParsedMemberRecord> {
    rows.iter()
        .filter(|row| is_admissible(row))
        .map(|row| parse_row(row, brand_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_row() -> RawRow {
        row(&[
            "1",
            "alice\nIP: 10.0.0.7\nTerakhir Terlihat: 2024-05-01 10:22",
            "VIP\n0812-345-6789\nalice@example.com",
            "BCA\nAlice Smith\nNo. 1234567890",
            "Rp 150.000\nTurnover: Rp 2.500.000\nKemenangan 12 Kekalahan 3\nPoints: 40",
            "2023-01-15",
            "",
            "friend",
            "agent-7\nregion west",
        ])
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("8123456789"), "08123456789");
        assert_eq!(normalize_phone("0812-345-6789"), "08123456789");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_normalize_phone_is_lenient() {
        // Too short for the mobile pattern, kept as cleaned digits.
        assert_eq!(normalize_phone("812"), "812");
        assert_eq!(normalize_phone("+62 812 3456 7890"), "6281234567890");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_deposit_status() {
        assert_eq!(deposit_status(Some("Rp 0")), Some(DepositStatus::NewDeposit));
        assert_eq!(deposit_status(Some("")), Some(DepositStatus::NewDeposit));
        assert_eq!(deposit_status(None), Some(DepositStatus::NewDeposit));
        assert_eq!(deposit_status(Some("Rp 150.000")), Some(DepositStatus::Redeposit));
        assert_eq!(deposit_status(Some("Rp 0.000")), None);
    }

    #[test]
    fn test_parse_identity() {
        let id = parse_identity("bob\r\nIP: 192.168.1.20\r\nTerakhir Terlihat: kemarin 21:00");
        assert_eq!(id.username, "bob");
        assert_eq!(id.ip_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(id.last_login.as_deref(), Some("kemarin 21:00"));
    }

    #[test]
    fn test_parse_identity_username_only() {
        let id = parse_identity("carol");
        assert_eq!(id, Identity { username: "carol".into(), ..Default::default() });
    }

    #[test]
    fn test_parse_membership_rejects_bad_email() {
        let m = parse_membership("Regular\n81111111111\nnot-an-email");
        assert_eq!(m.status.as_deref(), Some("Regular"));
        assert_eq!(m.phone_number, "081111111111");
        assert_eq!(m.email, None);

        let placeholder = parse_membership("Regular\n81111111111\n---");
        assert_eq!(placeholder.email, None);
    }

    #[test]
    fn test_parse_bank_extracts_first_digit_run() {
        let b = parse_bank("Mandiri\nBudi\nAcc 001-234");
        assert_eq!(b.name.as_deref(), Some("Mandiri"));
        assert_eq!(b.holder.as_deref(), Some("Budi"));
        assert_eq!(b.account.as_deref(), Some("001"));
    }

    #[test]
    fn test_parse_financials() {
        let f = parse_financials("Rp 1,250.50\nTurnover: Rp 9.000\nKemenangan 4 Kekalahan 9\nPoints: 7");
        assert_eq!(f.balance.as_deref(), Some("Rp 1,250.50"));
        assert_eq!(f.turnover.as_deref(), Some("Rp 9.000"));
        assert_eq!(f.win_loss.as_deref(), Some("Win: 4, Loss: 9"));
        assert_eq!(f.points.as_deref(), Some("7"));
    }

    #[test]
    fn test_parse_financials_balance_only_on_first_line() {
        let f = parse_financials("saldo kosong\nRp 50.000");
        assert_eq!(f.balance, None);
    }

    #[test]
    fn test_parse_row_full() {
        let rec = parse_row(&sample_row(), "X");
        assert_eq!(rec.username, "alice");
        assert_eq!(rec.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(rec.last_login.as_deref(), Some("2024-05-01 10:22"));
        assert_eq!(rec.membership_status.as_deref(), Some("VIP"));
        assert_eq!(rec.phone_number, "08123456789");
        assert_eq!(rec.membership_email.as_deref(), Some("alice@example.com"));
        assert_eq!(rec.bank_name.as_deref(), Some("BCA"));
        assert_eq!(rec.account_holder_name.as_deref(), Some("Alice Smith"));
        assert_eq!(rec.account_number.as_deref(), Some("1234567890"));
        assert_eq!(rec.balance.as_deref(), Some("Rp 150.000"));
        assert_eq!(rec.turnover.as_deref(), Some("Rp 2.500.000"));
        assert_eq!(rec.win_loss.as_deref(), Some("Win: 12, Loss: 3"));
        assert_eq!(rec.points.as_deref(), Some("40"));
        assert_eq!(rec.join_date.as_deref(), Some("2023-01-15"));
        assert_eq!(rec.referral.as_deref(), Some("friend"));
        assert_eq!(rec.uplink.as_deref(), Some("agent-7 region west"));
        assert_eq!(rec.brand_name, "X");
        assert_eq!(rec.deposit_status, Some(DepositStatus::Redeposit));
    }

    #[test]
    fn test_parse_row_short_row_degrades() {
        let rec = parse_row(&row(&["7", "dave"]), "X");
        assert_eq!(rec.username, "dave");
        assert_eq!(rec.phone_number, "");
        assert_eq!(rec.balance, None);
        assert_eq!(rec.uplink, None);
        assert_eq!(rec.deposit_status, Some(DepositStatus::NewDeposit));
    }

    #[test]
    fn test_parse_row_is_idempotent() {
        let r = sample_row();
        assert_eq!(parse_row(&r, "X"), parse_row(&r, "X"));
    }

    #[test]
    fn test_parse_rows_drops_blank_usernames() {
        let rows = vec![
            sample_row(),
            row(&["2", "   \nIP: 1.2.3.4", "Regular\n8123456789"]),
            row(&["3"]),
            row(&[]),
            row(&["4", "erin"]),
        ];
        let parsed = parse_rows(&rows, "X");
        let names: Vec<&str> = parsed.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "erin"]);
    }
}
