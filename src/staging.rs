use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::models::{ParsedMemberRecord, UploadSource};

pub const DEFAULT_TTL_MINUTES: u64 = 30;

/// Longest TTL a store accepts: one year.
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

const TOKEN_BYTES: usize = 32;

/// A parsed batch waiting for confirmation. Never mutated after staging.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub token: String,
    pub records: Vec<ParsedMemberRecord>,
    pub brand_name: String,
    pub created_at: DateTime<Utc>,
    pub source: Option<UploadSource>,
}

/// Process-wide holding area for staged uploads, keyed by single-use token.
///
/// Expiry is swept lazily on every `stage`; there is no timer. A session can
/// therefore outlive its TTL until the next upload arrives, but it is only
/// ever read through `take`, which removes it.
#[derive(Clone)]
pub struct StagingStore {
    sessions: Arc<Mutex<HashMap<String, UploadSession>>>,
    ttl: Duration,
}

impl Default for StagingStore {
    fn default() -> Self {
        Self::with_ttl_minutes(DEFAULT_TTL_MINUTES)
    }
}

impl StagingStore {
    /// Values above `MAX_TTL_MINUTES` are clamped.
    pub fn with_ttl_minutes(minutes: u64) -> Self {
        if minutes > MAX_TTL_MINUTES {
            warn!(
                requested = minutes,
                max = MAX_TTL_MINUTES,
                "session TTL too large, clamping"
            );
        }
        let ttl = i64::try_from(minutes.min(MAX_TTL_MINUTES))
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES as i64));
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Stage a parsed batch and return its token.
    pub fn stage(
        &self,
        records: Vec<ParsedMemberRecord>,
        brand_name: &str,
        source: Option<UploadSource>,
    ) -> String {
        self.stage_at(records, brand_name, source, Utc::now())
    }

    pub(crate) fn stage_at(
        &self,
        records: Vec<ParsedMemberRecord>,
        brand_name: &str,
        source: Option<UploadSource>,
        now: DateTime<Utc>,
    ) -> String {
        let mut token = new_token();
        let record_count = records.len();
        let (file, digest, rows) = source
            .as_ref()
            .map(|s| (s.filename.clone(), short(&s.checksum).to_string(), s.row_count))
            .unwrap_or_default();

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| now - s.created_at <= self.ttl);
        let evicted = before - sessions.len();

        while sessions.contains_key(&token) {
            token = new_token();
        }
        sessions.insert(
            token.clone(),
            UploadSession {
                token: token.clone(),
                records,
                brand_name: brand_name.to_string(),
                created_at: now,
                source,
            },
        );
        let pending = sessions.len();
        drop(sessions);

        if evicted > 0 {
            info!(evicted, "expired upload sessions evicted");
        }
        info!(
            token = short(&token),
            brand = brand_name,
            records = record_count,
            rows,
            file = %file,
            sha256 = %digest,
            pending,
            "upload staged"
        );
        token
    }

    /// Remove and return a session. A token can be taken once.
    pub fn take(&self, token: &str) -> Option<UploadSession> {
        let session = self.lock().remove(token);
        debug!(token = short(token), found = session.is_some(), "upload session taken");
        session
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UploadSession>> {
        // A panic while holding the guard cannot leave a half-written entry.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Token prefix safe to put in logs.
pub fn short(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str) -> ParsedMemberRecord {
        ParsedMemberRecord {
            username: username.to_string(),
            phone_number: "081234567890".to_string(),
            brand_name: "X".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_then_take_returns_records() {
        let store = StagingStore::default();
        let records = vec![record("alice"), record("bob")];
        let token = store.stage(records.clone(), "X", None);
        let session = store.take(&token).unwrap();
        assert_eq!(session.records, records);
        assert_eq!(session.brand_name, "X");
        assert_eq!(session.token, token);
    }

    #[test]
    fn test_take_is_single_use() {
        let store = StagingStore::default();
        let token = store.stage(vec![record("alice")], "X", None);
        assert!(store.take(&token).is_some());
        assert!(store.take(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_token() {
        let store = StagingStore::default();
        assert!(store.take("nope").is_none());
    }

    #[test]
    fn test_tokens_are_random_hex() {
        let store = StagingStore::default();
        let a = store.stage(vec![record("a")], "X", None);
        let b = store.stage(vec![record("b")], "X", None);
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_stage_evicts_expired_sessions() {
        let store = StagingStore::default();
        let now = Utc::now();
        let old = store.stage_at(vec![record("old")], "X", None, now - Duration::minutes(31));
        let recent = store.stage_at(vec![record("recent")], "X", None, now - Duration::minutes(10));
        assert_eq!(store.len(), 2);

        store.stage_at(vec![record("new")], "X", None, now);
        assert!(store.take(&old).is_none());
        assert!(store.take(&recent).is_some());
    }

    #[test]
    fn test_expired_session_survives_until_next_stage() {
        let store = StagingStore::default();
        let old = store.stage_at(
            vec![record("old")],
            "X",
            None,
            Utc::now() - Duration::minutes(45),
        );
        // No sweep has run yet.
        assert!(store.take(&old).is_some());
    }

    #[test]
    fn test_custom_ttl() {
        let store = StagingStore::with_ttl_minutes(5);
        let now = Utc::now();
        let token = store.stage_at(vec![record("a")], "X", None, now - Duration::minutes(6));
        store.stage_at(vec![record("b")], "X", None, now);
        assert!(store.take(&token).is_none());
    }

    #[test]
    fn test_oversized_ttl_is_clamped() {
        let now = Utc::now();
        for minutes in [1u64 << 62, u64::MAX] {
            let store = StagingStore::with_ttl_minutes(minutes);
            let fresh = store.stage_at(vec![record("a")], "X", None, now - Duration::seconds(1));
            let month_old = store.stage_at(vec![record("b")], "X", None, now - Duration::days(30));
            store.stage_at(vec![record("c")], "X", None, now);
            assert!(store.take(&fresh).is_some());
            assert!(store.take(&month_old).is_some());
        }
    }

    #[test]
    fn test_ttl_at_ceiling_still_expires() {
        let store = StagingStore::with_ttl_minutes(u64::MAX);
        let now = Utc::now();
        let ancient = store.stage_at(vec![record("a")], "X", None, now - Duration::days(400));
        store.stage_at(vec![record("b")], "X", None, now);
        assert!(store.take(&ancient).is_none());
    }

    #[test]
    fn test_concurrent_stage_and_take() {
        let store = StagingStore::default();
        std::thread::scope(|s| {
            for i in 0..8 {
                let store = store.clone();
                s.spawn(move || {
                    for j in 0..25 {
                        let name = format!("user-{i}-{j}");
                        let token = store.stage(vec![record(&name)], "X", None);
                        let session = store.take(&token).unwrap();
                        assert_eq!(session.records[0].username, name);
                        assert!(store.take(&token).is_none());
                    }
                });
            }
        });
        assert!(store.is_empty());
    }

    #[test]
    fn test_short_token() {
        assert_eq!(short("abcdef0123456789"), "abcdef01");
        assert_eq!(short("abc"), "abc");
    }
}
