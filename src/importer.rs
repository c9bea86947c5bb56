use tracing::{info, warn};

use crate::error::{IntakeError, Result};
use crate::gateway::MemberGateway;
use crate::models::{ParsedMemberRecord, RawRow, UploadSource};
use crate::parser::parse_rows;
use crate::staging::{short, StagingStore};

/// What `stage_upload` hands back for review.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub token: String,
    pub records: Vec<ParsedMemberRecord>,
    pub brand_name: String,
}

/// Result of one confirm attempt.
///
/// Skip counters are computed before the write and stay populated when
/// `failure` is set; `imported` counts only committed rows, so it is 0
/// whenever the write failed.
#[derive(Debug)]
pub struct ImportOutcome {
    pub brand_name: String,
    pub imported: usize,
    pub duplicate_skipped: usize,
    pub empty_phone_skipped: usize,
    pub failure: Option<IntakeError>,
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    #[allow(dead_code)]
    pub fn into_result(mut self) -> Result<Self> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// The two-phase upload workflow: stage a parsed file, then confirm it.
pub struct Intake<G> {
    store: StagingStore,
    gateway: G,
}

impl<G: MemberGateway> Intake<G> {
    pub fn new(store: StagingStore, gateway: G) -> Self {
        Self { store, gateway }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &StagingStore {
        &self.store
    }

    #[allow(dead_code)]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Parse decoded rows and stage them under a fresh token.
    pub fn stage_upload(
        &self,
        rows: &[RawRow],
        brand_name: &str,
        source: Option<UploadSource>,
    ) -> Result<StagedUpload> {
        let brand_name = brand_name.trim();
        if brand_name.is_empty() {
            return Err(IntakeError::MissingBrand);
        }
        let records = parse_rows(rows, brand_name);
        if records.is_empty() {
            return Err(IntakeError::EmptyBatch);
        }
        let token = self.store.stage(records.clone(), brand_name, source);
        Ok(StagedUpload {
            token,
            records,
            brand_name: brand_name.to_string(),
        })
    }

    /// Drop a staged batch without importing it.
    pub fn discard(&self, token: &str) -> bool {
        self.store.take(token).is_some()
    }

    /// Import a staged batch. `brand_name`, when non-blank, replaces the
    /// brand chosen at staging time.
    pub fn confirm_import(&mut self, token: &str, brand_name: Option<&str>) -> Result<ImportOutcome> {
        commit(&self.store, &mut self.gateway, token, brand_name)
    }
}

/// Consume a staged session and write its new members.
///
/// The session is gone after this call whatever the outcome.
pub fn commit<G: MemberGateway>(
    store: &StagingStore,
    gateway: &mut G,
    token: &str,
    override_brand: Option<&str>,
) -> Result<ImportOutcome> {
    let session = store.take(token).ok_or(IntakeError::SessionNotFound)?;

    let brand_name = match override_brand.map(str::trim).filter(|b| !b.is_empty()) {
        Some(b) => b.to_string(),
        None => session.brand_name.trim().to_string(),
    };
    if brand_name.is_empty() {
        return Err(IntakeError::MissingBrand);
    }

    let mut outcome = ImportOutcome {
        brand_name: brand_name.clone(),
        imported: 0,
        duplicate_skipped: 0,
        empty_phone_skipped: 0,
        failure: None,
    };

    let file = session
        .source
        .as_ref()
        .map(|s| s.filename.clone())
        .unwrap_or_default();

    let mut to_insert = Vec::new();
    for mut record in session.records {
        record.brand_name = brand_name.clone();
        if record.phone_number.trim().is_empty() {
            outcome.empty_phone_skipped += 1;
            continue;
        }
        match gateway.exists(&record.phone_number, &brand_name) {
            Ok(true) => outcome.duplicate_skipped += 1,
            Ok(false) => to_insert.push(record),
            Err(e) => {
                warn!(
                    token = short(token),
                    phone = %record.phone_number,
                    brand = %brand_name,
                    error = %e,
                    "member lookup failed, nothing written"
                );
                outcome.failure = Some(e);
                return Ok(outcome);
            }
        }
    }

    if !to_insert.is_empty() {
        match gateway.bulk_insert(&to_insert) {
            Ok(n) => outcome.imported = n,
            Err(e) => {
                warn!(
                    token = short(token),
                    brand = %brand_name,
                    batch = to_insert.len(),
                    error = %e,
                    "bulk insert rolled back"
                );
                outcome.failure = Some(e);
            }
        }
    }

    info!(
        token = short(token),
        brand = %brand_name,
        file = %file,
        imported = outcome.imported,
        duplicates = outcome.duplicate_skipped,
        empty_phone = outcome.empty_phone_skipped,
        ok = outcome.is_success(),
        "import finished"
    );
    Ok(outcome)
}
