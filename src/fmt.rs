use crate::importer::ImportOutcome;

/// Human-readable byte size: 512 B, 1.5 KB, 10.0 MB.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Cell text for an optional field.
pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// One-line summary of an import attempt.
pub fn import_summary(outcome: &ImportOutcome) -> String {
    let mut parts = Vec::new();
    match &outcome.failure {
        None => parts.push(format!(
            "Imported {} new member(s) for brand '{}'.",
            outcome.imported, outcome.brand_name
        )),
        Some(e) => parts.push(format!("Import failed for brand '{}': {e}.", outcome.brand_name)),
    }
    if outcome.duplicate_skipped > 0 {
        parts.push(format!(
            "{} skipped (phone number already registered).",
            outcome.duplicate_skipped
        ));
    }
    if outcome.empty_phone_skipped > 0 {
        parts.push(format!(
            "{} skipped (no phone number).",
            outcome.empty_phone_skipped
        ));
    }
    parts.join(" ")
}
