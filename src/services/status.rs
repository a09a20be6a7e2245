use crate::models::{DeviceRecord, DeviceStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Derives the effective status of a device at `now`.
///
/// An expiry that cannot be parsed places no constraint on activation.
pub fn evaluate(record: Option<&DeviceRecord>, now: DateTime<Utc>) -> DeviceStatus {
    let Some(record) = record else {
        return DeviceStatus::NotFound;
    };
    if record.status != DeviceRecord::ACTIVE {
        return DeviceStatus::Inactive;
    }
    match parse_expiry(&record.expiry) {
        Some(expiry) if expiry <= now => DeviceStatus::Inactive,
        _ => DeviceStatus::Active,
    }
}

/// Lenient ISO-8601 parsing. Timestamps without an offset are read as UTC.
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
