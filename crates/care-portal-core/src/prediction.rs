//! Prediction cache freshness.
//!
//! A cached prediction stays valid until a newer vitals or breath reading
//! arrives for the same patient.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::{Database, DbResult};
use crate::models::PredictionCacheEntry;

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical stored form of a timestamp: UTC, microseconds, `Z` suffix.
///
/// Every stored stamp has the same width and offset, so SQL string ordering
/// agrees with time ordering.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Whether a cache entry created at `cache_created_at` is newer than all raw data.
///
/// Missing readings count as the Unix epoch. Any timestamp that fails to parse
/// makes the cache stale.
pub fn is_cache_fresh(
    cache_created_at: &str,
    latest_vital_at: Option<&str>,
    latest_breath_at: Option<&str>,
) -> bool {
    let Some(cache_time) = parse_timestamp(cache_created_at) else {
        return false;
    };

    let mut latest_data = DateTime::<Utc>::UNIX_EPOCH;
    for raw in [latest_vital_at, latest_breath_at].into_iter().flatten() {
        match parse_timestamp(raw) {
            Some(t) => latest_data = latest_data.max(t),
            None => return false,
        }
    }

    cache_time > latest_data
}

impl Database {
    /// Newest cached prediction for a patient, if it is still fresh.
    pub fn cached_prediction_if_fresh(
        &self,
        patient_id: &str,
    ) -> DbResult<Option<PredictionCacheEntry>> {
        let Some(entry) = self.latest_prediction(patient_id)? else {
            return Ok(None);
        };

        let latest_vital = self.latest_vital_time(patient_id)?;
        let latest_breath = self.latest_breath_time(patient_id)?;

        if is_cache_fresh(&entry.created_at, latest_vital.as_deref(), latest_breath.as_deref()) {
            Ok(Some(entry))
        } else {
            tracing::debug!(
                patient_id = %patient_id,
                cached_at = %entry.created_at,
                latest_vital = ?latest_vital,
                latest_breath = ?latest_breath,
                "Prediction cache is stale"
            );
            Ok(None)
        }
    }
}
