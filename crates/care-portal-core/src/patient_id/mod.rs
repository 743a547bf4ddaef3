//! Patient identifier allocation.
//!
//! Identifiers are `YY` (year of allocation) + `CC` (country code) + a suffix
//! that increases within that prefix, e.g. `25NP00001`.
//!
//! The allocator only computes the next value from the latest stored one; the
//! caller inserts the patient. Read-then-insert is not atomic, so two
//! concurrent allocations for the same prefix can produce the same
//! identifier. The `users.patient_id` primary key rejects the second insert.

mod country;
mod sequence;

pub use country::*;
pub use sequence::*;

use chrono::Datelike;

use crate::db::{DbResult, PortalStore};

/// `YYCC` prefix for a year and a country code.
pub fn id_prefix(year: i32, country_code: &str) -> String {
    format!("{:02}{}", year.rem_euclid(100), country_code)
}

/// Next identifier for `prefix`, given the latest identifier stored under it.
pub fn next_patient_id(prefix: &str, latest: Option<&str>) -> String {
    let latest_suffix = latest.map(|id| id.strip_prefix(prefix).unwrap_or(""));

    if let Some(suffix) = latest_suffix {
        if Suffix::parse(suffix) == Suffix::Unrecognized {
            tracing::warn!(
                prefix = %prefix,
                latest = ?latest,
                "Unrecognized identifier suffix, restarting sequence"
            );
        }
    }

    format!("{prefix}{}", next_suffix(latest_suffix))
}

/// Allocates identifiers against a store.
pub struct PatientIdAllocator<'a, S: PortalStore + ?Sized> {
    store: &'a S,
    countries: CountryCodes,
}

impl<'a, S: PortalStore + ?Sized> PatientIdAllocator<'a, S> {
    /// Create an allocator using the built-in country table.
    pub fn new(store: &'a S) -> Self {
        Self::with_country_codes(store, CountryCodes::builtin())
    }

    /// Create an allocator with a custom country table.
    pub fn with_country_codes(store: &'a S, countries: CountryCodes) -> Self {
        Self { store, countries }
    }

    pub fn country_codes(&self) -> &CountryCodes {
        &self.countries
    }

    /// Next identifier for a country, using the current UTC year.
    pub fn allocate(&self, country_name: &str) -> DbResult<String> {
        self.allocate_for_year(country_name, chrono::Utc::now().year())
    }

    /// Next identifier for a country in an explicit year.
    pub fn allocate_for_year(&self, country_name: &str, year: i32) -> DbResult<String> {
        let code = self.countries.resolve(country_name);
        let prefix = id_prefix(year, code.as_str());

        let latest = self.store.latest_patient_id_with_prefix(&prefix)?;
        let next = next_patient_id(&prefix, latest.as_deref());

        tracing::debug!(
            country = %country_name,
            prefix = %prefix,
            latest = ?latest,
            next = %next,
            "Allocated patient id"
        );
        Ok(next)
    }
}
