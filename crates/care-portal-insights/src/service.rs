//! Cached health summaries and risk assessments.

use care_portal_core::db::Database;
use care_portal_core::models::PredictionCacheEntry;
use serde::{Deserialize, Serialize};

use crate::completion::TextCompletion;
use crate::format::format_health_data;
use crate::prompts::{make_risk_prompt, make_summary_prompt};
use crate::InsightsResult;

/// Readings of each kind included in a prompt when not configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// A summary and risk assessment for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientPrediction {
    pub summary: String,
    pub risk_assessment: String,
    pub model_used: String,
    pub created_at: String,
    /// Served from the cache rather than generated
    pub cached: bool,
}

impl PatientPrediction {
    fn from_entry(entry: PredictionCacheEntry, cached: bool) -> Self {
        Self {
            summary: entry.summary,
            risk_assessment: entry.risk_assessment,
            model_used: entry.model_used,
            created_at: entry.created_at,
            cached,
        }
    }
}

/// Generates predictions on demand and caches them per patient.
pub struct PredictionService<'a, C: TextCompletion> {
    db: &'a Database,
    completion: C,
    history_limit: usize,
}

impl<'a, C: TextCompletion> PredictionService<'a, C> {
    pub fn new(db: &'a Database, completion: C) -> Self {
        Self {
            db,
            completion,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Return the cached prediction if still fresh, otherwise generate a new one.
    pub fn get_prediction(&self, patient_id: &str) -> InsightsResult<PatientPrediction> {
        if let Some(entry) = self.db.cached_prediction_if_fresh(patient_id)? {
            tracing::debug!(patient_id = %patient_id, "Serving cached prediction");
            return Ok(PatientPrediction::from_entry(entry, true));
        }

        let vitals = self.db.recent_vitals(patient_id, self.history_limit)?;
        let breaths = self.db.recent_breaths(patient_id, self.history_limit)?;
        let data = format_health_data(&vitals, &breaths);

        tracing::info!(
            patient_id = %patient_id,
            vitals = vitals.len(),
            breaths = breaths.len(),
            model = %self.completion.model_name(),
            "Generating prediction"
        );

        let summary = self.completion.complete(&make_summary_prompt(&data))?;
        let risk_assessment = self.completion.complete(&make_risk_prompt(&summary))?;

        let entry = PredictionCacheEntry::new(
            patient_id,
            summary,
            risk_assessment,
            self.completion.model_name(),
        );
        if let Err(e) = self.db.insert_prediction(&entry) {
            tracing::error!(patient_id = %patient_id, error = %e, "Failed to cache prediction");
        }

        Ok(PatientPrediction::from_entry(entry, false))
    }
}
