//! Raw sensor readings and cached AI predictions.

use serde::{Deserialize, Serialize};

/// One row from the vitals monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalReading {
    pub patient_id: String,
    pub heart_rate_bpm: Option<f64>,
    pub pulse_bpm: Option<f64>,
    pub spo2_percent: Option<f64>,
    pub body_temp_c: Option<f64>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub mean_bp: Option<f64>,
    pub ecg_signal_raw: Option<String>,
    pub ecg_rhythm_type: Option<String>,
    /// Measurement time (RFC 3339)
    pub recorded_at: String,
}

impl VitalReading {
    pub fn new(patient_id: impl Into<String>, recorded_at: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            recorded_at: recorded_at.into(),
            ..Default::default()
        }
    }
}

/// One row from the breath analyser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BreathReading {
    pub patient_id: String,
    pub ammonia_ppm: Option<f64>,
    pub co2_ppm_mq: Option<f64>,
    pub benzene_ppm: Option<f64>,
    pub co2_ppm_mhz19: Option<f64>,
    pub ethanol_ppm: Option<f64>,
    pub vocs_ppm_mics: Option<f64>,
    pub acetone_ppm_qcm: Option<f64>,
    /// Compound detected by the chemoresistive sensor
    pub voc_type_chemo: Option<String>,
    pub voc_value_ppm_chemo: Option<f64>,
    /// Measurement time (RFC 3339)
    pub recorded_at: String,
}

impl BreathReading {
    pub fn new(patient_id: impl Into<String>, recorded_at: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            recorded_at: recorded_at.into(),
            ..Default::default()
        }
    }
}

/// A generated summary and risk assessment, cached per patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionCacheEntry {
    pub id: String,
    pub patient_id: String,
    pub summary: String,
    pub risk_assessment: String,
    /// Generative model that produced the text
    pub model_used: String,
    /// Generation time (RFC 3339)
    pub created_at: String,
}

impl PredictionCacheEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(
        patient_id: impl Into<String>,
        summary: String,
        risk_assessment: String,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            summary,
            risk_assessment,
            model_used: model_used.into(),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        }
    }
}
