//! Client for the local disease-probability service.
//!
//! The service exposes `GET /health` and `POST /predict`. It can take a while
//! to load its model after start-up, so [`MlClient::predict`] first polls the
//! health endpoint and then sends the request anyway if readiness never
//! arrives.

use std::collections::BTreeMap;
use std::time::Duration;

use care_portal_core::config::MlConfig;
use care_portal_core::models::{BreathReading, VitalReading};
use serde::{Deserialize, Serialize};

use crate::{transport_error, InsightsError, InsightsResult};

/// The eighteen model inputs. Absent values are sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthFeatures {
    pub ammonia_ppm: Option<f64>,
    pub co2_ppm_mq: Option<f64>,
    pub benzene_ppm: Option<f64>,
    pub co2_ppm_mhz19: Option<f64>,
    pub ethanol_ppm: Option<f64>,
    pub vocs_ppm_mics: Option<f64>,
    pub acetone_ppm_qcm: Option<f64>,
    pub voc_type_chemo: Option<String>,
    pub voc_value_ppm_chemo: Option<f64>,
    pub heart_rate_bpm: Option<f64>,
    pub pulse_bpm: Option<f64>,
    pub spo2_percent: Option<f64>,
    pub body_temp_c: Option<f64>,
    pub ecg_signal_raw: Option<String>,
    pub ecg_rhythm_type: Option<String>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub mean_bp: Option<f64>,
}

impl HealthFeatures {
    /// Combine one vitals reading and one breath reading into a feature row.
    pub fn from_readings(vital: Option<&VitalReading>, breath: Option<&BreathReading>) -> Self {
        let mut features = Self::default();
        if let Some(v) = vital {
            features.heart_rate_bpm = v.heart_rate_bpm;
            features.pulse_bpm = v.pulse_bpm;
            features.spo2_percent = v.spo2_percent;
            features.body_temp_c = v.body_temp_c;
            features.ecg_signal_raw = v.ecg_signal_raw.clone();
            features.ecg_rhythm_type = v.ecg_rhythm_type.clone();
            features.systolic_bp = v.systolic_bp;
            features.diastolic_bp = v.diastolic_bp;
            features.mean_bp = v.mean_bp;
        }
        if let Some(b) = breath {
            features.ammonia_ppm = b.ammonia_ppm;
            features.co2_ppm_mq = b.co2_ppm_mq;
            features.benzene_ppm = b.benzene_ppm;
            features.co2_ppm_mhz19 = b.co2_ppm_mhz19;
            features.ethanol_ppm = b.ethanol_ppm;
            features.vocs_ppm_mics = b.vocs_ppm_mics;
            features.acetone_ppm_qcm = b.acetone_ppm_qcm;
            features.voc_type_chemo = b.voc_type_chemo.clone();
            features.voc_value_ppm_chemo = b.voc_value_ppm_chemo;
        }
        features
    }
}

/// Summary statistics returned with a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub features_used: usize,
    pub prediction_confidence: f64,
}

/// Response from `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub success: bool,
    /// Condition label → probability
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

impl MlPrediction {
    /// Label with the highest probability.
    pub fn most_likely(&self) -> Option<(&str, f64)> {
        self.probabilities
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, p)| (label.as_str(), *p))
    }
}

/// Blocking client for the prediction service.
pub struct MlClient {
    base_url: String,
    client: reqwest::blocking::Client,
    config: MlConfig,
}

impl MlClient {
    pub fn new(config: &MlConfig) -> InsightsResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| InsightsError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll `/health` until it answers 2xx or the retries run out.
    pub fn wait_for_api(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let probe_timeout = Duration::from_millis(self.config.health_timeout_ms);
        let delay = Duration::from_millis(self.config.health_retry_delay_ms);

        for attempt in 1..=self.config.health_retries {
            match self.client.get(&url).timeout(probe_timeout).send() {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) => {
                    tracing::debug!(attempt, status = response.status().as_u16(), "Prediction service not ready");
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Prediction service unreachable");
                }
            }
            if attempt < self.config.health_retries {
                std::thread::sleep(delay);
            }
        }
        false
    }

    /// Request disease probabilities for one feature row.
    pub fn predict(&self, features: &HealthFeatures) -> InsightsResult<MlPrediction> {
        if !self.wait_for_api() {
            tracing::warn!(
                url = %self.base_url,
                retries = self.config.health_retries,
                "Prediction service not ready after retries, sending request anyway"
            );
        }

        let url = format!("{}/predict", self.base_url);
        tracing::info!(url = %url, "Requesting prediction");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .json(features)
            .send()
            .map_err(|e| transport_error(e, &self.base_url, self.config.request_timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Prediction service error");
            return Err(InsightsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| InsightsError::ResponseParsing(e.to_string()))
    }
}
