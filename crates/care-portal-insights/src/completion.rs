//! Text completion backends.

use std::sync::Mutex;
use std::time::Duration;

use care_portal_core::config::GeminiConfig;
use serde::{Deserialize, Serialize};

use crate::prompts::MODEL_NAME;
use crate::{transport_error, InsightsError, InsightsResult};

/// Text returned when the model answers without any candidate text.
pub const EMPTY_RESPONSE: &str = "No response generated";

/// A prompt-in, text-out model.
pub trait TextCompletion {
    /// Complete a single prompt.
    fn complete(&self, prompt: &str) -> InsightsResult<String>;

    /// Name recorded alongside generated text.
    fn model_name(&self) -> &str;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_ms: u64,
}

impl GeminiClient {
    /// Build a client from config, reading the API key from the environment.
    pub fn from_config(config: &GeminiConfig) -> InsightsResult<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| InsightsError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn new(config: &GeminiConfig, api_key: String) -> InsightsResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| InsightsError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: config.generate_url(),
            model: config.model.clone(),
            api_key,
            client,
            timeout_ms: config.request_timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Request body for `generateContent`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response body from `generateContent`. Every level may be missing.
#[derive(Deserialize, Default)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, or [`EMPTY_RESPONSE`].
    pub(crate) fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string())
    }
}

impl TextCompletion for GeminiClient {
    fn complete(&self, prompt: &str) -> InsightsResult<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let response = self
            .client
            .post(&self.url)
            .header("X-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| transport_error(e, &self.url, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Completion request failed");
            return Err(InsightsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| InsightsError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into_text())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock completion for tests: replays canned responses and records prompts.
pub struct MockCompletion {
    responses: Vec<String>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    /// Answer calls with `responses` in order, repeating the last one.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Vec::new(),
            failure: Some(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TextCompletion for MockCompletion {
    fn complete(&self, prompt: &str) -> InsightsResult<String> {
        let mut prompts = self
            .prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let call = prompts.len();
        prompts.push(prompt.to_string());

        if let Some(message) = &self.failure {
            return Err(InsightsError::Completion(message.clone()));
        }

        Ok(self
            .responses
            .get(call)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string()))
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
