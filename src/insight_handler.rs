// src/insight_handler.rs
use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::data_types::Row;
use crate::error::InsightError;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Rows beyond this are not sent.
pub const SAMPLE_LIMIT: usize = 20;

pub const NO_INSIGHTS: &str = "No insights could be generated at this time.";
pub const SERVICE_ERROR: &str = "Error connecting to AI service.";

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Summarises table rows with the Gemini text API.
///
/// Never fails from the caller's point of view: every problem turns into
/// one of the fixed fallback strings.
#[derive(Debug, Clone)]
pub struct InsightHandler {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl InsightHandler {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(GEMINI_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        InsightHandler {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Key from `GEMINI_API_KEY` (or `API_KEY`), model from `GEMINI_MODEL`.
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")).ok();
        let handler = Self::new(api_key);
        match env::var("GEMINI_MODEL") {
            Ok(model) if !model.trim().is_empty() => handler.with_model(model),
            _ => handler,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn generate(&self, table_name: &str, rows: &[Row]) -> String {
        match self.request(table_name, rows).await {
            Ok(Some(text)) => text,
            Ok(None) => NO_INSIGHTS.to_string(),
            Err(e) => {
                log::warn!("Insight generation for '{}' failed: {}", table_name, e);
                SERVICE_ERROR.to_string()
            }
        }
    }

    async fn request(&self, table_name: &str, rows: &[Row]) -> Result<Option<String>, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::MissingKey)?;
        let prompt = build_prompt(table_name, rows)?;

        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok((!text.trim().is_empty()).then_some(text))
    }
}

pub fn build_prompt(table_name: &str, rows: &[Row]) -> Result<String, serde_json::Error> {
    let sample = &rows[..rows.len().min(SAMPLE_LIMIT)];
    let json = serde_json::to_string_pretty(sample)?;

    Ok(format!(
        "Analyze the following data from the sheet \"{table_name}\".\n\
         Provide:\n\
         1. A short summary of the numeric trends.\n\
         2. Any anomalies or notable patterns.\n\
         3. Actionable advice based on the data.\n\
         Format the whole response in Markdown.\n\n\
         Data:\n{json}"
    ))
}
