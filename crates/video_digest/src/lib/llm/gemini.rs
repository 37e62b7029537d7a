use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{Summarizer, SummaryResponse};

/// Client for the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("No text to summarize")]
    EmptyInput,
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response did not contain summary text")]
    MissingText,
}

impl GeminiClient {
    const PROMPT_TEMPLATE: &'static str = include_str!("./prompts/summary_pt.txt");
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: Self::DEFAULT_MODEL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builds the single-turn summarization prompt.
    ///
    /// The length target is given as a range from 60% of `max_words` up to
    /// `max_words`.
    pub fn build_prompt(text: &str, max_words: usize) -> String {
        Self::PROMPT_TEMPLATE
            .trim_end()
            .replace("{min_words}", &(max_words * 3 / 5).to_string())
            .replace("{max_words}", &max_words.to_string())
            .replace("{text}", text)
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    pub async fn send_generate_request(
        &self,
        prompt: &str,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("GEMINI_API_KEY is not configured");
            GeminiError::MissingApiKey
        })?;

        let body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .timeout(Self::REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %text, "Gemini API returned an error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|e| {
            tracing::error!(error = %e, body = %text, "Gemini API returned malformed JSON");
            GeminiError::Decode(e)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

impl Summarizer for GeminiClient {
    type Error = GeminiError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, content: &str, max_words: usize) -> Result<SummaryResponse, Self::Error> {
        if content.trim().is_empty() {
            tracing::warn!("No text to summarize");
            return Err(GeminiError::EmptyInput);
        }

        let response = self
            .send_generate_request(&Self::build_prompt(content, max_words))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response.first_text().map(str::trim).ok_or_else(|| {
            tracing::error!(
                response = ?response,
                prompt_feedback = ?response.prompt_feedback,
                "Gemini response did not contain the expected summary text"
            );
            GeminiError::MissingText
        })?;

        Ok(SummaryResponse {
            summary: summary.to_string(),
        })
    }
}
