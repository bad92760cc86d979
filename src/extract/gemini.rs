//! Google Gemini `generateContent` client used as the extraction collaborator.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ExtractionRequest, Extractor};
use crate::config::ExtractorSection;
use crate::errors::ExtractionError;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

/// Response from the `generateContent` endpoint (subset of fields we care about).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini-backed extractor.
///
/// Without an API key every call fails as `CollaboratorUnavailable`, so a
/// session can still run (and show the problem to the reviewer).
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiExtractor {
    pub fn new(config: &ExtractorSection, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn request_body(&self, prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String, ExtractionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractionError::MalformedExtractionOutput(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractionError::MalformedExtractionOutput(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ExtractionError::CollaboratorUnavailable("GOOGLE_API_KEY is not set".to_string())
        })?;

        let resp = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&self.request_body(request.prompt()))
            .send()
            .await
            .map_err(|e| ExtractionError::CollaboratorUnavailable(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(ExtractionError::CollaboratorUnavailable(format!(
                "HTTP {}: {}",
                status, snippet
            )));
        }

        let parsed: GenerateContentResponse = resp.json().await.map_err(|e| {
            ExtractionError::MalformedExtractionOutput(format!("unreadable API response: {}", e))
        })?;
        response_text(parsed)
    }

    fn name(&self) -> String {
        format!("gemini:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingData;
    use chrono::NaiveDate;

    fn extractor(api_key: Option<&str>) -> GeminiExtractor {
        GeminiExtractor::new(&ExtractorSection::default(), api_key.map(String::from)).unwrap()
    }

    #[test]
    fn test_blank_api_key_is_unconfigured() {
        assert!(!extractor(Some("  ")).is_configured());
        assert!(extractor(Some("key")).is_configured());
    }

    #[test]
    fn test_endpoint_uses_model() {
        let e = extractor(None);
        assert!(e.endpoint().ends_with(&format!("/models/{}:generateContent", e.model)));
        assert!(!e.endpoint().contains("//models"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(extractor(None).request_body("hello".into())).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert!(body["generationConfig"]["maxOutputTokens"].is_u64());
        assert!(body["generationConfig"]["temperature"].is_f64());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(resp).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_response_without_candidates_is_malformed() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            response_text(resp),
            Err(ExtractionError::MalformedExtractionOutput(_))
        ));
    }

    #[test]
    fn test_blocked_prompt_is_reported() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let err = response_text(resp).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable_without_network() {
        let request = ExtractionRequest {
            text: "x".into(),
            existing: BookingData::default(),
            today: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        let err = extractor(None).extract(&request).await.unwrap_err();
        assert!(matches!(err, ExtractionError::CollaboratorUnavailable(_)));
    }
}
