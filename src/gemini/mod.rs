use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Model used for every ranking request.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Returned when a generation response carries no usable text.
pub const NO_RESULT_SENTINEL: &str = "No analysis result from Gemini.";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Failures raised when calling the relevance oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no Gemini API key configured (set GEMINI_API_KEY or pass --gemini-api-key)")]
    MissingApiKey,
    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Ranks candidate documents against a user query and returns the service's
/// raw text answer. The answer is not guaranteed to be well-formed JSON;
/// parsing it is the caller's problem.
#[async_trait]
pub trait RelevanceOracle: Send + Sync {
    async fn rank(&self, query: &str, candidates: &[String]) -> Result<String, OracleError>;
}

/// Gemini API client used as the relevance oracle.
///
/// The API key is injected configuration and travels in the
/// `x-goog-api-key` header, never in the URL. Each call is bounded by the
/// timeout the client was built with.
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            model: model.into(),
            api_key,
        })
    }

    /// Single-turn generation request. Returns the first candidate's first
    /// text part, or the no-result sentinel when the response has none.
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let api_key = self.api_key.as_deref().ok_or(OracleError::MissingApiKey)?;

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let body = json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": prompt,
                        }
                    ]
                }
            ]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let response: GenerateContentResponse = response.json().await?;
        Ok(extract_text(response))
    }
}

#[async_trait]
impl RelevanceOracle for GeminiClient {
    async fn rank(&self, query: &str, candidates: &[String]) -> Result<String, OracleError> {
        tracing::debug!("Ranking {} candidate files with {}", candidates.len(), self.model);
        let prompt = build_ranking_prompt(query, candidates);
        self.generate(&prompt).await
    }
}

/// Instruction sent to Gemini: judge the candidate filenames against the
/// user query and answer with a JSON object.
pub fn build_ranking_prompt(query: &str, candidates: &[String]) -> String {
    let listing = candidates
        .iter()
        .map(|name| format!("- {name}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following user query and decide which standard documents are most relevant, judging only by the file names:

User query: "{query}"

Available files:
{listing}

Answer with JSON in exactly this format:
{{
  "relevantFiles": [
    {{
      "filename": "file_name.md",
      "relevanceScore": 0.95,
      "reason": "Why this file is relevant"
    }}
  ],
  "summary": "Summary of the most relevant files found"
}}

Order the files by relevance (score from 0.0 to 1.0) and only include those with score >= 0.3.
"#
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_RESULT_SENTINEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_query_and_candidates() {
        let candidates = vec!["naming.md".to_string(), "security.md".to_string()];
        let prompt = build_ranking_prompt("how should I name variables?", &candidates);

        assert!(prompt.contains("how should I name variables?"));
        assert!(prompt.contains("- naming.md"));
        assert!(prompt.contains("- security.md"));
        assert!(prompt.contains("relevanceScore"));
        assert!(prompt.contains("score >= 0.3"));
    }

    #[test]
    fn extracts_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {
                        "content": {
                            "parts": [
                                { "text": "first part" },
                                { "text": "second part" }
                            ],
                            "role": "model"
                        },
                        "finishReason": "STOP"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(extract_text(response), "first part");
    }

    #[test]
    fn missing_or_empty_text_falls_back_to_sentinel() {
        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(empty), NO_RESULT_SENTINEL);

        let blank: GenerateContentResponse = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "parts": [ { "text": "" } ] } } ] }"#,
        )
        .unwrap();
        assert_eq!(extract_text(blank), NO_RESULT_SENTINEL);
    }

    #[tokio::test]
    async fn rank_without_api_key_fails_before_any_request() {
        let client =
            GeminiClient::new(DEFAULT_GEMINI_MODEL, None, Duration::from_secs(5)).unwrap();
        let result = client.rank("query", &["a.md".to_string()]).await;

        assert!(matches!(result, Err(OracleError::MissingApiKey)));
    }
}
