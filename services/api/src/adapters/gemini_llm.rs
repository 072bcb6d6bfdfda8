//! services/api/src/adapters/gemini_llm.rs
//!
//! Content generator backed by the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use design_studio_core::ports::{ContentGenerator, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// An adapter that implements `ContentGenerator` against the Gemini API.
#[derive(Clone)]
pub struct GeminiContentAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiContentAdapter {
    pub fn new(client: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Joins the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> PortResult<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PortError::Upstream(format!("Prompt was blocked: {}", reason)));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(PortError::Upstream(
            "Model response contained no text content.".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl ContentGenerator for GeminiContentAdapter {
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Gemini returned {}: {}", status, detail);
            return Err(PortError::Upstream(format!("Gemini returned {}: {}", status, detail)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed Gemini response: {}", e)))?;
        response_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GenerateResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Bold "},{"text":"and bright."}]}},
                              {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        );
        assert_eq!(response_text(response).unwrap(), "Bold and bright.");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = response_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn empty_candidates_are_an_error() {
        assert!(response_text(parse(r#"{"candidates":[]}"#)).is_err());
    }

    #[test]
    fn endpoint_includes_model() {
        let adapter = GeminiContentAdapter::new(
            Client::new(),
            "https://example.test/".to_string(),
            "key".to_string(),
            "gemini-2.0-flash".to_string(),
        );
        assert_eq!(
            adapter.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
