//! Gemini `generateContent` client with Google Search grounding.

use super::{EnrichError, ProfileClient, ProfileResponse, Result};
use crate::model::profile::CandidateProfile;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            // Grounded research calls routinely take minutes.
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(GeminiClient {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ProfileClient for GeminiClient {
    async fn research(&self, system_prompt: &str, user_message: &str) -> Result<ProfileResponse> {
        let body = GenerateRequest {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: system_prompt,
                }],
            },
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: user_message }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!("POST {}", self.url());
        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EnrichError::HttpStatus { status, body: text });
        }
        parse_response(&text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
}

/// Models sometimes wrap JSON output in a markdown fence.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Pull the profile JSON and grounding URLs out of a `generateContent` body.
pub fn parse_response(body: &str) -> Result<ProfileResponse> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(EnrichError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = strip_fence(&text);
    if text.is_empty() {
        return Err(EnrichError::EmptyResponse);
    }
    let profile: CandidateProfile = serde_json::from_str(text)?;

    let source_urls = candidate
        .grounding_metadata
        .map(|m| {
            m.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web.and_then(|w| w.uri))
                .collect()
        })
        .unwrap_or_default();

    Ok(ProfileResponse {
        profile,
        source_urls,
    })
}
