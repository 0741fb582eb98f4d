use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::{GenAiClient, GenerateRequest, GenerateResponse, GroundingChunk};
use crate::config::AppConfig;

/// Generation with web grounding is slow; lookups elsewhere use the
/// shorter configured timeout.
const GENERATE_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Option<Result<Self>> {
        let key = config.api_key.as_ref()?;
        Some(Self::new(
            key.clone(),
            config.model.clone(),
            config.gemini_base_url.clone(),
        ))
    }

    fn build_body(request: &GenerateRequest) -> Value {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
        });

        if request.web_search {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        body
    }

    fn into_response(parsed: GeminiResponse) -> GenerateResponse {
        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return GenerateResponse::default();
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let grounding = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| {
                        let web = chunk.web?;
                        Some(GroundingChunk {
                            uri: web.uri?,
                            title: web.title,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        GenerateResponse { text, grounding }
    }
}

#[async_trait]
impl GenAiClient for GeminiClient {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        log::debug!("Gemini request ({} chars, search={})", request.prompt.len(), request.web_search);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_body(&request))
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini returned HTTP {}: {}", status.as_u16(), text));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        Ok(Self::into_response(parsed))
    }
}
