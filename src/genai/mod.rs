//! Generative-AI collaborator used for search and lyric generation.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Let the model ground its answer with a web search.
    pub web_search: bool,
    /// JSON schema the response must follow. Implies a JSON response.
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundingChunk {
    pub uri: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    pub text: String,
    pub grounding: Vec<GroundingChunk>,
}

#[async_trait]
pub trait GenAiClient: Send + Sync {
    /// Short identifier used in logs (e.g. "gemini").
    fn id(&self) -> &str;

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}

/// Candidate `[` positions tried before giving up on a reply.
const MAX_ARRAY_ATTEMPTS: usize = 16;

/// Finds the first JSON array in free-form model output. Code fences,
/// prose around the array, and trailing junk are tolerated. Only the
/// first few `[` positions are tried.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    let text = text.replace("```json", "").replace("```", "");
    for (start, _) in text.match_indices('[').take(MAX_ARRAY_ATTEMPTS) {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(Value::Array(items))) = stream.next() {
            return Some(items);
        }
    }
    None
}
