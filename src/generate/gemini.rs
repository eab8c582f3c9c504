use serde::{Deserialize, Serialize};

use crate::foundation::error::{PostError, PostResult};

/// User-facing message for every generation failure.
pub const GENERATION_FAILED: &str = "Failed to generate quote. Please check your API key.";

/// Default model used for quote generation.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
/// Default REST endpoint root.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Produces quote text for a topic.
#[async_trait::async_trait]
pub trait QuoteGenerator: Send + Sync {
    /// Generate a quote about `topic`. Failures are [`PostError::Generation`].
    async fn generate(&self, topic: &str) -> PostResult<String>;
}

/// Prompt sent for `topic`.
pub fn quote_prompt(topic: &str) -> String {
    format!(
        "Generate a short, inspirational quote in Urdu about \"{topic}\".\n\
         The quote should be profound, modern, and suitable for a professional social media post.\n\
         Do not include English translation, only return the Urdu text.\n\
         Keep it under 25 words."
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

/// Concatenated, trimmed text of the first candidate.
fn response_text(body: &str) -> Option<String> {
    let resp: GenerateResponse = serde_json::from_str(body).ok()?;
    let text: String = resp
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Gemini `generateContent` client. One request per call, no retries.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl GeminiGenerator {
    /// Generator posting to `{endpoint}/models/{model}:generateContent`.
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl QuoteGenerator for GeminiGenerator {
    #[tracing::instrument(skip(self), fields(model = %self.model))]
    async fn generate(&self, topic: &str) -> PostResult<String> {
        let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            tracing::error!("no API key configured");
            return Err(PostError::generation(GENERATION_FAILED));
        };

        let prompt = quote_prompt(topic);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "quote request failed");
                PostError::generation(GENERATION_FAILED)
            })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "quote request rejected");
            return Err(PostError::generation(GENERATION_FAILED));
        }

        let text = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "quote response unreadable");
            PostError::generation(GENERATION_FAILED)
        })?;

        response_text(&text).ok_or_else(|| {
            tracing::error!("quote response had no text");
            PostError::generation(GENERATION_FAILED)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/gemini.rs"]
mod tests;
