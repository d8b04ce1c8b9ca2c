use serde::{Deserialize, Serialize};

use super::config::AppConfig;
use super::encode::EncodedImage;
use super::error::AppError;

/// Fixed instruction sent with every image.
const INSTRUCTION: &str = "Generate a descriptive yet concise alt text for this image. \
The alt text should be suitable for screen readers and improve web accessibility. \
Focus on the main subject and context of the image.";

/// One-shot client for the hosted `generateContent` endpoint. The credential
/// is injected at construction; nothing here reads the environment.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Part<'a> {
    InlineData(InlineData<'a>),
    Text(&'a str),
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AppConfig, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        }
    }

    /// Sends one request per call. No retry, no streaming, no caching.
    pub async fn generate_alt_text(&self, image: &EncodedImage) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData(InlineData {
                        mime_type: &image.mime_type,
                        data: &image.base64,
                    }),
                    Part::Text(INSTRUCTION),
                ],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::generation(format!(
                "unexpected status {status}: {detail}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::generation(format!("malformed response: {e}")))?;

        postprocess(first_text(&parsed).as_deref().unwrap_or_default())
    }
}

fn first_text(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .iter()
        .find_map(|p| p.text.clone())
}

/// Trims surrounding whitespace and strips one matching pair of double
/// quotes; models occasionally wrap the whole description in quotes. A
/// response that is nothing but that wrapper counts as empty.
fn postprocess(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);

    if unquoted.is_empty() {
        return Err(AppError::EmptyResponse);
    }
    Ok(unquoted.to_string())
}
