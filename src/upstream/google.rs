//! Google Generative AI invoker.

use super::{UpstreamCallResult, UpstreamError, UpstreamInvoker, UpstreamReply};
use crate::analysis::PromptSpec;
use crate::config::UpstreamConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Google Generative AI invoker.
///
/// Calls `POST /v1beta/models/{model}:generateContent?key={key}`:
/// - System instruction goes to the `systemInstruction` field
/// - Google Search grounding is enabled on every call
/// - `responseMimeType` follows the prompt's expected shape
pub struct GeminiInvoker {
    /// Base URL (e.g., "https://generativelanguage.googleapis.com")
    base_url: String,
    /// Model name without the "models/" prefix
    model: String,
    /// Shared HTTP client for connection pooling
    client: Client,
    /// Per-call deadline
    timeout: Duration,
}

impl GeminiInvoker {
    pub fn new(base_url: String, model: String, client: Client, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
            timeout,
        }
    }

    /// Build an invoker with its own pooled client from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| UpstreamError::Network(e.without_url().to_string()))?;
        Ok(Self::new(
            config.base_url.clone(),
            config.model.clone(),
            client,
            Duration::from_secs(config.timeout_seconds),
        ))
    }

    /// Endpoint URL without the credential.
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Translate a prompt into the Google request format.
    fn translate_request(&self, prompt: &PromptSpec) -> GoogleRequest {
        GoogleRequest {
            contents: vec![GoogleContent {
                role: Some("user".to_string()),
                parts: vec![GooglePart {
                    text: Some(prompt.user_message().to_string()),
                }],
            }],
            system_instruction: GoogleSystemInstruction {
                parts: vec![GooglePart {
                    text: Some(prompt.system_instruction().to_string()),
                }],
            },
            tools: vec![GoogleTool {
                google_search: GoogleSearch {},
            }],
            generation_config: GoogleGenerationConfig {
                response_mime_type: prompt.expected_shape().mime_type().to_string(),
            },
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: GoogleResponse) -> Option<String> {
        let candidate = response.candidates.into_iter().next()?;
        let text = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<String>>()
            .join("");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Pull the message out of a Google error envelope, or fall back to a
    /// generic message when the body is not one.
    fn error_message(status: u16, body: &str) -> String {
        serde_json::from_str::<GoogleErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Upstream API error (HTTP {})", status))
    }
}

/// Google Generative AI request format
#[derive(Debug, Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GoogleSystemInstruction,
    tools: Vec<GoogleTool>,
    #[serde(rename = "generationConfig")]
    generation_config: GoogleGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GoogleSystemInstruction {
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize)]
struct GoogleTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
struct GoogleGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Google Generative AI response format
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: Option<String>,
}

#[async_trait]
impl UpstreamInvoker for GeminiInvoker {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &PromptSpec, credential: &SecretString) -> UpstreamCallResult {
        let url = self.endpoint();
        let timeout_ms = self.timeout.as_millis() as u64;

        tracing::debug!(
            upstream = "google",
            model = %self.model,
            url = %url,
            mime_type = prompt.expected_shape().mime_type(),
            "invoking upstream"
        );

        let request = self.translate_request(prompt);

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .query(&[("key", credential.expose_secret().as_str())])
            .header("content-type", "application/json")
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_transport(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = Self::error_message(status.as_u16(), &error_body);
            tracing::info!(
                upstream = "google",
                model = %self.model,
                status = %status,
                latency_ms = start.elapsed().as_millis(),
                "upstream call failed"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let google_response: GoogleResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.without_url().to_string()))?;

        let text = Self::extract_text(google_response).ok_or_else(|| {
            UpstreamError::InvalidResponse("response carries no candidate text".to_string())
        })?;

        tracing::info!(
            upstream = "google",
            model = %self.model,
            latency_ms = start.elapsed().as_millis(),
            text_len = text.len(),
            "upstream call succeeded"
        );

        Ok(UpstreamReply {
            status: status.as_u16(),
            text,
        })
    }
}
