//! Haiku generation via an OpenAI-compatible chat completions API.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::pool::ImageId;

/// Turns image bytes into text.
#[allow(async_fn_in_trait)]
pub trait Generator {
    /// One request, no retries. Returns the trimmed response text.
    async fn describe(&self, image: &ImageId, bytes: &[u8]) -> Result<String>;
}

// -----------------------------
// Chat completions API
// -----------------------------

#[derive(Debug, Deserialize, Serialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Vision model client.
#[derive(Clone, Debug)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    /// Builds the HTTP client with the configured timeout.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

impl Generator for OpenAiGenerator {
    async fn describe(&self, image: &ImageId, bytes: &[u8]) -> Result<String> {
        let url = self.endpoint();
        let body = request_body(&self.config, &data_url(image, bytes));
        debug!(
            model = %self.config.model,
            max_tokens = self.config.max_tokens,
            image = %image,
            bytes = bytes.len(),
            "requesting haiku"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("Failed reading {url} body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Chat completions API error {status}: {}",
                error_message(&body)
            ));
        }

        extract_haiku(&body)
    }
}

/// Inline `data:` URL for the image. The MIME type is sniffed from the bytes,
/// falling back to the file extension.
fn data_url(image_id: &ImageId, bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or_else(|_| image_id.mime_type());
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

fn request_body(config: &GeneratorConfig, image_url: &str) -> Value {
    json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "messages": [
            {
                "role": "user",
                "content": [
                    {"type": "text", "text": config.prompt},
                    {"type": "image_url", "image_url": {"url": image_url}}
                ]
            }
        ]
    })
}

fn extract_haiku(body: &[u8]) -> Result<String> {
    let parsed: ChatCompletionResponse =
        serde_json::from_slice(body).context("Failed to parse chat completions JSON")?;
    if let Some(err) = parsed.error {
        return Err(anyhow!("Chat completions API returned error: {err}"));
    }

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("Chat completions response had no message content"))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("Model returned an empty haiku"));
    }
    Ok(text.to_string())
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}
