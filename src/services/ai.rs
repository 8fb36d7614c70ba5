use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generative text model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String, AiError>;
}

/// Text-to-speech model producing MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AiError>;
}

/// Client for Cloudflare Workers AI text generation and speech models.
pub struct WorkersAiClient {
    http: Client,
    account_id: String,
    api_token: String,
    text_model: String,
    tts_model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct TextRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct TextResponse {
    result: TextResult,
}

#[derive(Deserialize)]
struct TextResult {
    response: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    prompt: &'a str,
    lang: &'a str,
}

#[derive(Deserialize)]
struct SpeechResponse {
    result: SpeechResult,
}

#[derive(Deserialize)]
struct SpeechResult {
    audio: String,
}

impl WorkersAiClient {
    pub fn new(
        account_id: &str,
        api_token: &str,
        text_model: &str,
        tts_model: &str,
    ) -> Result<Self, AiError> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            http,
            account_id: account_id.to_string(),
            api_token: api_token.to_string(),
            text_model: text_model.to_string(),
            tts_model: tts_model.to_string(),
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            self.account_id, model
        )
    }

    async fn run<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<R, AiError> {
        let response = self
            .http
            .post(self.model_url(model))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextGenerator for WorkersAiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String, AiError> {
        let request = TextRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let response: TextResponse = self.run(&self.text_model, &request).await?;
        let text = response.result.response.trim().to_string();
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl SpeechSynthesizer for WorkersAiClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AiError> {
        let request = SpeechRequest {
            prompt: text,
            lang: "en",
        };

        let response: SpeechResponse = self.run(&self.tts_model, &request).await?;
        base64::engine::general_purpose::STANDARD
            .decode(response.result.audio)
            .map_err(AiError::Audio)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Workers AI returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse model output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid audio payload: {0}")]
    Audio(base64::DecodeError),
}
