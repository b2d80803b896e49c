//! GeminiClient - Direct REST API implementation for Gemini.
//!
//! Implements all four remote operations against the Gemini HTTP API:
//! conversation creation (client-side, instructions are baked into every
//! request), streamed reply generation over SSE, speech synthesis and image
//! generation. Configuration is loaded from secret.json or the environment.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::StreamExt;
use log::{debug, warn};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::resolve_credentials;
use crate::error::{ChatError, ConfigError, GenerationError, SynthesisError};
use crate::provider::{
    ChatCapability, ImageCapability, ReplyStream, SessionHandle, SpeechCapability, Turn, TurnRole,
};

const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";
const SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    chat_model: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key and chat model.
    pub fn new(api_key: impl Into<String>, chat_model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            chat_model: chat_model.into(),
        }
    }

    /// Loads credentials from secret.json or `GEMINI_API_KEY`.
    ///
    /// Model name defaults to `gemini-3-flash-preview` if not specified.
    pub fn from_config() -> Result<Self, ConfigError> {
        let credentials = resolve_credentials()?;
        let model = credentials
            .model_name
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        Ok(Self::new(credentials.api_key, model))
    }

    /// Overrides the chat model after construction.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    fn model_url(&self, model: &str, method: &str, sse: bool) -> String {
        let alt = if sse { "alt=sse&" } else { "" };
        format!(
            "{BASE_URL}/{model}:{method}?{alt}key={api_key}",
            api_key = self.api_key
        )
    }

    async fn generate_once(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, (u16, String)> {
        let url = self.model_url(model, "generateContent", false);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| (0, format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err((status.as_u16(), api_error_message(&body_text)));
        }

        response
            .json()
            .await
            .map_err(|err| (status.as_u16(), format!("failed to parse response: {err}")))
    }
}

#[async_trait::async_trait]
impl ChatCapability for GeminiClient {
    async fn open_session(
        &self,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<SessionHandle, ChatError> {
        // Gemini bakes instructions into each request; the conversation is
        // represented client-side by the handle's committed turn log.
        Ok(SessionHandle::new(system_instruction, temperature))
    }

    async fn stream_message(
        &self,
        session: &SessionHandle,
        text: &str,
    ) -> Result<ReplyStream, ChatError> {
        let request = GenerateContentRequest {
            contents: contents_for(&session.turns().await, text),
            system_instruction: Some(Content::system(session.system_instruction())),
            generation_config: Some(GenerationConfig {
                temperature: Some(session.temperature()),
                ..Default::default()
            }),
        };

        let url = self.model_url(&self.chat_model, "streamGenerateContent", true);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| ChatError::Transport {
                message: format!("Gemini API request failed: {err}"),
                retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let (tx, stream) = ReplyStream::channel();
        let session = session.clone();
        let user_text = text.to_string();

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            let mut full_reply = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx
                            .send(Err(ChatError::Interrupted(err.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));
                for data in drain_data_lines(&mut buffer) {
                    let parsed: GenerateContentResponse = match serde_json::from_str(&data) {
                        Ok(parsed) => parsed,
                        Err(err) => {
                            let _ = tx
                                .send(Err(ChatError::Malformed(format!(
                                    "bad stream chunk: {err}"
                                ))))
                                .await;
                            return;
                        }
                    };

                    if let Some(fragment) = extract_text(parsed) {
                        full_reply.push_str(&fragment);
                        if tx.send(Ok(fragment)).await.is_err() {
                            // Consumer went away; the exchange is abandoned.
                            return;
                        }
                    }
                }
            }

            debug!(
                "gemini reply complete: {} chars over session {}",
                full_reply.len(),
                session.id()
            );
            session.commit_exchange(&user_text, &full_reply).await;
        });

        Ok(stream)
    }
}

#[async_trait::async_trait]
impl SpeechCapability for GeminiClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SynthesisError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(text)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        let response = self
            .generate_once(SPEECH_MODEL, &request)
            .await
            .map_err(|(status, message)| match status {
                0 => SynthesisError::Request(message),
                status => SynthesisError::Api { status, message },
            })?;

        let encoded = extract_inline_data(response)
            .map(|inline| inline.data)
            .ok_or(SynthesisError::NoAudio)?;

        BASE64_STANDARD
            .decode(encoded)
            .map_err(|err| SynthesisError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl ImageCapability for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "1:1".to_string(),
                }),
                ..Default::default()
            }),
        };

        let response = self
            .generate_once(IMAGE_MODEL, &request)
            .await
            .map_err(|(status, message)| match status {
                0 => GenerationError::Request(message),
                status => GenerationError::Api { status, message },
            })?;

        let Some(inline) = extract_inline_data(response) else {
            warn!("image response carried no inline data");
            return Ok(None);
        };

        let mime = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
        Ok(Some(format!("data:{mime};base64,{}", inline.data)))
    }
}

fn contents_for(turns: &[Turn], text: &str) -> Vec<Content> {
    let mut contents: Vec<Content> = turns
        .iter()
        .map(|turn| Content {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Model => "model",
            }
            .to_string(),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect();
    contents.push(Content::user(text));
    contents
}

/// Pops every complete SSE line out of `buffer` and returns the `data:`
/// payloads, leaving any trailing partial line in place.
fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim();
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() {
                payloads.push(data.to_string());
            }
        }
    }
    payloads
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Default)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

#[derive(Serialize)]
struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
struct InlineDataResponse {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
}

fn extract_inline_data(response: GenerateContentResponse) -> Option<InlineDataResponse> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| {
            content
                .parts
                .into_iter()
                .find_map(|part| part.inline_data)
        })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string())
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> ChatError {
    let message = api_error_message(&body);

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ChatError::Api {
        status: status.as_u16(),
        message,
        retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}
