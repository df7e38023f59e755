use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::models::ChatMessage;

pub const DEFAULT_API_URL: &str = "https://api.together.xyz/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3-8b-chat-hf";

const DEFAULT_MAX_TOKENS: u32 = 512;
const DEFAULT_TEMPERATURE: f32 = 0.7;

// --- Model trait ---

pub trait LanguageModel {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sent ahead of the prompt, usually a single system instruction.
    pub context: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            context: Vec::new(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn context(mut self, context: Vec<ChatMessage>) -> Self {
        self.context = context;
        self
    }

    /// Context messages followed by the prompt as the final user turn.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = self.context.clone();
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }
}

/// Expands a short model alias; full `org/model` identifiers pass through unchanged.
pub fn resolve_model(name: &str) -> Result<String> {
    match name {
        "llama3-8b" | "llama-3-8b" => Ok("meta-llama/Llama-3-8b-chat-hf".to_string()),
        "llama3-70b" | "llama-3-70b" => Ok("meta-llama/Llama-3-70b-chat-hf".to_string()),
        "mixtral" => Ok("mistralai/Mixtral-8x7B-Instruct-v0.1".to_string()),
        "qwen" => Ok("Qwen/Qwen2-72B-Instruct".to_string()),
        full if full.contains('/') => Ok(full.to_string()),
        _ => Err(anyhow!(
            "Unknown model '{}'. Available: llama3-8b (default), llama3-70b, mixtral, qwen, \
             or a full identifier such as meta-llama/Llama-3-8b-chat-hf",
            name
        )),
    }
}

// --- Chat completions client ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct ChatCompletionsClient {
    api_key: Option<String>,
    model_id: String,
    api_url: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_key: config.api_key.clone(),
            model_id: config.model.clone(),
            api_url: config.api_url.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl LanguageModel for ChatCompletionsClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let Some(api_key) = &self.api_key else {
            return Err(GatewayError::NotConfigured);
        };

        let body = ChatRequest {
            model: &self.model_id,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: request.messages(),
        };

        debug!(model = %self.model_id, max_tokens = request.max_tokens, "Sending completion request");
        let started = Instant::now();

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .inspect_err(|e| warn!(error = %e, "Completion request failed"))?;

        let status = response.status();
        debug!(status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "Completion response");

        if !status.is_success() {
            warn!(status = status.as_u16(), "Completion request rejected");
            return Err(GatewayError::from_status(status.as_u16()));
        }

        let api_response: ChatResponse = response
            .json()
            .map_err(|e| GatewayError::Unexpected(format!("Failed to parse API response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Unexpected("No choices in API response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
