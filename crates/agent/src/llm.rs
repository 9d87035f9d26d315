use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bunamo_core::config::{LlmConfig, LlmProvider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 512;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds the client selected by `llm.provider`.
///
/// # Errors
/// Fails when the HTTP client cannot be constructed or a required credential
/// is missing.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let base_url = || {
        config
            .effective_base_url()
            .with_context(|| format!("llm.base_url is required for {}", config.provider.as_str()))
    };
    let api_key = || {
        config
            .api_key
            .clone()
            .with_context(|| format!("llm.api_key is required for {}", config.provider.as_str()))
    };

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Disabled => Arc::new(DisabledLlmClient),
        LlmProvider::Ollama => {
            Arc::new(OllamaClient::new(base_url()?, config.model.clone(), config.timeout_secs)?)
        }
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            base_url()?,
            api_key()?,
            config.model.clone(),
            config.timeout_secs,
        )?),
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(
            base_url()?,
            api_key()?,
            config.model.clone(),
            config.timeout_secs,
        )?),
    };

    debug!(
        event_name = "llm.client.built",
        provider = config.provider.as_str(),
        model = %config.model,
        "llm client ready"
    );

    Ok(client)
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build llm HTTP client")
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

async fn ensure_success(response: reqwest::Response, provider: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        bail!("{provider} returned error status {status}: {error_body}");
    }
    Ok(response)
}

/// Always fails, so every narrative falls back to the deterministic template.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledLlmClient;

#[async_trait]
impl LlmClient for DisabledLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("llm provider is disabled")
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self { client: http_client(timeout_secs)?, base_url, model })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body =
            OllamaGenerateRequest { model: &self.model, prompt, stream: false, format: "json" };

        let response = self
            .client
            .post(endpoint(&self.base_url, "api/generate"))
            .json(&body)
            .send()
            .await
            .context("ollama generate request failed")?;

        let parsed: OllamaGenerateResponse = ensure_success(response, "ollama")
            .await?
            .json()
            .await
            .context("failed to deserialize ollama generate response")?;

        Ok(parsed.response)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: String,
        api_key: SecretString,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self { client: http_client(timeout_secs)?, base_url, api_key, model })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("openai chat completion request failed")?;

        let parsed: ChatCompletionResponse = ensure_success(response, "openai")
            .await?
            .json()
            .await
            .context("failed to deserialize openai chat completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("openai response contained no message content")
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<MessagesContentBlock>,
}

#[derive(Debug, Deserialize)]
struct MessagesContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(
        base_url: String,
        api_key: SecretString,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self { client: http_client(timeout_secs)?, base_url, api_key, model })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: ANTHROPIC_MAX_TOKENS,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("anthropic messages request failed")?;

        let parsed: MessagesResponse = ensure_success(response, "anthropic")
            .await?
            .json()
            .await
            .context("failed to deserialize anthropic messages response")?;

        parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .context("anthropic response contained no text block")
    }
}
