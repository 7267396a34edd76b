//! External definition provider speaking the OpenAI-compatible
//! chat-completions protocol (DeepInfra, OpenRouter, and friends).

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use termdeck_shared::{ProviderConfig, Result, TermDeckError, resolve_api_key};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::provider::DefinitionProvider;

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("termdeck/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body quoted in messages.
const ERROR_BODY_EXCERPT: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Outcome of a single failed request.
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying: rate limits, server errors, timeouts.
    Transient(String),
    /// Retrying will not help: auth, bad request, malformed response.
    Permanent(String),
}

// ---------------------------------------------------------------------------
// ChatProvider
// ---------------------------------------------------------------------------

/// Generates definitions with a chat-completions model.
pub struct ChatProvider {
    client: Client,
    endpoint: Url,
    api_key: String,
    config: ProviderConfig,
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl ChatProvider {
    /// Build a provider, reading the API key from the env var named in `config`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(config, api_key)
    }

    /// Build a provider with an explicit API key.
    pub fn new(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = chat_endpoint(&config.endpoint_root()?)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TermDeckError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request_once(&self, term: &str) -> std::result::Result<String, AttemptError> {
        let user_message = self.config.user_message(term);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AttemptError::Transient(format!("request failed: {e}"))
                } else {
                    AttemptError::Permanent(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("HTTP {status}: {}", excerpt(&text));
            return Err(if is_transient(status) {
                AttemptError::Transient(message)
            } else {
                AttemptError::Permanent(message)
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Permanent(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AttemptError::Permanent("response contained no choices".into()))
    }
}

impl DefinitionProvider for ChatProvider {
    fn name(&self) -> &'static str {
        "external"
    }

    #[instrument(skip(self), fields(model = %self.config.model))]
    async fn provide(&self, term: &str) -> Result<String> {
        let mut delay = Duration::from_millis(self.config.retry_backoff_ms);
        let mut attempt = 0;

        loop {
            match self.request_once(term).await {
                Ok(definition) => {
                    debug!(attempt, chars = definition.chars().count(), "definition received");
                    return Ok(definition);
                }
                Err(AttemptError::Transient(message)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %message, "transient provider failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(AttemptError::Transient(message) | AttemptError::Permanent(message)) => {
                    return Err(TermDeckError::provider(term, message));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append `/chat/completions` to the configured API root.
fn chat_endpoint(root: &Url) -> Result<Url> {
    let joined = format!("{}/chat/completions", root.as_str().trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| TermDeckError::config(format!("invalid chat endpoint '{joined}': {e}")))
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
