mod client;
pub(crate) mod types;

use std::time::Duration;

use crate::error::{AiError, Result};

use client::{OpenAiClient, OPENAI_API_URL};
use types::{ChatRequest, WireMessage};

/// Upper bound on one chat completion round trip.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// OpenAi Agent
// =============================================================================

/// Chat completion agent for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, model, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Like `new`, with a custom bound on each request.
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http,
        })
    }

    /// Point the agent at a gateway or self-hosted endpoint instead of OpenAI.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Single-turn chat completion returning the first choice's text.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .max_tokens(2048)
            .temperature(0.2);

        let response = self.client().chat(&request).await?;

        response.text().ok_or(AiError::EmptyResponse)
    }
}
