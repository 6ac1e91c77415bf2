//! Ollama-backed [`ModelGateway`].
//!
//! Talks to a local Ollama server: `GET /api/tags` for the model list,
//! `POST /api/chat` with `stream: false` for whole replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayReply, ModelGateway};
use crate::message::Turn;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const BASE_URL_VAR: &str = "OLLAMA_BASE_URL";

/// HTTP client for an Ollama server.
///
/// # Examples
/// ```no_run
/// use convograph::gateway::{ModelGateway, OllamaGateway};
///
/// # async fn example() -> Result<(), convograph::gateway::GatewayError> {
/// let gateway = OllamaGateway::from_env();
/// let models = gateway.list_models().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct OllamaGateway {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGateway {
    /// Creates a gateway against an explicit base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a gateway from `OLLAMA_BASE_URL` (with `.env` loaded via
    /// dotenvy), falling back to `http://localhost:11434`.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn connection_error(context: &str, err: &reqwest::Error) -> GatewayError {
    GatewayError::unavailable(format!("{context}: {err}"))
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| connection_error("could not reach model server", &e))?;

        if !response.status().is_success() {
            return Err(GatewayError::unavailable(format!(
                "model list request failed with status {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("malformed tags payload: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn invoke(&self, model_id: &str, messages: &[Turn]) -> Result<GatewayReply, GatewayError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: model_id,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| connection_error("could not reach model server", &e))?;

        if !response.status().is_success() {
            return Err(GatewayError::unavailable(format!(
                "chat request for model {model_id} failed with status {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("malformed chat payload: {e}")))?;

        let content = chat
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| GatewayError::invalid_response("reply is missing message content"))?;

        Ok(GatewayReply::new(content))
    }
}
