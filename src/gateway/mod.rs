//! The model backend seam.
//!
//! The engine treats the language-model backend as a black-box RPC: given a
//! model identifier and an ordered turn sequence, it eventually returns one
//! whole reply or one error. Streaming, timeouts, and retries are the
//! backend's concern; the engine sees exactly the two failure shapes in
//! [`GatewayError`].

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::message::Turn;

#[cfg(feature = "ollama")]
mod ollama;
#[cfg(feature = "ollama")]
pub use ollama::OllamaGateway;

/// A complete reply from the backend, thought tags still embedded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayReply {
    /// Raw reply text as produced by the model.
    pub text: String,
}

impl GatewayReply {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Failures a backend call can surface.
#[derive(Debug, Error, Diagnostic)]
pub enum GatewayError {
    /// Connection-level failure: the backend could not be reached or
    /// answered with a non-success status.
    #[error("model backend unavailable: {message}")]
    #[diagnostic(
        code(convograph::gateway::unavailable),
        help("Check that the model server is running and the base URL is correct.")
    )]
    Unavailable { message: String },

    /// The backend answered, but the reply was malformed (for example a
    /// chat response without a content field).
    #[error("invalid reply from model backend: {message}")]
    #[diagnostic(code(convograph::gateway::invalid_response))]
    InvalidResponse { message: String },
}

impl GatewayError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Black-box RPC to a language-model backend.
///
/// `messages` is the ordered model-visible context, already including the
/// turn being submitted; implementations must not append anything.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Lists available model identifiers. Consumed once at startup by the
    /// surrounding shell to pick an initial binding.
    async fn list_models(&self) -> Result<Vec<String>, GatewayError>;

    /// Sends the turn sequence to `model_id` and waits for the whole reply.
    async fn invoke(&self, model_id: &str, messages: &[Turn]) -> Result<GatewayReply, GatewayError>;
}
