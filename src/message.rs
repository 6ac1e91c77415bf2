use serde::{Deserialize, Serialize};
use std::fmt;

/// The sender of a conversation turn.
///
/// The model gateway wire format uses the lowercase names (`"user"`,
/// `"assistant"`), which is what the serde representation produces.
///
/// # Examples
/// ```
/// use convograph::message::Role;
///
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// assert_eq!(Role::Assistant.to_string(), "assistant");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input submitted to a node, whether typed or piped from another node.
    User,
    /// A model reply (final output, thought segments already stripped).
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable turn of a node's conversation history.
///
/// Turns are the model-visible context: the ordered sequence of prior turns
/// is what gets sent to the gateway on the next submission. Display-only
/// material (error lines) lives in the transcript instead, see
/// [`crate::transcript`].
///
/// # Examples
/// ```
/// use convograph::message::{Role, Turn};
///
/// let turn = Turn::user("What's the weather like?");
/// assert_eq!(turn.role, Role::User);
/// assert_eq!(turn.content, "What's the weather like?");
///
/// let reply = Turn::assistant("Sunny, 24°C.");
/// assert!(reply.is_assistant());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// The text content of the turn.
    pub content: String,
}

impl Turn {
    /// Creates a turn with the given role and content.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns `true` if this is a user turn.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns `true` if this is an assistant turn.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
