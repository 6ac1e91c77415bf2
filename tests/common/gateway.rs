use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use convograph::gateway::{GatewayError, GatewayReply, ModelGateway};
use convograph::message::Turn;

/// One request the gateway received, as the engine sent it.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub model_id: String,
    pub messages: Vec<Turn>,
}

#[derive(Clone, Debug)]
enum Scripted {
    Reply {
        text: String,
        delay: Option<Duration>,
    },
    Fail {
        message: String,
    },
}

/// In-memory gateway double: records every call, plays back per-model
/// scripted replies/failures (FIFO), and otherwise echoes the last user
/// turn prefixed with the model id so every hop of a chain produces fresh,
/// attributable payload text.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
    models: Vec<String>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            models: vec!["scripted-model".to_string()],
        }
    }

    pub fn with_models(models: &[&str]) -> Self {
        Self {
            models: models.iter().map(|m| (*m).to_string()).collect(),
            ..Self::new()
        }
    }

    /// Queues a canned reply for the next call to `model`.
    pub fn script_reply(&self, model: &str, text: &str) {
        self.push(model, Scripted::Reply {
            text: text.to_string(),
            delay: None,
        });
    }

    /// Queues a reply that resolves only after `delay`.
    pub fn script_delayed_reply(&self, model: &str, text: &str, delay: Duration) {
        self.push(model, Scripted::Reply {
            text: text.to_string(),
            delay: Some(delay),
        });
    }

    /// Queues a connection-level failure for the next call to `model`.
    pub fn script_failure(&self, model: &str, message: &str) {
        self.push(model, Scripted::Fail {
            message: message.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, model: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.model_id == model)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn push(&self, model: &str, entry: Scripted) {
        self.scripts
            .lock()
            .entry(model.to_string())
            .or_default()
            .push_back(entry);
    }

    fn pop(&self, model: &str) -> Option<Scripted> {
        self.scripts
            .lock()
            .get_mut(model)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.models.clone())
    }

    async fn invoke(&self, model_id: &str, messages: &[Turn]) -> Result<GatewayReply, GatewayError> {
        self.calls.lock().push(RecordedCall {
            model_id: model_id.to_string(),
            messages: messages.to_vec(),
        });

        match self.pop(model_id) {
            Some(Scripted::Reply { text, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(GatewayReply::new(text))
            }
            Some(Scripted::Fail { message }) => Err(GatewayError::unavailable(message)),
            None => {
                let last_user = messages
                    .last()
                    .map(|t| t.content.as_str())
                    .unwrap_or_default();
                Ok(GatewayReply::new(format!("{model_id} answers: {last_user}")))
            }
        }
    }
}
