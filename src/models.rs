use rustyline::error::ReadlineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Builds the two-message body sent on every call: the system prompt
    /// followed by the latest user message. Earlier turns are never included.
    pub fn single_turn(model: &str, system_prompt: &str, user_text: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage::new(Role::System, system_prompt),
                ChatMessage::new(Role::User, user_text),
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// Content of the first choice. `Ok(None)` when the model returned a
    /// null or empty message, `Err(EmptyChoices)` when there is no choice.
    pub fn reply_text(&self) -> Result<Option<&str>> {
        let choice = self.choices.first().ok_or(Error::EmptyChoices)?;
        Ok(choice
            .message
            .content
            .as_deref()
            .filter(|content| !content.is_empty()))
    }
}

/// One bubble in the chat list. Display-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request failed with status {0}")]
    RequestFailed(reqwest::StatusCode),
    #[error("Request was canceled")]
    Cancelled,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Response contained no choices")]
    EmptyChoices,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Environment error: {0}")]
    Environment(#[from] std::env::VarError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Terminal error: {0}")]
    Terminal(#[from] clearscreen::Error),
    #[error("Readline error: {0}")]
    Readline(String),
}

impl From<ReadlineError> for Error {
    fn from(err: ReadlineError) -> Self {
        Error::Readline(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
