use crate::models::{Error, Result};
use reqwest::Url;
use std::env::{self, VarError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistral";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant designed to provide clear, \
concise, and informative responses. Your main goal is to deliver accurate information to users, \
ensuring that they receive the most relevant and useful details. For general inquiries, you aim to \
give the shortest and most straightforward answers. When a user requests a list, you respond by \
presenting the information in JSON format for easy consumption. Additionally, you are capable of \
understanding and responding in multiple languages, adapting to the user's language preference. \
You use context and previous interactions to provide answers that are tailored to the user's \
needs, making the conversation more relevant and personalized. You maintain a friendly and \
respectful tone in your dialogues, and you actively engage users by asking thoughtful questions \
that encourage further conversation. You also have the ability to search for up-to-date \
information to ensure that your answers are current. Lastly, you always direct users to \
Microsoft's privacy statement, providing them with important information about how their data is \
used.";

const ENDPOINT_VAR: &str = "OLLAMA_CHAT_ENDPOINT";
const MODEL_VAR: &str = "OLLAMA_CHAT_MODEL";
const SYSTEM_PROMPT_VAR: &str = "OLLAMA_CHAT_SYSTEM_PROMPT";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub endpoint: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Reads `.env` if present, then applies any `OLLAMA_CHAT_*` overrides.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let read = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value)),
                Err(VarError::NotPresent) => Ok(None),
                Err(err) => Err(err.into()),
            }
        };

        let mut config = Self::default();

        if let Some(endpoint) = read(ENDPOINT_VAR)? {
            config.endpoint = parse_endpoint(endpoint.trim())?;
        }
        if let Some(model) = read(MODEL_VAR)? {
            config.model = model.trim().to_string();
        }
        if let Some(prompt) = read(SYSTEM_PROMPT_VAR)? {
            config.system_prompt = prompt;
        }

        Ok(config)
    }
}

fn parse_endpoint(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid endpoint {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(Error::Config(format!(
            "endpoint must use http or https, got {other:?}"
        ))),
    }
}
