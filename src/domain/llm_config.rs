use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Local,
    OpenAI,
    Google,
}

impl LLMProvider {
    /// Account name used for this provider's keyring entry.
    pub fn key_name(&self) -> &'static str {
        match self {
            LLMProvider::Local => "local",
            LLMProvider::OpenAI => "openai",
            LLMProvider::Google => "google",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Google,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_tokens: Some(256),
            temperature: Some(0.2),
        }
    }
}
