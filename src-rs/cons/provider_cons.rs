use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Gemini,
    Claude,
}

impl LLMProvider {
    pub const ALL: [LLMProvider; 3] = [LLMProvider::OpenAI, LLMProvider::Gemini, LLMProvider::Claude];

    /// Returns the identifier used in requests, configuration and debug file names
    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "openai",
            LLMProvider::Gemini => "gemini",
            LLMProvider::Claude => "claude",
        }
    }

    /// Human readable name used in upstream error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OpenAI",
            LLMProvider::Gemini => "Gemini",
            LLMProvider::Claude => "Claude",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::Gemini => "GEMINI_API_KEY",
            LLMProvider::Claude => "ANTHROPIC_API_KEY",
        }
    }

    /// Environment variable overriding the model id
    pub fn model_env(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OPENAI_MODEL",
            LLMProvider::Gemini => "GEMINI_MODEL",
            LLMProvider::Claude => "ANTHROPIC_MODEL",
        }
    }

    /// Helper to parse from a string (handles aliases)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(LLMProvider::OpenAI),
            "gemini" => Some(LLMProvider::Gemini),
            "claude" | "anthropic" => Some(LLMProvider::Claude),
            _ => None,
        }
    }
}

// Ensure Display trait matches provider_name for convenience
impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provider_name())
    }
}
