use std::time::Duration;

use thiserror::Error;

use crate::cons::provider_cons::LLMProvider;

/// Failure of a single generation request, as seen by the caller.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Missing {}", .0.api_key_env())]
    MissingCredential(LLMProvider),

    #[error("Provider timed out after {}s.", format_seconds(.0))]
    Timeout(Duration),

    #[error("{message}")]
    Upstream {
        provider: LLMProvider,
        status: Option<u16>,
        message: String,
    },
}

impl GenerationError {
    pub fn upstream(provider: LLMProvider, message: impl Into<String>) -> Self {
        GenerationError::Upstream {
            provider,
            status: None,
            message: message.into(),
        }
    }

    /// Builds the error for a non-success response. An empty body falls back
    /// to a generic message that still names the status.
    pub fn from_status(provider: LLMProvider, status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("{} request failed ({})", provider.display_name(), status)
        } else {
            body.to_string()
        };
        GenerationError::Upstream {
            provider,
            status: Some(status),
            message,
        }
    }

    /// Status code the host transport answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            GenerationError::UnknownProvider(_) => 400,
            GenerationError::Timeout(_) => 504,
            GenerationError::MissingCredential(_) | GenerationError::Upstream { .. } => 500,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout(_))
    }
}

pub fn format_seconds(duration: &Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}", millis / 1000)
    } else {
        format!("{}", duration.as_secs_f64())
    }
}
