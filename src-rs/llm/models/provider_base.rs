use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::utils::html_extract::{extract_html, is_complete_html};
use crate::llm::utils::image_loader::ImageLoader;

/// One generation attempt as submitted by the study UI. The provider id is
/// kept raw; the router decides whether it names a known provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub task_id: Option<String>,
    pub change_prompt: Option<String>,
    pub before_image: Option<String>,
    pub before_code: Option<String>,
    pub provider_id: String,
}

#[cfg(test)]
impl GenerationRequest {
    pub fn new(provider_id: impl Into<String>, change_prompt: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            change_prompt: Some(change_prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_before_code(mut self, code: impl Into<String>) -> Self {
        self.before_code = Some(code.into());
        self
    }

    pub fn with_before_image(mut self, reference: impl Into<String>) -> Self {
        self.before_image = Some(reference.into());
        self
    }
}

/// Provider output after extraction and validation. Derived entirely from
/// `raw_text`; a retry produces a new value instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    pub raw_text: String,
    pub extracted_html: String,
    pub is_complete: bool,
}

impl NormalizedResponse {
    pub fn from_raw_text(raw_text: String) -> Self {
        let extracted_html = extract_html(&raw_text);
        let is_complete = is_complete_html(&extracted_html);
        Self {
            raw_text,
            extracted_html,
            is_complete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub after_html: String,
}

/// Transport pieces every provider client shares
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub http: reqwest::Client,
    pub images: ImageLoader,
    pub timeout: Duration,
    pub max_tokens: u64,
}

#[allow(async_fn_in_trait)]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> LLMProvider;

    /// Sends one request and returns the model's plain text.
    async fn invoke(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
