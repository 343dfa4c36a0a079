use serde_json::{json, Value};

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::models::provider_base::{ClientContext, GenerationRequest, ProviderClient};
use crate::llm::prompts::compose_prompt;
use crate::llm::utils::network::post_json_with_timeout;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: Option<String>,
    ctx: ClientContext,
}

impl OpenAiClient {
    pub fn new(api_base: String, api_key: String, model: String, ctx: ClientContext) -> Self {
        Self {
            api_base,
            api_key,
            model,
            system_prompt: None,
            ctx,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.api_base.trim_end_matches('/'))
    }
}

impl ProviderClient for OpenAiClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }

    async fn invoke(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let image = self.ctx.images.load(request.before_image.as_deref()).await;
        let prompt = compose_prompt(request.change_prompt.as_deref(), request.before_code.as_deref());
        let request_body = build_responses_request_body(
            &self.model,
            self.system_prompt.as_deref(),
            &prompt,
            image.as_deref(),
            self.ctx.max_tokens,
        );

        let http_request = self
            .ctx
            .http
            .post(self.responses_url())
            .header("Authorization", format!("Bearer {}", self.api_key));
        let payload =
            post_json_with_timeout(LLMProvider::OpenAI, http_request, &request_body, self.ctx.timeout)
                .await?;

        Ok(extract_text_from_responses(&payload))
    }
}

pub(crate) fn build_responses_request_body(
    model: &str,
    system_prompt: Option<&str>,
    prompt: &str,
    image_data_uri: Option<&str>,
    max_tokens: u64,
) -> Value {
    let mut input = Vec::new();
    if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
        input.push(json!({
            "role": "system",
            "content": [{ "type": "input_text", "text": system }]
        }));
    }

    let mut user_content = vec![json!({ "type": "input_text", "text": prompt })];
    if let Some(uri) = image_data_uri {
        user_content.push(json!({ "type": "input_image", "image_url": uri }));
    }
    input.push(json!({ "role": "user", "content": user_content }));

    json!({
        "model": model,
        "input": input,
        "max_output_tokens": max_tokens,
    })
}

/// Prefers the aggregated `output_text`; otherwise joins every text part of
/// every `message` output item.
pub(crate) fn extract_text_from_responses(payload: &Value) -> String {
    if let Some(text) = payload.get("output_text").and_then(|v| v.as_str()) {
        return text.to_string();
    }

    let mut chunks: Vec<&str> = Vec::new();
    let output = payload
        .get("output")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    for item in output {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let content = item
            .get("content")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for part in content {
            if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
                chunks.push(t);
            }
            if let Some(t) = part.get("output_text").and_then(|v| v.as_str()) {
                chunks.push(t);
            }
        }
    }

    chunks.join("\n").trim().to_string()
}
