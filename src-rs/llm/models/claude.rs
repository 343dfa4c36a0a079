use serde_json::{json, Value};

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::models::provider_base::{ClientContext, GenerationRequest, ProviderClient};
use crate::llm::prompts::compose_prompt;
use crate::llm::utils::image_loader::split_data_uri;
use crate::llm::utils::network::post_json_with_timeout;

pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub api_version: String,
    ctx: ClientContext,
}

impl ClaudeClient {
    pub fn new(base_url: String, api_key: String, model_name: String, ctx: ClientContext) -> Self {
        Self {
            base_url,
            api_key,
            model_name,
            api_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            ctx,
        }
    }

    pub fn with_api_version(mut self, version: Option<String>) -> Self {
        if let Some(v) = version.filter(|v| !v.trim().is_empty()) {
            self.api_version = v;
        }
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }
}

impl ProviderClient for ClaudeClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Claude
    }

    async fn invoke(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let image = self.ctx.images.load(request.before_image.as_deref()).await;
        let prompt = compose_prompt(request.change_prompt.as_deref(), request.before_code.as_deref());
        let request_body =
            build_messages_request_body(&self.model_name, &prompt, image.as_deref(), self.ctx.max_tokens);

        let http_request = self
            .ctx
            .http
            .post(self.messages_url())
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", self.api_version.as_str());
        let payload =
            post_json_with_timeout(LLMProvider::Claude, http_request, &request_body, self.ctx.timeout)
                .await?;

        Ok(extract_text_from_anthropic_payload(&payload))
    }
}

pub(crate) fn build_messages_request_body(
    model: &str,
    prompt: &str,
    image_data_uri: Option<&str>,
    max_tokens: u64,
) -> Value {
    let mut content = vec![json!({ "type": "text", "text": prompt })];
    if let Some(uri) = image_data_uri {
        let (media_type, data) = split_data_uri(uri);
        content.push(json!({
            "type": "image",
            "source": { "type": "base64", "media_type": media_type, "data": data }
        }));
    }

    json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [{ "role": "user", "content": content }],
    })
}

pub(crate) fn extract_text_from_anthropic_payload(payload: &Value) -> String {
    let Some(blocks) = payload.get("content").and_then(|c| c.as_array()) else {
        return String::new();
    };
    blocks
        .iter()
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
