use serde_json::{json, Value};

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::models::provider_base::{ClientContext, GenerationRequest, ProviderClient};
use crate::llm::prompts::compose_prompt;
use crate::llm::utils::image_loader::split_data_uri;
use crate::llm::utils::network::post_json_with_timeout;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    ctx: ClientContext,
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model_name: String, ctx: ClientContext) -> Self {
        Self {
            base_url,
            api_key,
            model_name,
            ctx,
        }
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name
        )
    }
}

impl ProviderClient for GeminiClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Gemini
    }

    async fn invoke(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let image = self.ctx.images.load(request.before_image.as_deref()).await;
        let prompt = compose_prompt(request.change_prompt.as_deref(), request.before_code.as_deref());
        let request_body = build_generate_content_body(&prompt, image.as_deref(), self.ctx.max_tokens);

        let http_request = self
            .ctx
            .http
            .post(self.generate_content_url())
            .header("x-goog-api-key", self.api_key.as_str());
        let payload =
            post_json_with_timeout(LLMProvider::Gemini, http_request, &request_body, self.ctx.timeout)
                .await?;

        Ok(extract_text_from_gemini(&payload))
    }
}

pub(crate) fn build_generate_content_body(
    prompt: &str,
    image_data_uri: Option<&str>,
    max_tokens: u64,
) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(uri) = image_data_uri {
        let (mime, data) = split_data_uri(uri);
        parts.push(json!({
            "inline_data": { "mime_type": mime, "data": data }
        }));
    }

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "maxOutputTokens": max_tokens },
    })
}

pub(crate) fn extract_text_from_gemini(payload: &Value) -> String {
    payload
        .pointer("/candidates/0/content/parts")
        .and_then(|parts| parts.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
