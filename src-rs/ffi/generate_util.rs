use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};

use crate::config::AppConfig;
use crate::llm::generation::{ClientSource, Generator};
use crate::llm::models::provider_base::GenerationRequest;
use crate::llm::utils::serde_util::deserialize_string_opt_lax;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

static GENERATOR: OnceLock<Arc<Generator>> = OnceLock::new();

/// Process-wide generator, built from the configuration on first use and
/// never rebuilt afterwards.
pub fn shared_generator() -> anyhow::Result<Arc<Generator>> {
    if let Some(existing) = GENERATOR.get() {
        return Ok(Arc::clone(existing));
    }

    let config = Arc::new(AppConfig::load()?);
    log::info!(
        "boot timeout_ms={} max_tokens={} default_provider={} openai_model={}",
        config.timeout_ms,
        config.max_tokens,
        config.default_provider,
        config.providers.openai.model
    );
    let generator = Arc::new(Generator::from_config(config));
    Ok(Arc::clone(GENERATOR.get_or_init(|| generator)))
}

/// Inbound body of a generation call
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default, deserialize_with = "deserialize_string_opt_lax")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub before_image_url: Option<String>,
    #[serde(default)]
    pub before_code: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl From<GenerateBody> for GenerationRequest {
    fn from(body: GenerateBody) -> Self {
        GenerationRequest {
            task_id: body.task_id,
            change_prompt: body.prompt,
            before_image: body.before_image_url,
            before_code: body.before_code,
            provider_id: body.provider.unwrap_or_default(),
        }
    }
}

/// What the host should answer with: an HTTP status and a JSON body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

pub fn parse_generate_body(raw: &str) -> anyhow::Result<GenerateBody> {
    if raw.len() > MAX_BODY_BYTES {
        anyhow::bail!("Payload too large");
    }
    if raw.trim().is_empty() {
        return Ok(GenerateBody::default());
    }
    Ok(serde_json::from_str(raw)?)
}

pub async fn handle_generate<S: ClientSource>(
    generator: &Generator<S>,
    raw_body: &str,
) -> ServiceResponse {
    let body = match parse_generate_body(raw_body) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Rejected generation body: {}", e);
            return ServiceResponse::error(500, e.to_string());
        }
    };

    let request = GenerationRequest::from(body);
    match generator.generate(&request).await {
        Ok(result) => ServiceResponse {
            status: 200,
            body: json!({ "afterHtml": result.after_html }),
        },
        Err(e) => {
            log::error!("generate failed ({}): {}", e.http_status(), e);
            ServiceResponse::error(e.http_status(), e.to_string())
        }
    }
}

pub fn provider_status(config: &AppConfig) -> Value {
    let mut providers = Map::new();
    for (provider, availability) in config.provider_availability() {
        providers.insert(
            provider.provider_name().to_string(),
            json!({ "available": availability.available, "model": availability.model }),
        );
    }
    json!({ "mode": "live", "providers": providers })
}

/// Study answers are not stored server-side, only logged.
pub fn record_feedback(task_id: &str, prompt: &str, feedback_json: &str) -> Value {
    let feedback = serde_json::from_str::<Value>(feedback_json)
        .unwrap_or_else(|_| Value::String(feedback_json.to_string()));
    log::info!(
        "feedback task={} prompt_len={} feedback={}",
        task_id,
        prompt.len(),
        feedback
    );
    json!({ "ok": true })
}
