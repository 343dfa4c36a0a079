use crate::config::AppConfig;
use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;

use super::claude::ClaudeClient;
use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
pub use super::provider_base::{ClientContext, GenerationRequest, ProviderClient};

pub enum AnyProviderClient {
    OpenAI(OpenAiClient),
    Gemini(GeminiClient),
    Claude(ClaudeClient),
}

impl ProviderClient for AnyProviderClient {
    fn provider(&self) -> LLMProvider {
        match self {
            AnyProviderClient::OpenAI(c) => c.provider(),
            AnyProviderClient::Gemini(c) => c.provider(),
            AnyProviderClient::Claude(c) => c.provider(),
        }
    }

    async fn invoke(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        match self {
            AnyProviderClient::OpenAI(c) => c.invoke(request).await,
            AnyProviderClient::Gemini(c) => c.invoke(request).await,
            AnyProviderClient::Claude(c) => c.invoke(request).await,
        }
    }
}

/// Builds the client for `provider`, refusing up front when no API key is
/// configured so that no request is ever sent without credentials.
pub fn create_client(
    provider: LLMProvider,
    config: &AppConfig,
    ctx: ClientContext,
) -> Result<AnyProviderClient, GenerationError> {
    let cfg = config.provider(provider);
    let api_key = cfg
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(GenerationError::MissingCredential(provider))?
        .to_string();

    let client = match provider {
        LLMProvider::OpenAI => AnyProviderClient::OpenAI(
            OpenAiClient::new(cfg.base_url.clone(), api_key, cfg.model.clone(), ctx)
                .with_system_prompt(cfg.system_prompt.clone()),
        ),
        LLMProvider::Gemini => AnyProviderClient::Gemini(GeminiClient::new(
            cfg.base_url.clone(),
            api_key,
            cfg.model.clone(),
            ctx,
        )),
        LLMProvider::Claude => AnyProviderClient::Claude(
            ClaudeClient::new(cfg.base_url.clone(), api_key, cfg.model.clone(), ctx)
                .with_api_version(cfg.api_version.clone()),
        ),
    };
    Ok(client)
}
