use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::models::provider_base::{
    ClientContext, GenerationRequest, GenerationResult, NormalizedResponse, ProviderClient,
};
use crate::llm::models::provider_handle::{create_client, AnyProviderClient};
use crate::llm::utils::image_loader::ImageLoader;
use crate::llm::utils::path_policy::AssetPathPolicy;
use crate::llm::utils::string_util::collapsed_preview;

use super::debug_sink::{FileHtmlSink, HtmlSink};

/// Hands out a client per provider. Fails with `MissingCredential` before
/// anything touches the network.
pub trait ClientSource: Send + Sync {
    type Client: ProviderClient;

    fn client_for(&self, provider: LLMProvider) -> Result<Self::Client, GenerationError>;
}

/// Clients built from the startup configuration
pub struct ConfiguredClients {
    config: Arc<AppConfig>,
    ctx: ClientContext,
}

impl ConfiguredClients {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let http = reqwest::Client::new();
        let images = ImageLoader::new(
            http.clone(),
            AssetPathPolicy::new(config.asset_root.clone()),
            config.timeout(),
        );
        let ctx = ClientContext {
            http,
            images,
            timeout: config.timeout(),
            max_tokens: config.max_tokens,
        };
        Self { config, ctx }
    }
}

impl ClientSource for ConfiguredClients {
    type Client = AnyProviderClient;

    fn client_for(&self, provider: LLMProvider) -> Result<AnyProviderClient, GenerationError> {
        create_client(provider, &self.config, self.ctx.clone())
    }
}

/// Single entry point for generation requests
pub struct Generator<S: ClientSource = ConfiguredClients> {
    config: Arc<AppConfig>,
    clients: S,
    sink: Option<Box<dyn HtmlSink>>,
}

impl Generator<ConfiguredClients> {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let sink = config
            .debug_html_prefix
            .as_deref()
            .map(|prefix| Box::new(FileHtmlSink::new(prefix)) as Box<dyn HtmlSink>);
        let clients = ConfiguredClients::new(Arc::clone(&config));
        Self {
            config,
            clients,
            sink,
        }
    }
}

impl<S: ClientSource> Generator<S> {
    pub fn with_clients(config: Arc<AppConfig>, clients: S) -> Self {
        Self {
            config,
            clients,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Option<Box<dyn HtmlSink>>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Normalises a requested provider id; a blank id means the configured
    /// default.
    pub fn resolve_provider(&self, provider_id: &str) -> Result<LLMProvider, GenerationError> {
        let requested = if provider_id.trim().is_empty() {
            self.config.default_provider.as_str()
        } else {
            provider_id
        };
        LLMProvider::from_name(requested)
            .ok_or_else(|| GenerationError::UnknownProvider(requested.trim().to_lowercase()))
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let provider = self.resolve_provider(&request.provider_id)?;
        let started_at = Instant::now();
        log::info!(
            "generate provider={} task={} prompt_len={}",
            provider,
            request.task_id.as_deref().unwrap_or("-"),
            request.change_prompt.as_deref().map(str::len).unwrap_or(0)
        );

        let final_response = self.run_attempts(provider, request).await?;
        let after_html = final_response.extracted_html;

        log::info!(
            "generate provider={} done in {}ms, html_len={}, preview={}",
            provider,
            started_at.elapsed().as_millis(),
            after_html.len(),
            collapsed_preview(&after_html, 200)
        );
        self.write_debug(provider, &after_html);

        Ok(GenerationResult { after_html })
    }

    /// First attempt, plus exactly one retry when its HTML looks truncated.
    /// The retry's response is final whatever its completeness.
    pub async fn run_attempts(
        &self,
        provider: LLMProvider,
        request: &GenerationRequest,
    ) -> Result<NormalizedResponse, GenerationError> {
        let client = self.clients.client_for(provider)?;
        let first = NormalizedResponse::from_raw_text(client.invoke(request).await?);
        if first.is_complete {
            return Ok(first);
        }

        if first.raw_text.trim().is_empty() {
            log::warn!("{} response carried no text", client.provider().display_name());
        }
        let retry_provider = self.config.retry_target.resolve(provider);
        let second = if retry_provider == provider {
            log::info!("html from {} incomplete, retrying", client.provider());
            client.invoke(request).await?
        } else {
            let retry_client = self.clients.client_for(retry_provider)?;
            log::warn!(
                "html from {} incomplete, retrying with {} (retry_target=openai)",
                client.provider(),
                retry_client.provider()
            );
            retry_client.invoke(request).await?
        };
        let second = NormalizedResponse::from_raw_text(second);
        if !second.is_complete {
            log::warn!("html from {} still incomplete after retry", retry_provider);
        }
        Ok(second)
    }

    fn write_debug(&self, provider: LLMProvider, html: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.write(provider, html) {
            log::warn!("{:#}", e);
        }
    }
}
