use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::utils::serde_util::deserialize_u64_opt_lax;

/// Which client re-runs a generation whose HTML came back truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryTarget {
    /// Ask the provider that produced the incomplete document again.
    Same,
    /// Always retry with the OpenAI-style client.
    OpenAI,
}

impl RetryTarget {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "same" => Some(RetryTarget::Same),
            "openai" => Some(RetryTarget::OpenAI),
            _ => None,
        }
    }

    pub fn resolve(&self, provider: LLMProvider) -> LLMProvider {
        match self {
            RetryTarget::Same => provider,
            RetryTarget::OpenAI => LLMProvider::OpenAI,
        }
    }
}

/// Per-provider endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the provider API, without the trailing operation path
    pub base_url: String,

    /// Model id sent with every request
    pub model: String,

    /// API key; never serialized so the resolved config can be shown safely
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Protocol version header, only used by Claude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Extra system message, only used by the OpenAI-style request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ProviderConfig {
    pub fn is_available(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub claude: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: LLMProvider) -> &ProviderConfig {
        match provider {
            LLMProvider::OpenAI => &self.openai,
            LLMProvider::Gemini => &self.gemini,
            LLMProvider::Claude => &self.claude,
        }
    }

    pub fn get_mut(&mut self, provider: LLMProvider) -> &mut ProviderConfig {
        match provider {
            LLMProvider::OpenAI => &mut self.openai,
            LLMProvider::Gemini => &mut self.gemini,
            LLMProvider::Claude => &mut self.claude,
        }
    }
}

/// User override configuration (restricted fields)
#[derive(Deserialize, Default)]
pub struct UserOverrideConfig {
    pub default_provider: Option<String>,
    #[serde(default, deserialize_with = "deserialize_u64_opt_lax")]
    pub timeout_ms: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_u64_opt_lax")]
    pub max_tokens: Option<u64>,
    pub asset_root: Option<PathBuf>,
    pub debug_html_prefix: Option<String>,
    pub retry_target: Option<RetryTarget>,
    #[serde(default)]
    pub providers: HashMap<String, UserProviderConfig>,
}

#[derive(Deserialize, Default)]
pub struct UserProviderConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
}

/// Availability entry of the status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAvailability {
    pub available: bool,
    pub model: String,
}

/// Global application configuration, resolved once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Bound for each provider round trip, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Output token limit sent to every provider
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    /// Root that "/..." image references resolve against
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    /// Prefix of the per-provider debug HTML file; unset disables the write
    #[serde(default)]
    pub debug_html_prefix: Option<String>,

    #[serde(default = "default_retry_target")]
    pub retry_target: RetryTarget,

    pub providers: ProvidersConfig,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout_ms() -> u64 {
    45_000
}

fn default_max_tokens() -> u64 {
    8_000
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_retry_target() -> RetryTarget {
    RetryTarget::Same
}

impl AppConfig {
    /// Load configuration with layered strategy:
    /// 1. Defaults (Embedded Config.toml)
    /// 2. User Config (~/.uistudy/uistudy.json)
    /// 3. Project Config (./.uistudy/uistudy.json)
    /// 4. Process environment, completed by ./.env without overriding it
    pub fn load() -> Result<Self> {
        let mut config = Self::embedded()?;

        if let Some(home) = dirs::home_dir() {
            let user_path = home.join(".uistudy").join("uistudy.json");
            Self::apply_patch(&mut config, user_path);
        }

        let project_path = Path::new(".uistudy").join("uistudy.json");
        Self::apply_patch(&mut config, project_path);

        let mut env: HashMap<String, String> = std::env::vars().collect();
        for (key, value) in parse_dotenv(Path::new(".env")) {
            env.entry(key).or_insert(value);
        }
        config.apply_env(&env);

        Ok(config)
    }

    pub fn embedded() -> Result<Self> {
        let default_str = include_str!("../Config.toml");
        toml::from_str(default_str).context("Failed to parse embedded Config.toml")
    }

    /// Merges a JSON override file into `config`. A missing file is not an
    /// error; a malformed one is logged and skipped.
    pub fn apply_patch<P: AsRef<Path>>(config: &mut AppConfig, path: P) {
        let path = path.as_ref();
        if !path.exists() {
            return;
        }
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read config patch {}: {}", path.display(), e);
                return;
            }
        };
        let patch: UserOverrideConfig = match serde_json::from_str(&content) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Failed to parse config patch {}: {}", path.display(), e);
                return;
            }
        };
        config.merge(patch);
    }

    fn merge(&mut self, patch: UserOverrideConfig) {
        if let Some(p) = patch.default_provider {
            self.default_provider = p.to_lowercase();
        }
        if let Some(t) = patch.timeout_ms {
            self.timeout_ms = t;
        }
        if let Some(m) = patch.max_tokens {
            self.max_tokens = m;
        }
        if let Some(root) = patch.asset_root {
            self.asset_root = root;
        }
        if let Some(prefix) = patch.debug_html_prefix {
            self.debug_html_prefix = non_empty(&prefix).map(str::to_string);
        }
        if let Some(target) = patch.retry_target {
            self.retry_target = target;
        }

        for (name, p) in patch.providers {
            let Some(provider) = LLMProvider::from_name(&name) else {
                log::warn!("Ignoring config for unknown provider {}", name);
                continue;
            };
            let cfg = self.providers.get_mut(provider);
            if let Some(v) = p.base_url {
                cfg.base_url = v;
            }
            if let Some(v) = p.model {
                cfg.model = v;
            }
            if let Some(v) = p.api_key {
                cfg.api_key = non_empty(&v).map(str::to_string);
            }
            if let Some(v) = p.api_version {
                cfg.api_version = Some(v);
            }
        }
    }

    /// Applies environment overrides. Empty values count as unset.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) {
        let get = |key: &str| env.get(key).and_then(|v| non_empty(v));

        if let Some(p) = get("UI_PROVIDER") {
            self.default_provider = p.to_lowercase();
        }
        if let Some(raw) = get("UI_PROVIDER_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(v) => self.timeout_ms = v,
                Err(_) => log::warn!("Ignoring invalid UI_PROVIDER_TIMEOUT_MS={}", raw),
            }
        }
        if let Some(raw) = get("UI_MAX_TOKENS") {
            match raw.parse::<u64>() {
                Ok(v) => self.max_tokens = v,
                Err(_) => log::warn!("Ignoring invalid UI_MAX_TOKENS={}", raw),
            }
        }
        if let Some(raw) = get("UI_RETRY_TARGET") {
            match RetryTarget::from_name(raw) {
                Some(t) => self.retry_target = t,
                None => log::warn!("Ignoring invalid UI_RETRY_TARGET={}", raw),
            }
        }

        for provider in LLMProvider::ALL {
            let cfg = self.providers.get_mut(provider);
            if let Some(key) = get(provider.api_key_env()) {
                cfg.api_key = Some(key.to_string());
            }
            if let Some(model) = get(provider.model_env()) {
                cfg.model = model.to_string();
            }
        }
        if let Some(version) = get("ANTHROPIC_VERSION") {
            self.providers.claude.api_version = Some(version.to_string());
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn provider(&self, provider: LLMProvider) -> &ProviderConfig {
        self.providers.get(provider)
    }

    /// Per-provider availability, keyed by provider id
    pub fn provider_availability(&self) -> Vec<(LLMProvider, ProviderAvailability)> {
        LLMProvider::ALL
            .iter()
            .map(|p| {
                let cfg = self.provider(*p);
                (
                    *p,
                    ProviderAvailability {
                        available: cfg.is_available(),
                        model: cfg.model.clone(),
                    },
                )
            })
            .collect()
    }
}

fn non_empty(v: &str) -> Option<&str> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Reads KEY=VALUE lines. Comments, blank lines and `export ` prefixes are
/// accepted; one level of matching quotes is stripped from values.
pub fn parse_dotenv(path: &Path) -> HashMap<String, String> {
    let content = fs::read_to_string(path).unwrap_or_default();
    let mut vars = HashMap::new();
    for raw_line in content.lines() {
        let mut line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("export ") {
            line = stripped.trim();
        }
        let Some((key, value)) = line.split_once('=') else { continue };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let mut value = value.trim().to_string();
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            if (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
                || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')
            {
                value = value[1..value.len() - 1].to_string();
            }
        }
        vars.insert(key.to_string(), value);
    }
    vars
}
