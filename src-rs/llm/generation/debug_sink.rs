use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cons::provider_cons::LLMProvider;

/// Receives the final HTML of each successful generation. Failures are the
/// caller's to log; they never fail the request.
pub trait HtmlSink: Send + Sync {
    fn write(&self, provider: LLMProvider, html: &str) -> Result<()>;
}

/// Overwrites `<prefix>-<provider>.html` with the latest document.
#[derive(Debug, Clone)]
pub struct FileHtmlSink {
    prefix: String,
}

impl FileHtmlSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, provider: LLMProvider) -> PathBuf {
        PathBuf::from(format!("{}-{}.html", self.prefix, provider.provider_name()))
    }
}

impl HtmlSink for FileHtmlSink {
    fn write(&self, provider: LLMProvider, html: &str) -> Result<()> {
        let path = self.path_for(provider);
        std::fs::write(&path, html)
            .with_context(|| format!("Failed to write debug html to {}", path.display()))
    }
}
