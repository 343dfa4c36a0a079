use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{AppConfig, RetryTarget};
use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::generation::{FileHtmlSink, Generator, HtmlSink};
use crate::llm::models::provider_base::GenerationRequest;
use crate::tests::support::{ScriptedClient, ScriptedSource, COMPLETE_DOC, TRUNCATED_DOC};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink {
        writes: Arc<Mutex<Vec<(LLMProvider, String)>>>,
    }

    impl HtmlSink for RecordingSink {
        fn write(&self, provider: LLMProvider, html: &str) -> anyhow::Result<()> {
            self.writes.lock().unwrap().push((provider, html.to_string()));
            Ok(())
        }
    }

    struct FailingSink;

    impl HtmlSink for FailingSink {
        fn write(&self, _provider: LLMProvider, _html: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn config() -> AppConfig {
        AppConfig::embedded().unwrap()
    }

    fn generator(config: AppConfig, source: &ScriptedSource) -> Generator<ScriptedSource> {
        Generator::with_clients(Arc::new(config), source.clone())
    }

    fn fenced(html: &str) -> String {
        format!("Here it is:\n```html\n{}\n```", html)
    }

    #[tokio::test]
    async fn complete_first_attempt_makes_one_call() {
        let gemini = ScriptedClient::new(LLMProvider::Gemini, vec![Ok(fenced(COMPLETE_DOC))]);
        let source = ScriptedSource::default().with(gemini.clone());

        let result = generator(config(), &source)
            .generate(&GenerationRequest::new("gemini", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, COMPLETE_DOC);
        assert_eq!(gemini.calls(), 1);
    }

    #[tokio::test]
    async fn incomplete_first_attempt_retries_once() {
        let openai = ScriptedClient::new(
            LLMProvider::OpenAI,
            vec![Ok(TRUNCATED_DOC.to_string()), Ok(COMPLETE_DOC.to_string())],
        );
        let source = ScriptedSource::default().with(openai.clone());

        let result = generator(config(), &source)
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, COMPLETE_DOC);
        assert_eq!(openai.calls(), 2);
    }

    #[tokio::test]
    async fn second_incomplete_attempt_is_returned_without_third_call() {
        let openai = ScriptedClient::new(
            LLMProvider::OpenAI,
            vec![
                Ok(TRUNCATED_DOC.to_string()),
                Ok("<!DOCTYPE html><html><body>still".to_string()),
                Ok(COMPLETE_DOC.to_string()),
            ],
        );
        let source = ScriptedSource::default().with(openai.clone());

        let result = generator(config(), &source)
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, "<!DOCTYPE html><html><body>still");
        assert_eq!(openai.calls(), 2);
    }

    #[tokio::test]
    async fn empty_reply_counts_as_incomplete() {
        let claude = ScriptedClient::new(LLMProvider::Claude, vec![Ok(String::new())]);
        let source = ScriptedSource::default().with(claude.clone());

        let result = generator(config(), &source)
            .generate(&GenerationRequest::new("claude", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, "");
        assert_eq!(claude.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_provider_touches_nothing() {
        let openai = ScriptedClient::new(LLMProvider::OpenAI, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default().with(openai);

        let err = generator(config(), &source)
            .generate(&GenerationRequest::new("  Bogus ", "x"))
            .await
            .unwrap_err();
        assert!(matches!(&err, GenerationError::UnknownProvider(id) if id == "bogus"));
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.to_string(), "Unknown provider: bogus");
        assert_eq!(source.lookups(), 0);
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn provider_ids_are_normalised() {
        let claude = ScriptedClient::new(
            LLMProvider::Claude,
            vec![Ok(COMPLETE_DOC.to_string()), Ok(COMPLETE_DOC.to_string())],
        );
        let source = ScriptedSource::default().with(claude.clone());
        let generator = generator(config(), &source);

        generator
            .generate(&GenerationRequest::new("anthropic", "x"))
            .await
            .unwrap();
        generator
            .generate(&GenerationRequest::new(" CLAUDE ", "x"))
            .await
            .unwrap();
        assert_eq!(claude.calls(), 2);
    }

    #[tokio::test]
    async fn blank_provider_uses_configured_default() {
        let mut cfg = config();
        cfg.default_provider = "gemini".to_string();
        let gemini = ScriptedClient::new(LLMProvider::Gemini, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default().with(gemini.clone());

        let mut request = GenerationRequest::new("", "x");
        request.provider_id = "   ".to_string();
        generator(cfg, &source).generate(&request).await.unwrap();
        assert_eq!(gemini.calls(), 1);
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_call() {
        let openai = ScriptedClient::new(LLMProvider::OpenAI, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default().with(openai);

        let err = generator(config(), &source)
            .generate(&GenerationRequest::new("claude", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential(LLMProvider::Claude)));
        assert_eq!(err.to_string(), "Missing ANTHROPIC_API_KEY");
        assert_eq!(err.http_status(), 500);
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn timeout_propagates_without_retry() {
        let gemini = ScriptedClient::new(
            LLMProvider::Gemini,
            vec![Err(GenerationError::Timeout(Duration::from_secs(45)))],
        );
        let source = ScriptedSource::default().with(gemini.clone());

        let err = generator(config(), &source)
            .generate(&GenerationRequest::new("gemini", "x"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.http_status(), 504);
        assert_eq!(err.to_string(), "Provider timed out after 45s.");
        assert_eq!(gemini.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_error_propagates_without_retry() {
        let openai = ScriptedClient::new(
            LLMProvider::OpenAI,
            vec![Err(GenerationError::from_status(LLMProvider::OpenAI, 429, "slow down"))],
        );
        let source = ScriptedSource::default().with(openai.clone());

        let err = generator(config(), &source)
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "slow down");
        assert_eq!(openai.calls(), 1);
    }

    #[tokio::test]
    async fn error_on_retry_is_returned() {
        let openai = ScriptedClient::new(
            LLMProvider::OpenAI,
            vec![
                Ok(TRUNCATED_DOC.to_string()),
                Err(GenerationError::Timeout(Duration::from_millis(1_500))),
            ],
        );
        let source = ScriptedSource::default().with(openai.clone());

        let err = generator(config(), &source)
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider timed out after 1.5s.");
        assert_eq!(openai.calls(), 2);
    }

    #[tokio::test]
    async fn openai_retry_target_switches_client() {
        let mut cfg = config();
        cfg.retry_target = RetryTarget::OpenAI;
        let gemini = ScriptedClient::new(LLMProvider::Gemini, vec![Ok(TRUNCATED_DOC.to_string())]);
        let openai = ScriptedClient::new(LLMProvider::OpenAI, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default()
            .with(gemini.clone())
            .with(openai.clone());

        let result = generator(cfg, &source)
            .generate(&GenerationRequest::new("gemini", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, COMPLETE_DOC);
        assert_eq!(gemini.calls(), 1);
        assert_eq!(openai.calls(), 1);
    }

    #[tokio::test]
    async fn openai_retry_target_without_openai_key_fails() {
        let mut cfg = config();
        cfg.retry_target = RetryTarget::OpenAI;
        let gemini = ScriptedClient::new(LLMProvider::Gemini, vec![Ok(TRUNCATED_DOC.to_string())]);
        let source = ScriptedSource::default().with(gemini.clone());

        let err = generator(cfg, &source)
            .generate(&GenerationRequest::new("gemini", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential(LLMProvider::OpenAI)));
        assert_eq!(gemini.calls(), 1);
    }

    #[tokio::test]
    async fn sink_receives_final_html() {
        let openai = ScriptedClient::new(LLMProvider::OpenAI, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default().with(openai);
        let sink = RecordingSink::default();

        generator(config(), &source)
            .with_sink(Some(Box::new(sink.clone())))
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap();

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.as_slice(), &[(LLMProvider::OpenAI, COMPLETE_DOC.to_string())]);
    }

    #[tokio::test]
    async fn failing_sink_does_not_fail_generation() {
        let openai = ScriptedClient::new(LLMProvider::OpenAI, vec![Ok(COMPLETE_DOC.to_string())]);
        let source = ScriptedSource::default().with(openai);

        let result = generator(config(), &source)
            .with_sink(Some(Box::new(FailingSink)))
            .generate(&GenerationRequest::new("openai", "x"))
            .await
            .unwrap();
        assert_eq!(result.after_html, COMPLETE_DOC);
    }

    #[test]
    fn file_sink_names_file_per_provider() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("latest-after");
        let sink = FileHtmlSink::new(prefix.to_string_lossy());

        sink.write(LLMProvider::Gemini, "<html></html>").unwrap();
        sink.write(LLMProvider::Gemini, "<html>2</html>").unwrap();

        let written = std::fs::read_to_string(dir.path().join("latest-after-gemini.html")).unwrap();
        assert_eq!(written, "<html>2</html>");
        assert!(sink.write(LLMProvider::Claude, "x").is_ok());
        assert!(FileHtmlSink::new("/nonexistent-dir/x").write(LLMProvider::OpenAI, "x").is_err());
    }
}
