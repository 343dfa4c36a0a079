use serde_json::json;
use std::time::{Duration, Instant};

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;
use crate::llm::utils::network::post_json_with_timeout;
use crate::tests::support::{http_response, json_response, serve, serve_silent};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_server_hits_the_bound() {
        let (base, _server) = serve_silent().await;
        let http = reqwest::Client::new();
        let started = Instant::now();

        let err = post_json_with_timeout(
            LLMProvider::Gemini,
            http.post(format!("{}/slow", base)),
            &json!({}),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Provider timed out after 0.2s.");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn json_reply_is_parsed() {
        let (base, server) = serve(vec![json_response(200, "{\"ok\":true}")]).await;
        let value = post_json_with_timeout(
            LLMProvider::OpenAI,
            reqwest::Client::new().post(format!("{}/x", base)),
            &json!({ "a": 1 }),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(value, json!({ "ok": true }));

        let captured = server.await.unwrap();
        assert_eq!(captured[0].header("content-type").as_deref(), Some("application/json"));
        assert_eq!(captured[0].json(), json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn non_json_reply_is_upstream_error() {
        let (base, server) = serve(vec![http_response(200, "text/html", "<html>oops</html>")]).await;
        let err = post_json_with_timeout(
            LLMProvider::Claude,
            reqwest::Client::new().post(base),
            &json!({}),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            GenerationError::Upstream { provider, status, message } => {
                assert_eq!(provider, LLMProvider::Claude);
                assert_eq!(status, None);
                assert!(message.starts_with("Claude returned a non-JSON payload"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_upstream_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = post_json_with_timeout(
            LLMProvider::OpenAI,
            reqwest::Client::new().post(format!("http://{}/v1/responses", addr)),
            &json!({}),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().starts_with("Failed to send request to OpenAI API"));
    }
}
