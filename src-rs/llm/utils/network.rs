use serde_json::Value;
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;
use crate::error::GenerationError;

/// Sends `body` as JSON and parses the JSON reply, with the whole exchange
/// (connect, status, body) bounded by `timeout`.
///
/// When the bound expires the in-flight future is dropped, which closes the
/// connection; nothing read after that point can reach the caller.
pub async fn post_json_with_timeout(
    provider: LLMProvider,
    request: reqwest::RequestBuilder,
    body: &Value,
    timeout: Duration,
) -> Result<Value, GenerationError> {
    let exchange = async move {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(provider, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(provider, status.as_u16(), &error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(provider, timeout, e))?;
        serde_json::from_str::<Value>(&text).map_err(|e| {
            GenerationError::upstream(
                provider,
                format!("{} returned a non-JSON payload: {}", provider.display_name(), e),
            )
        })
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} request aborted after {:?}", provider.display_name(), timeout);
            Err(GenerationError::Timeout(timeout))
        }
    }
}

fn transport_error(provider: LLMProvider, timeout: Duration, e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        return GenerationError::Timeout(timeout);
    }
    GenerationError::upstream(
        provider,
        format!("Failed to send request to {} API: {}", provider.display_name(), e),
    )
}
