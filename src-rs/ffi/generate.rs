use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::init_logger;

use super::generate_util;

/// Resolves to `{ status, body }` so the JS host can forward the status code
/// untouched.
#[napi]
pub async fn generate_after_screen(request_json: String) -> Result<String> {
    init_logger();
    let generator = generate_util::shared_generator()
        .map_err(|e| Error::from_reason(format!("Failed to load config: {}", e)))?;
    let response = generate_util::handle_generate(&generator, &request_json).await;
    serde_json::to_string(&response).map_err(|e| Error::from_reason(e.to_string()))
}

#[napi]
pub fn get_provider_status() -> Result<String> {
    init_logger();
    let generator = generate_util::shared_generator()
        .map_err(|e| Error::from_reason(format!("Failed to load config: {}", e)))?;
    Ok(generate_util::provider_status(generator.config()).to_string())
}

#[napi]
pub fn submit_feedback(task_id: String, prompt: String, feedback_json: String) -> String {
    init_logger();
    generate_util::record_feedback(&task_id, &prompt, &feedback_json).to_string()
}
