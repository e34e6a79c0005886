use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, thiserror::Error)]
#[error("Image generation failed: {0}")]
pub struct ImageGenerationError(pub String);

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
    pub model_used: String,
}

/// Optional knobs for a generation run beyond the prompt itself.
#[derive(Debug, Clone, Default)]
pub struct ImageGenerationOptions {
    pub reference_image: Option<String>,
    pub image_prompt_strength: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

const REPLICATE_MAX_RETRY_ATTEMPTS: usize = 2;
const REPLICATE_RETRY_BASE_DELAY_MS: u64 = 900;

fn redact_replicate_token(text: &str) -> String {
    let token = CONFIG.replicate_api_token.trim();
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "[redacted]")
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(REPLICATE_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .get("detail")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("title")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

/// Builds the model input object. The hosted models take different
/// parameter sets, so the shape branches on the model family the same way
/// the picker in the UI does.
fn build_model_input(model: &str, prompt: &str, options: &ImageGenerationOptions) -> Value {
    let mut input = Map::new();
    input.insert("prompt".to_string(), json!(prompt));

    let lowered = model.to_ascii_lowercase();
    if lowered.contains("seedream") {
        input.insert(
            "aspect_ratio".to_string(),
            json!(CONFIG.replicate_aspect_ratio),
        );
        input.insert("enhance_prompt".to_string(), json!(true));
        input.insert("max_images".to_string(), json!(1));
        if let Some(reference) = options.reference_image.as_deref() {
            input.insert("image_input".to_string(), json!([reference]));
        }
    } else if lowered.contains("flux") {
        input.insert(
            "aspect_ratio".to_string(),
            json!(CONFIG.replicate_aspect_ratio),
        );
        input.insert("num_outputs".to_string(), json!(1));
        if let Some(reference) = options.reference_image.as_deref() {
            input.insert("image".to_string(), json!(reference));
            input.insert(
                "prompt_strength".to_string(),
                json!(options.image_prompt_strength.unwrap_or(0.5)),
            );
        }
    } else {
        input.insert("width".to_string(), json!(1024));
        input.insert("height".to_string(), json!(1024));
        input.insert("num_outputs".to_string(), json!(1));
        input.insert("guidance_scale".to_string(), json!(7.5));
        input.insert("num_inference_steps".to_string(), json!(50));
        if let Some(reference) = options.reference_image.as_deref() {
            input.insert("image".to_string(), json!(reference));
            input.insert(
                "prompt_strength".to_string(),
                json!(options.image_prompt_strength.unwrap_or(0.5)),
            );
        }
    }

    Value::Object(input)
}

/// Picks the image URL out of a prediction output, which is either a bare
/// string or an array of URLs depending on the model.
fn extract_image_url(output: &Value) -> Option<String> {
    match output {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.as_str().map(|url| url.to_string())),
        _ => None,
    }
}

async fn send_with_retries(
    build: impl Fn() -> reqwest::RequestBuilder,
    context: &str,
) -> Result<Value> {
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let response = match build().send().await {
            Ok(response) => response,
            Err(err) => {
                let err_text = redact_replicate_token(&err.to_string());
                let should_retry =
                    should_retry_error(&err) && attempt < REPLICATE_MAX_RETRY_ATTEMPTS;
                warn!(
                    "Replicate {context} request failed to send: {} (timeout={}, connect={}, retrying={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    should_retry
                );
                if should_retry {
                    tokio::time::sleep(retry_delay(attempt)).await;
                    continue;
                }
                return Err(anyhow!("Replicate {context} request failed: {}", err_text));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            let should_retry =
                should_retry_status(status) && attempt < REPLICATE_MAX_RETRY_ATTEMPTS;
            warn!(
                "Replicate {context} error: status={}, body={}, retrying={}",
                status, body_summary, should_retry
            );
            if should_retry {
                tokio::time::sleep(retry_delay(attempt)).await;
                continue;
            }
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Replicate {context} failed with status {}: {}",
                status,
                detail
            ));
        }

        return Ok(response.json::<Value>().await?);
    }
}

async fn create_prediction(prompt: &str, options: &ImageGenerationOptions) -> Result<Prediction> {
    let client = get_http_client();
    let model = CONFIG.replicate_model.as_str();
    let input = build_model_input(model, prompt, options);

    // Version-pinned models go through the generic predictions endpoint,
    // plain owner/name models through the model-scoped one.
    let (url, payload) = match model.split_once(':') {
        Some((_, version)) => (
            format!("{}/predictions", CONFIG.replicate_base_url),
            json!({ "version": version, "input": input }),
        ),
        None => (
            format!("{}/models/{}/predictions", CONFIG.replicate_base_url, model),
            json!({ "input": input }),
        ),
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(target: "llm.replicate", model = model, payload = %payload);
    }

    let value = send_with_retries(
        || {
            client
                .post(&url)
                .bearer_auth(&CONFIG.replicate_api_token)
                .json(&payload)
        },
        "create",
    )
    .await?;

    Ok(serde_json::from_value(value)?)
}

async fn get_prediction(id: &str) -> Result<Prediction> {
    let client = get_http_client();
    let url = format!("{}/predictions/{}", CONFIG.replicate_base_url, id);
    let value = send_with_retries(
        || client.get(&url).bearer_auth(&CONFIG.replicate_api_token),
        "poll",
    )
    .await?;
    Ok(serde_json::from_value(value)?)
}

async fn wait_for_prediction(mut prediction: Prediction) -> Result<Prediction> {
    let deadline = Duration::from_secs(CONFIG.replicate_timeout_seconds);
    let interval = Duration::from_millis(CONFIG.replicate_poll_interval_ms.max(250));
    let started = std::time::Instant::now();

    loop {
        match prediction.status.as_str() {
            "succeeded" => return Ok(prediction),
            "failed" | "canceled" => {
                let detail = prediction
                    .error
                    .as_ref()
                    .map(|value| truncate_for_log(&value.to_string(), 500))
                    .unwrap_or_else(|| prediction.status.clone());
                return Err(anyhow!("Replicate prediction {}: {}", prediction.id, detail));
            }
            _ => {}
        }

        if started.elapsed() >= deadline {
            return Err(anyhow!(
                "Timed out waiting for Replicate prediction {} after {}s",
                prediction.id,
                CONFIG.replicate_timeout_seconds
            ));
        }

        tokio::time::sleep(interval).await;
        prediction = get_prediction(&prediction.id).await?;
    }
}

/// Generates one square image for the composed prompt and returns its URL
/// on the model provider's CDN. The caller re-hosts it in object storage.
pub async fn generate_instagram_image(
    prompt: &str,
    options: &ImageGenerationOptions,
) -> Result<GeneratedImage, ImageGenerationError> {
    let model = CONFIG.replicate_model.clone();
    let prompt = prompt.to_string();
    let options = options.clone();

    let result = log_llm_timing(
        "replicate",
        &model,
        "generate_image",
        Some(json!({ "hasReference": options.reference_image.is_some() })),
        || async {
            let prediction = create_prediction(&prompt, &options).await?;
            let prediction = wait_for_prediction(prediction).await?;
            let output = prediction
                .output
                .as_ref()
                .and_then(extract_image_url)
                .ok_or_else(|| {
                    anyhow!(
                        "Replicate prediction {} returned no image output",
                        prediction.id
                    )
                })?;
            Ok(output)
        },
    )
    .await;

    match result {
        Ok(url) => Ok(GeneratedImage {
            url,
            model_used: model,
        }),
        Err(err) => Err(ImageGenerationError(redact_replicate_token(
            &err.to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_url_from_array_output() {
        let output = json!(["https://example.com/a.png", "https://example.com/b.png"]);
        assert_eq!(
            extract_image_url(&output).as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn extracts_url_from_string_output() {
        let output = json!("https://example.com/only.png");
        assert_eq!(
            extract_image_url(&output).as_deref(),
            Some("https://example.com/only.png")
        );
    }

    #[test]
    fn rejects_outputs_without_urls() {
        assert!(extract_image_url(&json!({})).is_none());
        assert!(extract_image_url(&json!([1, 2])).is_none());
        assert!(extract_image_url(&json!(null)).is_none());
    }

    #[test]
    fn summarizes_structured_error_bodies() {
        let (message, _) = summarize_error_body(r#"{"detail": "Invalid token"}"#);
        assert_eq!(message.as_deref(), Some("Invalid token"));

        let (message, summary) = summarize_error_body("plain text failure");
        assert!(message.is_none());
        assert_eq!(summary, "plain text failure");
    }
}
