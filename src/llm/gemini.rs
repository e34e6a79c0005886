use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{
    CAPTION_EMOJI_RULE, CAPTION_HASHTAG_RULE, CAPTION_NO_EMOJI_RULE, CAPTION_NO_HASHTAG_RULE,
    CAPTION_SYSTEM_PROMPT, CONFIG,
};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

/// Caption voice requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionTone {
    Professional,
    Casual,
    Funny,
    Inspirational,
    Educational,
}

impl Default for CaptionTone {
    fn default() -> Self {
        CaptionTone::Casual
    }
}

impl CaptionTone {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptionTone::Professional => "professional",
            CaptionTone::Casual => "casual",
            CaptionTone::Funny => "funny",
            CaptionTone::Inspirational => "inspirational",
            CaptionTone::Educational => "educational",
        }
    }
}

/// Fills the caption system prompt template with the user's preferences.
pub fn build_caption_system_prompt(
    tone: CaptionTone,
    include_hashtags: bool,
    include_emojis: bool,
) -> String {
    let emoji_rule = if include_emojis {
        CAPTION_EMOJI_RULE
    } else {
        CAPTION_NO_EMOJI_RULE
    };
    let hashtag_rule = if include_hashtags {
        CAPTION_HASHTAG_RULE
    } else {
        CAPTION_NO_HASHTAG_RULE
    };

    CAPTION_SYSTEM_PROMPT
        .replace("{tone}", tone.as_str())
        .replace("{emoji_rule}", emoji_rule)
        .replace("{hashtag_rule}", hashtag_rule)
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

const GEMINI_MAX_RETRY_ATTEMPTS: usize = 2;
const GEMINI_RETRY_BASE_DELAY_MS: u64 = 900;

fn redact_gemini_api_key(text: &str) -> String {
    let key = CONFIG.gemini_api_key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn gemini_retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(GEMINI_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
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
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn build_safety_settings() -> Vec<Value> {
    let profile = CONFIG.gemini_safety_settings.as_str();
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                profile
            );
            "OFF"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut text_parts = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        if let Some(content) = candidate.content {
            if let Some(parts) = content.parts {
                for part in parts {
                    if let Some(text) = part.text {
                        if !text.trim().is_empty() {
                            text_parts.push(text);
                        }
                    }
                }
            }
        }
    }
    text_parts.join("\n")
}

async fn call_gemini_api(model: &str, payload: Value) -> Result<GeminiResponse> {
    let client = get_http_client();
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        model, CONFIG.gemini_api_key
    );

    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let response = match client
            .post(&url)
            .timeout(Duration::from_secs(90))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err_text = redact_gemini_api_key(&err.to_string());
                let should_retry =
                    gemini_should_retry_error(&err) && attempt < GEMINI_MAX_RETRY_ATTEMPTS;
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={}, retrying={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    should_retry
                );
                if should_retry {
                    tokio::time::sleep(gemini_retry_delay(attempt)).await;
                    continue;
                }
                return Err(anyhow!("Gemini request failed: {}", err_text));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            let should_retry =
                gemini_should_retry_status(status) && attempt < GEMINI_MAX_RETRY_ATTEMPTS;
            warn!(
                "Gemini API error: status={}, body={}, retrying={}",
                status, body_summary, should_retry
            );
            if tracing::enabled!(tracing::Level::DEBUG) {
                debug!(
                    target: "llm.gemini",
                    status = %status,
                    body = %truncate_for_log(&body, 4000)
                );
            }
            if should_retry {
                tokio::time::sleep(gemini_retry_delay(attempt)).await;
                continue;
            }
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Gemini request failed with status {}: {}",
                status,
                detail
            ));
        }

        return Ok(response.json::<GeminiResponse>().await?);
    }
}

/// Generates one ready-to-post caption for the given image idea.
pub async fn generate_caption(system_prompt: &str, user_prompt: &str) -> Result<String> {
    if CONFIG.gemini_api_key.trim().is_empty() {
        return Err(anyhow!("GEMINI_API_KEY is not configured"));
    }

    let payload = json!({
        "systemInstruction": { "parts": [{ "text": system_prompt }] },
        "contents": [{ "role": "user", "parts": [{ "text": user_prompt }] }],
        "generationConfig": {
            "temperature": CONFIG.gemini_temperature,
            "topK": CONFIG.gemini_top_k,
            "topP": CONFIG.gemini_top_p,
            "maxOutputTokens": CONFIG.gemini_max_output_tokens,
        },
        "safetySettings": build_safety_settings(),
    });

    let model = CONFIG.gemini_model.as_str();
    log_llm_timing("gemini", model, "generate_caption", None, || async {
        let response = call_gemini_api(model, payload).await?;
        let caption = extract_text_from_response(response);
        if caption.trim().is_empty() {
            return Err(anyhow!("Gemini returned an empty caption"));
        }
        Ok(caption)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_prompt_reflects_tone_and_switches() {
        let prompt = build_caption_system_prompt(CaptionTone::Funny, true, false);
        assert!(prompt.contains("Tone: funny"));
        assert!(prompt.contains(CAPTION_HASHTAG_RULE));
        assert!(prompt.contains(CAPTION_NO_EMOJI_RULE));
        assert!(!prompt.contains("{tone}"));
    }

    #[test]
    fn caption_tone_defaults_to_casual() {
        assert_eq!(CaptionTone::default().as_str(), "casual");
    }

    #[test]
    fn extracts_text_across_candidates_and_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [
                    { "text": "first" },
                    { "inlineData": { "mimeType": "image/png", "data": "" } },
                    { "text": "  " }
                ] } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(extract_text_from_response(response), "first\nsecond");
    }

    #[test]
    fn summarizes_gemini_error_payloads() {
        let (message, _) =
            summarize_error_body(r#"{"error": {"message": "API key not valid"}}"#);
        assert_eq!(message.as_deref(), Some("API key not valid"));
    }
}
