use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use url::Url;

use crate::config::CONFIG;
use crate::llm::{
    build_caption_system_prompt, generate_caption, generate_instagram_image, CaptionTone,
    ImageGenerationOptions,
};
use crate::prompt::templates::QUICK_ADD_MODIFIERS;
use crate::prompt::{
    build_enhanced_prompt, build_prompt_preview, catalog_snapshot, validate_prompt_request,
    PromptRequest,
};
use crate::state::AppState;
use crate::storage;
use crate::utils::timing::{complete_request_timer, start_request_timer};

type ApiResponse = (StatusCode, Json<Value>);

fn default_true() -> bool {
    true
}

fn internal_error(context: &str, err: anyhow::Error) -> ApiResponse {
    error!("{context}: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub reference_image: Option<String>,
    #[serde(default)]
    pub image_prompt_strength: Option<f64>,
    #[serde(default)]
    pub is_manual_prompt: bool,
    #[serde(default = "default_true")]
    pub include_quality_boost: bool,
    #[serde(default)]
    pub extra_modifiers: Vec<String>,
}

impl GenerateImageRequest {
    fn to_prompt_request(&self) -> PromptRequest {
        PromptRequest {
            base_prompt: self.prompt.clone(),
            subject_type: self.subject_type.clone(),
            background: self.background.clone(),
            lighting: self.lighting.clone(),
            mood: self.mood.clone(),
            include_quality_boost: self.include_quality_boost,
            extra_modifiers: self.extra_modifiers.clone(),
        }
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into MIME type and bytes.
fn parse_data_url(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.split(';').next().unwrap_or_default();
    if mime_type.is_empty() || !header.ends_with("base64") {
        return None;
    }
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}

/// Uploads a data-URL reference image to storage. Plain URLs pass through
/// untouched; upload failures degrade to generating without a stored copy.
async fn intake_reference_image(
    reference: Option<&str>,
) -> (Option<String>, Option<String>) {
    let Some(reference) = reference else {
        return (None, None);
    };

    if !reference.starts_with("data:") {
        return match Url::parse(reference) {
            Ok(_) => (Some(reference.to_string()), None),
            Err(err) => {
                warn!("Ignoring invalid reference image URL: {err}");
                (None, None)
            }
        };
    }

    let Some((mime_type, bytes)) = parse_data_url(reference) else {
        warn!("Ignoring malformed reference image data URL");
        return (None, None);
    };

    match storage::upload_image_bytes(&bytes, &mime_type).await {
        Ok(stored) => {
            info!("Reference image uploaded to storage: {}", stored.image_url);
            (Some(stored.image_url), Some(stored.storage_key))
        }
        Err(err) => {
            error!("Failed to upload reference image: {err:#}");
            (None, None)
        }
    }
}

pub async fn generate_image_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> ApiResponse {
    let mut timer = start_request_timer("generate_image", Some(request.prompt.clone()));

    let enhanced_prompt = if request.is_manual_prompt {
        let manual = request.prompt.trim().to_string();
        if manual.is_empty() {
            complete_request_timer(&mut timer, "invalid", None);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "Prompt is required" })),
            );
        }
        manual
    } else {
        let prompt_request = request.to_prompt_request();
        let validation = validate_prompt_request(&prompt_request);
        if !validation.is_valid {
            complete_request_timer(&mut timer, "invalid", None);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Invalid prompt configuration",
                    "details": validation.errors,
                })),
            );
        }
        let enhanced = build_enhanced_prompt(&prompt_request);
        info!("Enhanced prompt: {}", enhanced);
        enhanced
    };

    let (reference_image_url, reference_storage_key) =
        intake_reference_image(request.reference_image.as_deref()).await;

    let post_id = match request.post_id {
        Some(post_id) => {
            if let Err(err) = state
                .db
                .mark_generating(
                    post_id,
                    &enhanced_prompt,
                    reference_image_url.as_deref(),
                    reference_storage_key.as_deref(),
                )
                .await
            {
                complete_request_timer(&mut timer, "error", None);
                return internal_error("Failed to update post record", err);
            }
            post_id
        }
        None => match state
            .db
            .create_post(
                &enhanced_prompt,
                &CONFIG.replicate_model,
                reference_image_url.as_deref(),
                reference_storage_key.as_deref(),
            )
            .await
        {
            Ok(post_id) => post_id,
            Err(err) => {
                complete_request_timer(&mut timer, "error", None);
                return internal_error("Failed to create post record", err);
            }
        },
    };

    // The model accepts either the re-hosted copy or the caller's URL.
    let generation_reference = reference_image_url
        .clone()
        .or_else(|| request.reference_image.clone());
    let options = ImageGenerationOptions {
        reference_image: generation_reference,
        image_prompt_strength: request.image_prompt_strength,
    };

    let generated = match generate_instagram_image(&enhanced_prompt, &options).await {
        Ok(generated) => generated,
        Err(err) => {
            if let Err(db_err) = state.db.fail_post(post_id, &err.0).await {
                error!("Failed to record generation failure: {db_err:#}");
            }
            complete_request_timer(&mut timer, "error", Some(err.0.clone()));
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            );
        }
    };

    info!("Image generated successfully: {}", generated.url);

    let stored = match storage::upload_image_from_url(&generated.url).await {
        Ok(stored) => stored,
        Err(err) => {
            let message = err.to_string();
            if let Err(db_err) = state.db.fail_post(post_id, &message).await {
                error!("Failed to record upload failure: {db_err:#}");
            }
            complete_request_timer(&mut timer, "error", Some(message));
            return internal_error("Failed to store generated image", err);
        }
    };

    if let Err(err) = state
        .db
        .complete_post(
            post_id,
            &stored.image_url,
            &stored.storage_key,
            &generated.model_used,
        )
        .await
    {
        complete_request_timer(&mut timer, "error", None);
        return internal_error("Failed to complete post record", err);
    }

    complete_request_timer(&mut timer, "success", None);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "postId": post_id,
            "imageUrl": stored.image_url,
            "storageKey": stored.storage_key,
        })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCaptionRequest {
    pub prompt: String,
    #[serde(default)]
    pub tone: CaptionTone,
    #[serde(default = "default_true")]
    pub include_hashtags: bool,
    #[serde(default = "default_true")]
    pub include_emojis: bool,
    #[serde(default)]
    pub post_id: Option<i64>,
}

pub async fn generate_caption_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateCaptionRequest>,
) -> ApiResponse {
    let mut timer = start_request_timer("generate_caption", Some(request.prompt.clone()));

    if request.prompt.trim().is_empty() {
        complete_request_timer(&mut timer, "invalid", None);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Prompt is required" })),
        );
    }

    let system_prompt = build_caption_system_prompt(
        request.tone,
        request.include_hashtags,
        request.include_emojis,
    );

    let caption = match generate_caption(&system_prompt, &request.prompt).await {
        Ok(caption) => caption,
        Err(err) => {
            complete_request_timer(&mut timer, "error", Some(err.to_string()));
            return internal_error("Caption generation failed", err);
        }
    };

    if let Some(post_id) = request.post_id {
        if let Err(err) = state.db.set_caption(post_id, &caption).await {
            complete_request_timer(&mut timer, "error", None);
            return internal_error("Failed to store caption", err);
        }
    }

    complete_request_timer(&mut timer, "success", None);
    (
        StatusCode::OK,
        Json(json!({ "success": true, "caption": caption })),
    )
}

pub async fn prompt_preview_handler(Json(request): Json<PromptRequest>) -> ApiResponse {
    let validation = validate_prompt_request(&request);
    let preview = build_prompt_preview(&request);

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "preview": preview,
            "validation": validation,
        })),
    )
}

pub async fn templates_handler() -> ApiResponse {
    let quick_add: Vec<Value> = QUICK_ADD_MODIFIERS
        .iter()
        .map(|modifier| json!({ "label": modifier.label, "value": modifier.value }))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "templates": catalog_snapshot(),
            "quickAddModifiers": quick_add,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_data_urls() {
        let encoded = general_purpose::STANDARD.encode(b"fake image bytes");
        let data_url = format!("data:image/png;base64,{encoded}");

        let (mime_type, bytes) = parse_data_url(&data_url).unwrap();
        assert_eq!(mime_type, "image/png");
        assert_eq!(bytes, b"fake image bytes");
    }

    #[test]
    fn rejects_non_base64_and_malformed_data_urls() {
        assert!(parse_data_url("https://example.com/image.png").is_none());
        assert!(parse_data_url("data:image/png,plain").is_none());
        assert!(parse_data_url("data:;base64,AAAA").is_none());
        assert!(parse_data_url("data:image/png;base64,not-base64!").is_none());
    }

    #[test]
    fn image_request_defaults_match_the_api_contract() {
        let request: GenerateImageRequest =
            serde_json::from_str(r#"{"prompt": "a cup of coffee"}"#).unwrap();
        assert!(request.include_quality_boost);
        assert!(!request.is_manual_prompt);
        assert!(request.subject_type.is_none());
        assert!(request.extra_modifiers.is_empty());
    }

    #[test]
    fn caption_request_defaults_match_the_api_contract() {
        let request: GenerateCaptionRequest =
            serde_json::from_str(r#"{"prompt": "morning latte"}"#).unwrap();
        assert_eq!(request.tone, CaptionTone::Casual);
        assert!(request.include_hashtags);
        assert!(request.include_emojis);
        assert!(request.post_id.is_none());
    }
}
