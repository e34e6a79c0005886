use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub replicate_api_token: String,
    pub replicate_base_url: String,
    pub replicate_model: String,
    pub replicate_aspect_ratio: String,
    pub replicate_poll_interval_ms: u64,
    pub replicate_timeout_seconds: u64,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub gemini_top_k: i32,
    pub gemini_top_p: f32,
    pub gemini_max_output_tokens: i32,
    pub gemini_safety_settings: String,
    pub minio_endpoint: String,
    pub minio_port: u16,
    pub minio_use_ssl: bool,
    pub minio_bucket: String,
    pub minio_api_token: String,
    pub posts_default_limit: i64,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let replicate_api_token = env::var("REPLICATE_API_TOKEN").unwrap_or_default();
        if replicate_api_token.trim().is_empty() {
            return Err(anyhow::anyhow!("REPLICATE_API_TOKEN is required"));
        }

        let gemini_api_key = env_string("GEMINI_API_KEY", "");
        if gemini_api_key.trim().is_empty() {
            warn!("GEMINI_API_KEY is not set; caption generation will fail until it is.");
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            server_host: env_string("SERVER_HOST", "0.0.0.0"),
            server_port: env_u16("SERVER_PORT", 3000),
            database_url: env_string("DATABASE_URL", "sqlite://instadream.db"),
            replicate_api_token,
            replicate_base_url: env_string("REPLICATE_BASE_URL", "https://api.replicate.com/v1"),
            replicate_model: env_string("REPLICATE_MODEL", "bytedance/seedream-4"),
            replicate_aspect_ratio: env_string("REPLICATE_ASPECT_RATIO", "1:1"),
            replicate_poll_interval_ms: env_u64("REPLICATE_POLL_INTERVAL_MS", 1500),
            replicate_timeout_seconds: env_u64("REPLICATE_TIMEOUT_SECONDS", 120),
            gemini_api_key,
            gemini_model: env_string("GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", 0.8),
            gemini_top_k: env_i32("GEMINI_TOP_K", 40),
            gemini_top_p: env_f32("GEMINI_TOP_P", 0.95),
            gemini_max_output_tokens: env_i32("GEMINI_MAX_OUTPUT_TOKENS", 1024),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            minio_endpoint: env_string("MINIO_ENDPOINT", "localhost"),
            minio_port: env_u16("MINIO_PORT", 9000),
            minio_use_ssl: env_bool("MINIO_USE_SSL", false),
            minio_bucket: env_string("MINIO_BUCKET_NAME", "instadream"),
            minio_api_token: env_string("MINIO_API_TOKEN", ""),
            posts_default_limit: env_i64("POSTS_DEFAULT_LIMIT", 50),
        })
    }
}

pub const CAPTION_SYSTEM_PROMPT: &str = r#"You are an expert Instagram caption writer. Generate ONE single, ready-to-post Instagram caption.

CRITICAL RULES:
- Generate ONLY ONE caption, NOT multiple options
- Do NOT include phrases like "Option 1", "Here are some options", "You could use", etc.
- Output the caption directly without any preamble or explanation
- The caption should be ready to copy and paste directly to Instagram

Requirements:
- Tone: {tone}
- {emoji_rule}
- {hashtag_rule}
- Keep the main caption concise (2-3 sentences max)
- Write in first person perspective
- Make it authentic and relatable
- Use line breaks for readability

Format:
[Main caption text with emojis if enabled]

[Hashtags if enabled, on a new line]

REMEMBER: Output ONLY the caption text, nothing else!"#;

pub const CAPTION_EMOJI_RULE: &str = "Include 2-3 relevant emojis naturally within the text";
pub const CAPTION_NO_EMOJI_RULE: &str = "Do NOT include emojis";
pub const CAPTION_HASHTAG_RULE: &str =
    "Include 8-12 relevant hashtags on a new line at the end";
pub const CAPTION_NO_HASHTAG_RULE: &str = "Do NOT include hashtags";
