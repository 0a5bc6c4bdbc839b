use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_image_model: String,
    pub gemini_image_aspect_ratio: String,
    pub gemini_image_size: String,
    pub gemini_safety_settings: String,
    pub gemini_timeout_seconds: u64,
    pub max_photo_bytes: usize,
    pub max_request_bytes: usize,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "standard".to_string();
    }

    match trimmed.to_lowercase().as_str() {
        "standard" => "standard".to_string(),
        "permissive" | "off" | "none" => "permissive".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to standard.",
                value
            );
            "standard".to_string()
        }
    }
}

fn normalize_api_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn parse_bind_addr(value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse::<SocketAddr>()
        .map_err(|err| anyhow!("Invalid BIND_ADDR '{}': {}", value, err))
}

impl Config {
    pub fn load() -> Result<Self> {
        let bind_addr = parse_bind_addr(&env_string("BIND_ADDR", "0.0.0.0:3000"))?;

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            bind_addr,
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_api_base: normalize_api_base(&env_string(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            gemini_image_aspect_ratio: env_string("GEMINI_IMAGE_ASPECT_RATIO", ""),
            gemini_image_size: env_string("GEMINI_IMAGE_SIZE", ""),
            gemini_safety_settings: normalize_gemini_safety_settings(&env_string(
                "GEMINI_SAFETY_SETTINGS",
                "standard",
            )),
            gemini_timeout_seconds: env_u64("GEMINI_TIMEOUT_SECONDS", 120).max(1),
            max_photo_bytes: env_usize("MAX_PHOTO_BYTES", 10 * 1024 * 1024),
            max_request_bytes: env_usize("MAX_REQUEST_BYTES", 16 * 1024 * 1024),
        })
    }
}
