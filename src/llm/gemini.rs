use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::media::PhotoPayload;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Image generation failed: {0}")]
pub struct ImageGenerationError(pub String);

#[derive(Debug, Clone, Default)]
pub struct GeminiImageConfig {
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

impl GeminiImageConfig {
    pub fn from_config() -> Self {
        fn non_empty(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        Self {
            aspect_ratio: non_empty(&CONFIG.gemini_image_aspect_ratio),
            image_size: non_empty(&CONFIG.gemini_image_size),
        }
    }
}

/// Where and how generation requests are sent.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub image: GeminiImageConfig,
    pub safety_profile: String,
}

impl GeminiSettings {
    pub fn from_config() -> Self {
        Self {
            api_base: CONFIG.gemini_api_base.clone(),
            api_key: CONFIG.gemini_api_key.clone(),
            model: CONFIG.gemini_image_model.clone(),
            timeout: Duration::from_secs(CONFIG.gemini_timeout_seconds),
            image: GeminiImageConfig::from_config(),
            safety_profile: CONFIG.gemini_safety_settings.clone(),
        }
    }
}

/// One image returned by the generation service, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub base64: String,
}

impl GeneratedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: GeminiInlineData,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct GeminiInlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    data: String,
}

fn redact_api_key(text: &str, key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using standard defaults.",
                profile
            );
            "BLOCK_MEDIUM_AND_ABOVE"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
    ]
}

fn build_image_config(config: &GeminiImageConfig) -> Option<Value> {
    let mut map = Map::new();

    if let Some(aspect_ratio) = config.aspect_ratio.as_deref() {
        let trimmed = aspect_ratio.trim();
        if !trimmed.is_empty() {
            map.insert("aspectRatio".to_string(), json!(trimmed));
        }
    }

    if let Some(image_size) = config.image_size.as_deref() {
        let trimmed = image_size.trim();
        if !trimmed.is_empty() {
            map.insert("imageSize".to_string(), json!(trimmed));
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn build_transformation_payload(
    instruction: &str,
    photo: &PhotoPayload,
    image_config: &GeminiImageConfig,
    safety_profile: &str,
) -> Value {
    let mut generation_config = json!({ "responseModalities": ["IMAGE"] });
    if let Some(image_config) = build_image_config(image_config) {
        if let Some(config_object) = generation_config.as_object_mut() {
            config_object.insert("imageConfig".to_string(), image_config);
        }
    }

    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "inlineData": { "mimeType": photo.mime_type, "data": photo.to_base64() } },
                { "text": instruction }
            ]
        }],
        "generationConfig": generation_config,
        "safetySettings": build_safety_settings(safety_profile),
    })
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_payload(payload: &Value) -> Value {
    let parts = payload
        .pointer("/contents/0/parts")
        .and_then(|value| value.as_array())
        .map(|parts| {
            parts
                .iter()
                .map(|part| {
                    if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                        json!({ "text": truncate_for_log(text, 200), "textLen": text.len() })
                    } else if let Some(inline_data) = part.get("inlineData") {
                        let mime_type = inline_data
                            .get("mimeType")
                            .and_then(|value| value.as_str())
                            .unwrap_or("unknown");
                        let data_len = inline_data
                            .get("data")
                            .and_then(|value| value.as_str())
                            .map(|value| value.len())
                            .unwrap_or(0);
                        json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
                    } else {
                        json!({ "unknownPart": true })
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    json!({
        "parts": parts,
        "generationConfig": payload.get("generationConfig").cloned().unwrap_or(Value::Null),
    })
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

/// First image part of the first candidate that carries one.
fn extract_first_image(response: &GeminiResponse) -> Option<GeneratedImage> {
    response
        .candidates
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|candidate| candidate.content.as_ref()?.parts.as_ref())
        .flatten()
        .find_map(|part| match part {
            GeminiPart::InlineData { inline_data }
                if inline_data.mime_type.starts_with("image/")
                    && !inline_data.data.trim().is_empty() =>
            {
                Some(GeneratedImage {
                    mime_type: inline_data.mime_type.clone(),
                    base64: inline_data.data.clone(),
                })
            }
            _ => None,
        })
}

fn describe_missing_image(response: &GeminiResponse) -> String {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return format!("Prompt blocked by Gemini ({reason})");
    }

    let candidates = response.candidates.as_deref().unwrap_or_default();
    if candidates.is_empty() {
        return "No image generated in response".to_string();
    }

    let text = candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref()?.parts.as_ref())
        .flatten()
        .find_map(|part| match part {
            GeminiPart::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        });
    let finish_reason = candidates
        .iter()
        .find_map(|candidate| candidate.finish_reason.as_deref());

    match (text, finish_reason) {
        (Some(text), _) => format!(
            "No image data found in response; model replied: {}",
            truncate_for_log(text, 300)
        ),
        (None, Some(reason)) => format!("No image data found in response (finish reason {reason})"),
        (None, None) => "No image data found in response".to_string(),
    }
}

async fn call_generate_content(
    settings: &GeminiSettings,
    payload: &Value,
) -> Result<GeminiResponse, ImageGenerationError> {
    let api_key = settings.api_key.trim();
    if api_key.is_empty() {
        return Err(ImageGenerationError(
            "GEMINI_API_KEY not configured".to_string(),
        ));
    }

    let url = format!(
        "{}/models/{}:generateContent",
        settings.api_base, settings.model
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(target: "llm.gemini", model = %settings.model, payload = %summarize_payload(payload));
    }

    let response = get_http_client()
        .post(&url)
        .header("x-goog-api-key", api_key)
        .timeout(settings.timeout)
        .json(payload)
        .send()
        .await
        .map_err(|err| {
            let err_text = redact_api_key(&err.to_string(), api_key);
            warn!(
                "Gemini request failed to send: {} (timeout={}, connect={})",
                err_text,
                err.is_timeout(),
                err.is_connect()
            );
            ImageGenerationError(format!("Gemini request failed: {err_text}"))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!("Gemini API error: status={}, body={}", status, body_summary);
        let detail = redact_api_key(&message.unwrap_or(body_summary), api_key);
        return Err(ImageGenerationError(format!(
            "Gemini API error ({status}): {detail}"
        )));
    }

    response
        .json::<GeminiResponse>()
        .await
        .map_err(|err| ImageGenerationError(format!("Invalid Gemini response: {err}")))
}

/// Sends the instruction and the user's photo in one best-effort request.
pub async fn generate_transformation_image(
    settings: &GeminiSettings,
    instruction: &str,
    photo: &PhotoPayload,
) -> Result<GeneratedImage, ImageGenerationError> {
    let payload = build_transformation_payload(
        instruction,
        photo,
        &settings.image,
        &settings.safety_profile,
    );
    let metadata = json!({
        "photoBytes": photo.bytes.len(),
        "photoMime": photo.mime_type,
        "instructionChars": instruction.chars().count(),
    });

    log_llm_timing(
        "gemini",
        &settings.model,
        "generate_transformation_image",
        Some(metadata),
        || async {
            let response = call_generate_content(settings, &payload).await?;
            extract_first_image(&response)
                .ok_or_else(|| ImageGenerationError(describe_missing_image(&response)))
        },
    )
    .await
}

/// Local stand-in for the generation API, answering every call with `status` and `body`.
///
/// Requests that do not target `test-model` with the `test-key` header get a 404.
#[cfg(test)]
pub(crate) async fn spawn_gemini_stub(status: axum::http::StatusCode, body: Value) -> String {
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::{Json, Router};

    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap| {
        let body = body.clone();
        async move {
            let authorized = headers
                .get("x-goog-api-key")
                .and_then(|value| value.to_str().ok())
                == Some("test-key");
            if uri.path() != "/models/test-model:generateContent" || !authorized {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": { "message": "unexpected request" } })),
                );
            }
            (status, Json(body))
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[cfg(test)]
pub(crate) fn test_settings(api_base: &str, api_key: &str) -> GeminiSettings {
    GeminiSettings {
        api_base: api_base.to_string(),
        api_key: api_key.to_string(),
        model: "test-model".to_string(),
        timeout: Duration::from_secs(5),
        image: GeminiImageConfig::default(),
        safety_profile: "standard".to_string(),
    }
}
