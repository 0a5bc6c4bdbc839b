use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::fdi::{compose_instruction, score_record, InputForm, ScoreError, ScoreResult};
use crate::llm::{
    decode_photo, generate_transformation_image, GeminiSettings, ImageGenerationError, PhotoError,
    PhotoPayload,
};
use crate::utils::timing::{complete_request_timer, start_request_timer};

pub const GENERATE_ROUTE: &str = "/api/generate";
pub const HEALTH_ROUTE: &str = "/healthz";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdi: Option<ScoreResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Invalid request body: {0}")]
    Body(String),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Generation(#[from] ImageGenerationError),
}

impl GenerateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerateError::Body(_) | GenerateError::Score(_) | GenerateError::Photo(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerateError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn timing_status(&self) -> &'static str {
        match self {
            GenerateError::Body(_) => "invalid_body",
            GenerateError::Score(ScoreError::Validation(_)) => "invalid_input",
            GenerateError::Score(ScoreError::Domain(_)) => "domain_error",
            GenerateError::Photo(_) => "invalid_photo",
            GenerateError::Generation(_) => "generation_failed",
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let body = GenerateResponse {
            error: Some(self.to_string()),
            ..GenerateResponse::default()
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Everything needed for the outbound call, computed without I/O.
#[derive(Debug, Clone)]
pub struct PreparedGeneration {
    pub scores: ScoreResult,
    pub instruction: String,
    pub photo: PhotoPayload,
}

pub fn prepare_generation(
    form: &InputForm,
    max_photo_bytes: usize,
) -> Result<PreparedGeneration, GenerateError> {
    let record = form.validate().map_err(ScoreError::from)?;
    let scores = score_record(&record).map_err(ScoreError::from)?;
    let photo = decode_photo(&record.photo, max_photo_bytes)?;
    let instruction = compose_instruction(&record, &scores);
    Ok(PreparedGeneration {
        scores,
        instruction,
        photo,
    })
}

pub fn router() -> Router {
    router_with(GeminiSettings::from_config())
}

pub fn router_with(settings: GeminiSettings) -> Router {
    Router::new()
        .route(GENERATE_ROUTE, post(generate_handler))
        .route(HEALTH_ROUTE, get(health_handler))
        .layer(DefaultBodyLimit::max(CONFIG.max_request_bytes))
        .with_state(Arc::new(settings))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn run_generation(
    settings: &GeminiSettings,
    payload: Result<Json<InputForm>, JsonRejection>,
) -> Result<GenerateResponse, GenerateError> {
    let Json(form) = payload.map_err(|rejection| GenerateError::Body(rejection.body_text()))?;
    let prepared = prepare_generation(&form, CONFIG.max_photo_bytes)?;
    info!(
        fdi = prepared.scores.composite_score,
        bi = prepared.scores.biological_index,
        ti = prepared.scores.training_index,
        ri = prepared.scores.recovery_index,
        photo_mime = %prepared.photo.mime_type,
        photo_bytes = prepared.photo.bytes.len(),
        "Scored transformation request"
    );

    let image =
        generate_transformation_image(settings, &prepared.instruction, &prepared.photo).await?;
    Ok(GenerateResponse {
        generated_image_base64: Some(image.to_data_uri()),
        fdi: Some(prepared.scores),
        error: None,
    })
}

pub async fn generate_handler(
    State(settings): State<Arc<GeminiSettings>>,
    payload: Result<Json<InputForm>, JsonRejection>,
) -> Response {
    let mut timer = start_request_timer(GENERATE_ROUTE);
    match run_generation(&settings, payload).await {
        Ok(body) => {
            complete_request_timer(&mut timer, "success", None);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            warn!(request_id = timer.request_id(), "Generate request failed: {}", err);
            complete_request_timer(&mut timer, err.timing_status(), Some(err.to_string()));
            err.into_response()
        }
    }
}
