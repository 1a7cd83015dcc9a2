//! Narration HTTP Handlers

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::NarrateStoryCommand;
use crate::infrastructure::http::dto::{headers, NarrationRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 朗读故事，直接返回音频
pub async fn narrate_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NarrationRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("narration", request_id = %request_id);

    let command = NarrateStoryCommand { story: req.story };
    let result = state
        .narration_handler
        .handle(command)
        .instrument(span)
        .await?;

    let audio = result.audio;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, audio.format.content_type())
        .header(header::CONTENT_LENGTH, audio.data.len())
        .header(headers::SEGMENTS, result.segments)
        .header(headers::OMITTED, result.omitted)
        .header(headers::DURATION_MS, audio.duration_ms)
        .body(Body::from(audio.data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
