//! Story HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::GenerateStoryCommand;
use crate::infrastructure::http::dto::{ApiResponse, StoryResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传图片生成故事
///
/// multipart 字段：`image`（图片文件）、`prompt`（可选的补充提示）
pub async fn generate_story(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<StoryResponse>>, ApiError> {
    let mut image: Option<Vec<u8>> = None;
    let mut prompt = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "image" => {
                let is_image = field
                    .content_type()
                    .map_or(true, |ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(ApiError::BadRequest(
                        "Only image files are allowed".to_string(),
                    ));
                }

                image = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?
                        .to_vec(),
                );
            }
            "prompt" => {
                prompt = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read prompt: {}", e)))?;
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::BadRequest("Image is required".to_string()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("story", request_id = %request_id);

    let command = GenerateStoryCommand {
        image,
        user_prompt: prompt,
    };
    let result = state.story_handler.handle(command).instrument(span).await?;

    Ok(Json(ApiResponse::success(result.into())))
}
