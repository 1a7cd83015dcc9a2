//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::GenerateStoryResponse;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Story DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StoryResponse {
    pub story: String,
    /// 空格分隔的话题标签
    pub hashtags: String,
    pub notice: Option<String>,
}

impl From<GenerateStoryResponse> for StoryResponse {
    fn from(response: GenerateStoryResponse) -> Self {
        Self {
            hashtags: response.hashtags.to_text(),
            story: response.story.into_inner(),
            notice: response.notice.map(str::to_string),
        }
    }
}

// ============================================================================
// Narration DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NarrationRequest {
    pub story: String,
}

/// 朗读响应头
pub mod headers {
    pub const SEGMENTS: &str = "x-narration-segments";
    pub const OMITTED: &str = "x-narration-omitted";
    pub const DURATION_MS: &str = "x-narration-duration-ms";
}
