//! Application State
//!
//! HTTP 层共享的命令处理器

use crate::application::{GenerateStoryHandler, NarrateStoryHandler};

/// 应用状态
pub struct AppState {
    pub story_handler: GenerateStoryHandler,
    pub narration_handler: NarrateStoryHandler,
}

impl AppState {
    pub fn new(story_handler: GenerateStoryHandler, narration_handler: NarrateStoryHandler) -> Self {
        Self {
            story_handler,
            narration_handler,
        }
    }
}
