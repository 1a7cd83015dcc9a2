//! Story Commands - 故事生成命令

use crate::domain::{HashtagSet, StoryText};

/// 生成故事命令
#[derive(Debug, Clone)]
pub struct GenerateStoryCommand {
    /// 原始图片字节
    pub image: Vec<u8>,
    /// 用户补充的提示
    pub user_prompt: String,
}

/// 生成故事响应
#[derive(Debug, Clone)]
pub struct GenerateStoryResponse {
    pub story: StoryText,
    pub hashtags: HashtagSet,
    /// 故事为空时给用户的提示
    pub notice: Option<&'static str>,
}
