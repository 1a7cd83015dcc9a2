//! Narration Commands - 故事朗读命令

use crate::application::ports::MergedAudio;

/// 朗读故事命令
#[derive(Debug, Clone)]
pub struct NarrateStoryCommand {
    pub story: String,
}

/// 朗读故事响应
#[derive(Debug, Clone)]
pub struct NarrateStoryResponse {
    pub audio: MergedAudio,
    /// 切分出的片段数
    pub segments: usize,
    /// 重试耗尽被省略的片段数
    pub omitted: usize,
}
