//! Narration Command Handlers

use std::sync::Arc;

use crate::application::commands::narration_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioMergerPort, MergeConfig};
use crate::application::services::SegmentSynthesizer;
use crate::domain::{split_segments, EncodedAudio};

/// NarrateStory Handler - 故事 → 分段合成 → 拼接
pub struct NarrateStoryHandler {
    synthesizer: SegmentSynthesizer,
    merger: Arc<dyn AudioMergerPort>,
    merge_config: MergeConfig,
}

impl NarrateStoryHandler {
    pub fn new(
        synthesizer: SegmentSynthesizer,
        merger: Arc<dyn AudioMergerPort>,
        merge_config: MergeConfig,
    ) -> Self {
        Self {
            synthesizer,
            merger,
            merge_config,
        }
    }

    /// 切分 → 逐段合成 → 按顺序拼接
    ///
    /// 被省略的片段不参与拼接；任一片段无法解码时整体失败
    pub async fn story_to_audio(
        &self,
        story: &str,
    ) -> Result<NarrateStoryResponse, ApplicationError> {
        let segments = split_segments(story);
        let outcomes = self.synthesizer.synthesize_all(&segments).await;

        let clips: Vec<EncodedAudio> = outcomes
            .iter()
            .filter_map(|outcome| outcome.audio().cloned())
            .collect();
        let omitted = outcomes.len() - clips.len();

        let merger = self.merger.clone();
        let config = self.merge_config.clone();
        // 解码与编码是 CPU 密集操作
        let audio = tokio::task::spawn_blocking(move || merger.merge(&clips, &config))
            .await
            .map_err(|e| ApplicationError::internal(format!("Merge task failed: {}", e)))??;

        tracing::info!(
            segments = segments.len(),
            omitted,
            duration_ms = audio.duration_ms,
            format = %audio.format,
            "Narration completed"
        );

        Ok(NarrateStoryResponse {
            audio,
            segments: segments.len(),
            omitted,
        })
    }

    pub async fn handle(
        &self,
        cmd: NarrateStoryCommand,
    ) -> Result<NarrateStoryResponse, ApplicationError> {
        if cmd.story.trim().is_empty() {
            return Err(ApplicationError::validation("Story cannot be empty"));
        }

        self.story_to_audio(&cmd.story).await
    }
}
