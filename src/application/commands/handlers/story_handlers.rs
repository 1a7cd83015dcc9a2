//! Story Command Handlers

use std::sync::Arc;

use crate::application::commands::story_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::InferenceClientPort;
use crate::domain::{build_story_prompt, HashtagSet, StoryText, NOT_INSPIRED_NOTICE};

/// GenerateStory Handler - 图片 + 提示 → 故事与话题标签
pub struct GenerateStoryHandler {
    inference: Arc<dyn InferenceClientPort>,
}

impl GenerateStoryHandler {
    pub fn new(inference: Arc<dyn InferenceClientPort>) -> Self {
        Self { inference }
    }

    /// 图片描述 → 故事生成 → 截断到句末
    pub async fn image_to_story(
        &self,
        image: &[u8],
        user_prompt: &str,
    ) -> Result<StoryText, ApplicationError> {
        let caption = self.inference.describe_image(image).await?;
        tracing::debug!(caption = %caption, "Image described");

        let prompt = build_story_prompt(&caption, user_prompt);
        let raw = self.inference.generate_text(&prompt).await?;

        let story = StoryText::from_generated(&raw);
        tracing::debug!(
            raw_len = raw.len(),
            story_len = story.as_str().len(),
            "Story generated"
        );

        Ok(story)
    }

    /// 图片标签 → 话题标签
    pub async fn image_to_hashtags(&self, image: &[u8]) -> Result<HashtagSet, ApplicationError> {
        let concepts = self.inference.tag_image(image).await?;
        Ok(HashtagSet::from_concepts(concepts))
    }

    pub async fn handle(
        &self,
        cmd: GenerateStoryCommand,
    ) -> Result<GenerateStoryResponse, ApplicationError> {
        if cmd.image.is_empty() {
            return Err(ApplicationError::validation("Image cannot be empty"));
        }

        let story = self.image_to_story(&cmd.image, &cmd.user_prompt).await?;

        let notice = if story.is_blank() {
            tracing::info!("Story came back blank, returning notice");
            Some(NOT_INSPIRED_NOTICE)
        } else {
            None
        };

        let hashtags = self.image_to_hashtags(&cmd.image).await?;

        tracing::info!(
            image_size = cmd.image.len(),
            story_len = story.as_str().len(),
            hashtags = hashtags.len(),
            "Story request completed"
        );

        Ok(GenerateStoryResponse {
            story,
            hashtags,
            notice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::WorkflowKind;
    use crate::infrastructure::adapters::FakeInferenceClient;

    fn command() -> GenerateStoryCommand {
        GenerateStoryCommand {
            image: vec![0xFF, 0xD8, 0xFF],
            user_prompt: "Make it happy".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generates_truncated_story_and_hashtags() {
        let client = Arc::new(FakeInferenceClient::with_defaults());
        let handler = GenerateStoryHandler::new(client.clone());

        let response = handler.handle(command()).await.unwrap();

        assert_eq!(
            response.story.as_str(),
            "The dog ran to the sea! It was happy, and the waves were warm."
        );
        assert_eq!(response.hashtags.to_text(), "#dog #beach #sea_water");
        assert!(response.notice.is_none());
    }

    #[tokio::test]
    async fn test_prompt_combines_caption_and_user_prompt() {
        let client = Arc::new(FakeInferenceClient::with_defaults());
        let handler = GenerateStoryHandler::new(client.clone());

        handler.handle(command()).await.unwrap();

        let calls = client.calls();
        let kinds: Vec<WorkflowKind> = calls.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WorkflowKind::ImageToText,
                WorkflowKind::TextToText,
                WorkflowKind::ImageToTags
            ]
        );
        assert_eq!(
            calls[1].payload,
            "A dog running on a beach Create a short story. Make it happy."
        );
    }

    #[tokio::test]
    async fn test_blank_story_returns_notice_and_hashtags() {
        let client = Arc::new(FakeInferenceClient::with_defaults().with_story("no ending here"));
        let handler = GenerateStoryHandler::new(client);

        let response = handler.handle(command()).await.unwrap();

        assert!(response.story.is_blank());
        assert_eq!(response.notice, Some(NOT_INSPIRED_NOTICE));
        assert!(!response.hashtags.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let client = Arc::new(
            FakeInferenceClient::with_defaults().failing_workflow(WorkflowKind::ImageToText),
        );
        let handler = GenerateStoryHandler::new(client.clone());

        let err = handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, ApplicationError::RemoteServiceError(_)));
        assert_eq!(client.call_count(WorkflowKind::TextToText), 0);
    }

    #[tokio::test]
    async fn test_hashtag_failure_propagates() {
        let client = Arc::new(
            FakeInferenceClient::with_defaults().failing_workflow(WorkflowKind::ImageToTags),
        );
        let handler = GenerateStoryHandler::new(client);

        assert!(handler.handle(command()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected_before_remote_calls() {
        let client = Arc::new(FakeInferenceClient::with_defaults());
        let handler = GenerateStoryHandler::new(client.clone());

        let err = handler
            .handle(GenerateStoryCommand {
                image: Vec::new(),
                user_prompt: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(client.calls().is_empty());
    }
}
