//! Segment Synthesizer - 带重试的逐段语音合成
//!
//! 每个片段最多尝试 `max_attempts` 次，失败立即重试（无退避）；
//! 次数耗尽时片段被标记为 [`SynthesisOutcome::Omitted`]，错误不向上传播。

use std::sync::Arc;

use crate::application::ports::InferenceClientPort;
use crate::domain::EncodedAudio;

/// 默认最大尝试次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 单个片段的合成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Synthesized(EncodedAudio),
    /// 重试耗尽，片段不参与拼接
    Omitted { attempts: u32, last_error: String },
}

impl SynthesisOutcome {
    pub fn audio(&self) -> Option<&EncodedAudio> {
        match self {
            SynthesisOutcome::Synthesized(audio) => Some(audio),
            SynthesisOutcome::Omitted { .. } => None,
        }
    }

    pub fn is_omitted(&self) -> bool {
        matches!(self, SynthesisOutcome::Omitted { .. })
    }
}

/// 逐段语音合成器
pub struct SegmentSynthesizer {
    inference: Arc<dyn InferenceClientPort>,
    max_attempts: u32,
}

impl SegmentSynthesizer {
    pub fn new(inference: Arc<dyn InferenceClientPort>, max_attempts: u32) -> Self {
        Self {
            inference,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 合成单个片段
    pub async fn synthesize(&self, segment: &str) -> SynthesisOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.inference.synthesize_speech(segment).await {
                Ok(audio) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Segment synthesized after retry");
                    }
                    return SynthesisOutcome::Synthesized(audio);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        segment_len = segment.len(),
                        error = %e,
                        "Segment synthesis attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            segment_len = segment.len(),
            "Segment omitted from narration"
        );

        SynthesisOutcome::Omitted {
            attempts: self.max_attempts,
            last_error,
        }
    }

    /// 按顺序逐个合成，每个片段对应一个结果
    pub async fn synthesize_all(&self, segments: &[String]) -> Vec<SynthesisOutcome> {
        let mut outcomes = Vec::with_capacity(segments.len());
        for segment in segments {
            outcomes.push(self.synthesize(segment).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::WorkflowKind;
    use crate::infrastructure::adapters::FakeInferenceClient;

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let client = Arc::new(FakeInferenceClient::with_defaults().failing_audio_times(2));
        let synthesizer = SegmentSynthesizer::new(client.clone(), DEFAULT_MAX_ATTEMPTS);

        let outcome = synthesizer.synthesize("Hello there").await;

        assert!(outcome.audio().is_some());
        assert_eq!(client.call_count(WorkflowKind::TextToAudio), 3);
    }

    #[tokio::test]
    async fn test_always_failing_segment_is_omitted() {
        let client = Arc::new(FakeInferenceClient::with_defaults().failing_segment("doomed"));
        let synthesizer = SegmentSynthesizer::new(client.clone(), DEFAULT_MAX_ATTEMPTS);

        let outcome = synthesizer.synthesize("doomed").await;

        match outcome {
            SynthesisOutcome::Omitted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("Failed to synthesize segment"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.call_count(WorkflowKind::TextToAudio), 3);
    }

    #[tokio::test]
    async fn test_three_failures_exhaust_budget() {
        let client = Arc::new(FakeInferenceClient::with_defaults().failing_audio_times(3));
        let synthesizer = SegmentSynthesizer::new(client.clone(), DEFAULT_MAX_ATTEMPTS);

        assert!(synthesizer.synthesize("x").await.is_omitted());
        // 下一个片段从新的预算开始
        assert!(!synthesizer.synthesize("y").await.is_omitted());
    }

    #[tokio::test]
    async fn test_synthesize_all_keeps_order_and_marks_omitted() {
        let client = Arc::new(FakeInferenceClient::with_defaults().failing_segment(" middle"));
        let synthesizer = SegmentSynthesizer::new(client.clone(), DEFAULT_MAX_ATTEMPTS);
        let segments = vec!["first".to_string(), " middle".to_string(), " last".to_string()];

        let outcomes = synthesizer.synthesize_all(&segments).await;

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_omitted());
        assert!(outcomes[1].is_omitted());
        assert!(!outcomes[2].is_omitted());

        let audio_calls: Vec<String> = client
            .calls()
            .into_iter()
            .filter(|c| c.kind == WorkflowKind::TextToAudio)
            .map(|c| c.payload)
            .collect();
        assert_eq!(
            audio_calls,
            vec!["first", " middle", " middle", " middle", " last"]
        );
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let client = Arc::new(FakeInferenceClient::with_defaults());
        assert_eq!(SegmentSynthesizer::new(client, 0).max_attempts(), 1);
    }
}
