//! Fake Inference Client - 用于测试与本地演示的推理客户端
//!
//! 不访问网络，返回预设的描述、故事、概念与生成的 WAV 片段

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{
    Concept, InferenceClientPort, InferenceError, WorkflowInput, WorkflowKind, WorkflowOutput,
    WorkflowOutputs,
};
use crate::infrastructure::adapters::transcoder::encode_pcm16_wav;

/// Fake Inference Client 配置
#[derive(Debug, Clone)]
pub struct FakeInferenceClientConfig {
    pub caption: String,
    pub story: String,
    pub concepts: Vec<String>,
    /// 每段合成音频的采样率
    pub sample_rate: u32,
    /// 每段合成音频的帧数
    pub clip_frames: usize,
}

impl Default for FakeInferenceClientConfig {
    fn default() -> Self {
        Self {
            caption: "A dog running on a beach".to_string(),
            story: "The dog ran to the sea! It was happy, and the waves were warm. The end"
                .to_string(),
            concepts: vec![
                "dog".to_string(),
                "no person".to_string(),
                "beach".to_string(),
                "sea water".to_string(),
            ],
            sample_rate: 16000,
            clip_frames: 1600,
        }
    }
}

/// 一次调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: WorkflowKind,
    /// 文本输入原样记录，图片输入记录为 `<image N bytes>`
    pub payload: String,
}

/// Fake Inference Client
pub struct FakeInferenceClient {
    config: FakeInferenceClientConfig,
    /// 语音合成前 N 次调用失败
    fail_first_audio: AtomicUsize,
    /// 这些文本的语音合成总是失败
    failing_segments: HashSet<String>,
    /// 这些工作流总是返回失败状态
    failing_workflows: HashSet<WorkflowKind>,
    /// 语音合成返回非法音频
    corrupt_audio: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeInferenceClient {
    pub fn new(config: FakeInferenceClientConfig) -> Self {
        tracing::info!(
            caption_len = config.caption.len(),
            story_len = config.story.len(),
            concepts = config.concepts.len(),
            "FakeInferenceClient initialized"
        );
        Self {
            config,
            fail_first_audio: AtomicUsize::new(0),
            failing_segments: HashSet::new(),
            failing_workflows: HashSet::new(),
            corrupt_audio: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeInferenceClientConfig::default())
    }

    pub fn with_story(mut self, story: impl Into<String>) -> Self {
        self.config.story = story.into();
        self
    }

    pub fn with_concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    /// 语音合成的前 `times` 次调用失败
    pub fn failing_audio_times(self, times: usize) -> Self {
        self.fail_first_audio.store(times, Ordering::SeqCst);
        self
    }

    /// 指定文本的语音合成总是失败
    pub fn failing_segment(mut self, segment: impl Into<String>) -> Self {
        self.failing_segments.insert(segment.into());
        self
    }

    /// 指定工作流总是失败
    pub fn failing_workflow(mut self, kind: WorkflowKind) -> Self {
        self.failing_workflows.insert(kind);
        self
    }

    /// 语音合成返回无法解码的音频
    pub fn with_corrupt_audio(mut self) -> Self {
        self.corrupt_audio = true;
        self
    }

    /// 已记录的调用
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// 指定工作流的调用次数
    pub fn call_count(&self, kind: WorkflowKind) -> usize {
        self.calls().iter().filter(|c| c.kind == kind).count()
    }

    fn record(&self, kind: WorkflowKind, input: &WorkflowInput) {
        let payload = match input {
            WorkflowInput::Image(bytes) => format!("<image {} bytes>", bytes.len()),
            WorkflowInput::Text(text) => text.clone(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall { kind, payload });
        }
    }

    fn remote_failure(description: &str) -> InferenceError {
        InferenceError::RemoteService {
            code: 99009,
            description: description.to_string(),
        }
    }

    /// 生成一段恒定幅度的 WAV，幅度随文本长度变化以便区分片段
    fn clip_for(&self, text: &str) -> String {
        let amplitude = 500 + (text.len() % 64) as i16 * 100;
        let samples = vec![amplitude; self.config.clip_frames];
        let wav = encode_pcm16_wav(&samples, self.config.sample_rate, 1);
        general_purpose::STANDARD.encode(wav)
    }

    fn synthesize(&self, input: &WorkflowInput) -> Result<WorkflowOutputs, InferenceError> {
        let text = match input {
            WorkflowInput::Text(text) => text,
            WorkflowInput::Image(_) => {
                return Err(Self::remote_failure("text-to-audio expects text input"))
            }
        };

        let remaining = self.fail_first_audio.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first_audio.store(remaining - 1, Ordering::SeqCst);
            return Err(Self::remote_failure("Model is still loading"));
        }

        if self.failing_segments.contains(text) {
            return Err(Self::remote_failure("Failed to synthesize segment"));
        }

        let audio = if self.corrupt_audio {
            general_purpose::STANDARD.encode(b"definitely not a wav stream, just bytes......")
        } else {
            self.clip_for(text)
        };

        Ok(WorkflowOutputs::new(vec![
            WorkflowOutput::text(text.clone()),
            WorkflowOutput::audio(audio),
        ]))
    }
}

#[async_trait]
impl InferenceClientPort for FakeInferenceClient {
    async fn invoke(
        &self,
        kind: WorkflowKind,
        input: WorkflowInput,
    ) -> Result<WorkflowOutputs, InferenceError> {
        self.record(kind, &input);

        tracing::debug!(
            workflow = %kind,
            payload_len = input.len(),
            "FakeInferenceClient: returning canned output"
        );

        if self.failing_workflows.contains(&kind) {
            return Err(Self::remote_failure("Workflow failed"));
        }

        match kind {
            WorkflowKind::ImageToText => Ok(WorkflowOutputs::new(vec![
                WorkflowOutput::concepts(vec![Concept::new("dog", 0.99)]),
                WorkflowOutput::text(self.config.caption.clone()),
            ])),
            WorkflowKind::TextToText => Ok(WorkflowOutputs::new(vec![WorkflowOutput::text(
                self.config.story.clone(),
            )])),
            WorkflowKind::ImageToTags => {
                // 拆成两个 output，验证调用方会展开全部 output
                let mid = self.config.concepts.len() / 2;
                let (first, second) = self.config.concepts.split_at(mid);
                let to_concepts = |names: &[String]| {
                    names
                        .iter()
                        .map(|name| Concept::new(name.clone(), 0.9))
                        .collect::<Vec<_>>()
                };
                Ok(WorkflowOutputs::new(vec![
                    WorkflowOutput::concepts(to_concepts(first)),
                    WorkflowOutput::concepts(to_concepts(second)),
                ]))
            }
            WorkflowKind::TextToAudio => self.synthesize(&input),
        }
    }
}
