//! Inference Client Port - 远程推理工作流抽象
//!
//! 定义调用外部 workflow 推理服务的抽象接口，具体实现在 infrastructure/adapters 层。
//!
//! 响应约定（供应商的输出顺序假设，集中在 [`WorkflowOutputs`] 中）：
//! - 单结果工作流（文本、音频）取最后一个 output
//! - 打标签工作流展开所有 output 的 concepts

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::EncodedAudio;

/// 推理错误
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    /// 服务返回非成功状态
    #[error("Post workflow results failed, status: {description} (code {code})")]
    RemoteService { code: u32, description: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 固定的四种工作流
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    ImageToText,
    TextToText,
    ImageToTags,
    TextToAudio,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::ImageToText => "image-to-text",
            WorkflowKind::TextToText => "text-to-text",
            WorkflowKind::ImageToTags => "image-to-tags",
            WorkflowKind::TextToAudio => "text-to-audio",
        }
    }
}

impl std::fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 工作流输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowInput {
    Image(Vec<u8>),
    Text(String),
}

impl WorkflowInput {
    /// 输入负载的字节数（用于日志）
    pub fn len(&self) -> usize {
        match self {
            WorkflowInput::Image(bytes) => bytes.len(),
            WorkflowInput::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            WorkflowInput::Image(bytes) => bytes,
            WorkflowInput::Text(text) => text.as_bytes(),
        }
    }
}

/// 概念（标签 + 置信度）
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub name: String,
    pub value: f32,
}

impl Concept {
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 工作流中单个模型的输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowOutput {
    pub model_id: Option<String>,
    pub text: Option<String>,
    /// base64 编码音频
    pub audio: Option<String>,
    pub concepts: Vec<Concept>,
}

impl WorkflowOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn audio(base64: impl Into<String>) -> Self {
        Self {
            audio: Some(base64.into()),
            ..Default::default()
        }
    }

    pub fn concepts(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            ..Default::default()
        }
    }
}

/// 一次工作流调用的有序输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowOutputs(Vec<WorkflowOutput>);

impl WorkflowOutputs {
    pub fn new(outputs: Vec<WorkflowOutput>) -> Self {
        Self(outputs)
    }

    pub fn as_slice(&self) -> &[WorkflowOutput] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn last(&self) -> Result<&WorkflowOutput, InferenceError> {
        self.0
            .last()
            .ok_or_else(|| InferenceError::InvalidResponse("Workflow returned no outputs".to_string()))
    }

    /// 最后一个 output 的文本
    pub fn final_text(&self) -> Result<String, InferenceError> {
        self.last()?
            .text
            .clone()
            .ok_or_else(|| InferenceError::InvalidResponse("Final output has no text".to_string()))
    }

    /// 最后一个 output 的音频
    pub fn final_audio(&self) -> Result<EncodedAudio, InferenceError> {
        self.last()?
            .audio
            .clone()
            .map(EncodedAudio::new)
            .ok_or_else(|| InferenceError::InvalidResponse("Final output has no audio".to_string()))
    }

    /// 所有 output 的概念名称，按出现顺序展开
    pub fn concept_names(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|output| output.concepts.iter().map(|c| c.name.clone()))
            .collect()
    }
}

impl From<Vec<WorkflowOutput>> for WorkflowOutputs {
    fn from(outputs: Vec<WorkflowOutput>) -> Self {
        Self(outputs)
    }
}

/// Inference Client Port
///
/// 外部推理服务的抽象接口。客户端自身从不重试。
#[async_trait]
pub trait InferenceClientPort: Send + Sync {
    /// 调用一个工作流，返回全部输出
    async fn invoke(
        &self,
        kind: WorkflowKind,
        input: WorkflowInput,
    ) -> Result<WorkflowOutputs, InferenceError>;

    /// 图片 → 描述文本
    async fn describe_image(&self, image: &[u8]) -> Result<String, InferenceError> {
        self.invoke(WorkflowKind::ImageToText, WorkflowInput::Image(image.to_vec()))
            .await?
            .final_text()
    }

    /// 文本 → 文本
    async fn generate_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.invoke(WorkflowKind::TextToText, WorkflowInput::Text(prompt.to_string()))
            .await?
            .final_text()
    }

    /// 图片 → 概念名称
    async fn tag_image(&self, image: &[u8]) -> Result<Vec<String>, InferenceError> {
        Ok(self
            .invoke(WorkflowKind::ImageToTags, WorkflowInput::Image(image.to_vec()))
            .await?
            .concept_names())
    }

    /// 文本 → 语音
    async fn synthesize_speech(&self, text: &str) -> Result<EncodedAudio, InferenceError> {
        self.invoke(WorkflowKind::TextToAudio, WorkflowInput::Text(text.to_string()))
            .await?
            .final_audio()
    }
}
