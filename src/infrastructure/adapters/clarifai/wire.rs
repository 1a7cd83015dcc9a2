//! Clarifai Wire Types - PostWorkflowResults 的 JSON 请求与响应结构

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    Concept, InferenceError, WorkflowInput, WorkflowOutput, WorkflowOutputs,
};

/// 成功状态码
pub const STATUS_SUCCESS: u32 = 10000;

#[derive(Debug, Serialize)]
pub struct PostWorkflowResultsRequest {
    pub inputs: Vec<Input>,
}

impl PostWorkflowResultsRequest {
    /// 单输入请求
    pub fn single(input: &WorkflowInput) -> Self {
        let data = match input {
            WorkflowInput::Image(bytes) => InputData {
                image: Some(ImagePayload {
                    base64: general_purpose::STANDARD.encode(bytes),
                }),
                text: None,
            },
            WorkflowInput::Text(raw) => InputData {
                image: None,
                text: Some(TextPayload { raw: raw.clone() }),
            },
        };
        Self {
            inputs: vec![Input { data }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Input {
    pub data: InputData,
}

#[derive(Debug, Serialize)]
pub struct InputData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextPayload>,
}

#[derive(Debug, Serialize)]
pub struct ImagePayload {
    pub base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Deserialize)]
pub struct PostWorkflowResultsResponse {
    pub status: Status,
    #[serde(default)]
    pub results: Vec<WorkflowResult>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub code: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowResult {
    #[serde(default)]
    pub outputs: Vec<Output>,
}

#[derive(Debug, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub model: Option<Model>,
    #[serde(default)]
    pub data: Option<OutputData>,
}

#[derive(Debug, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputData {
    #[serde(default)]
    pub text: Option<TextPayload>,
    #[serde(default)]
    pub audio: Option<AudioPayload>,
    #[serde(default)]
    pub concepts: Vec<ConceptPayload>,
}

#[derive(Debug, Deserialize)]
pub struct AudioPayload {
    #[serde(default)]
    pub base64: String,
}

#[derive(Debug, Deserialize)]
pub struct ConceptPayload {
    pub name: String,
    #[serde(default)]
    pub value: f32,
}

impl PostWorkflowResultsResponse {
    /// 检查状态并取出第一个 workflow result 的输出
    ///
    /// 每次请求只有一个输入，因此只有一个 result
    pub fn into_outputs(self) -> Result<WorkflowOutputs, InferenceError> {
        if self.status.code != STATUS_SUCCESS {
            let description = match self.status.details {
                Some(details) if !details.is_empty() => {
                    format!("{} ({})", self.status.description, details)
                }
                _ => self.status.description,
            };
            return Err(InferenceError::RemoteService {
                code: self.status.code,
                description,
            });
        }

        let result = self.results.into_iter().next().ok_or_else(|| {
            InferenceError::InvalidResponse("Response contains no workflow results".to_string())
        })?;

        let outputs = result
            .outputs
            .into_iter()
            .map(|output| {
                let data = output.data.unwrap_or_default();
                WorkflowOutput {
                    model_id: output.model.map(|m| m.id),
                    text: data.text.map(|t| t.raw),
                    audio: data.audio.map(|a| a.base64),
                    concepts: data
                        .concepts
                        .into_iter()
                        .map(|c| Concept::new(c.name, c.value))
                        .collect(),
                }
            })
            .collect();

        Ok(WorkflowOutputs::new(outputs))
    }
}
