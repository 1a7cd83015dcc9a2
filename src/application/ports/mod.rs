//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_merger;
mod inference_client;

pub use audio_merger::{AudioFormat, AudioMergeError, AudioMergerPort, MergeConfig, MergedAudio};
pub use inference_client::{
    Concept, InferenceClientPort, InferenceError, WorkflowInput, WorkflowKind, WorkflowOutput,
    WorkflowOutputs,
};
