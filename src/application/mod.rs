//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（InferenceClient、AudioMerger）
//! - services: 跨命令复用的编排逻辑（逐段合成 + 重试）
//! - commands: 命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{GenerateStoryHandler, NarrateStoryHandler},
    GenerateStoryCommand, GenerateStoryResponse, NarrateStoryCommand, NarrateStoryResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // Audio merger
    AudioFormat,
    AudioMergeError,
    AudioMergerPort,
    MergeConfig,
    MergedAudio,
    // Inference client
    Concept,
    InferenceClientPort,
    InferenceError,
    WorkflowInput,
    WorkflowKind,
    WorkflowOutput,
    WorkflowOutputs,
};

pub use services::{SegmentSynthesizer, SynthesisOutcome, DEFAULT_MAX_ATTEMPTS};
