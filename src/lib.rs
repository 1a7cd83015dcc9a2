//! Storyteller - 图片 → 故事 + 话题标签 + 朗读
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 故事 prompt 组装与句末截断
//! - 话题标签
//! - 朗读分段
//!
//! 应用层 (application/):
//! - Ports: 端口定义（InferenceClient, AudioMerger）
//! - Services: 带重试的逐段语音合成
//! - Commands: 生成故事、朗读故事
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + 静态 Web UI
//! - Adapters: Clarifai 工作流客户端、Fake 客户端、WAV/Opus 拼接
//! - Memory: 推理结果缓存

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
