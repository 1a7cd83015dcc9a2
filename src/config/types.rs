//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::{AudioFormat, MergeConfig, WorkflowKind};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// Clarifai 推理服务配置
    #[serde(default)]
    pub clarifai: ClarifaiConfig,

    /// 朗读配置
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 推理结果缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传图片最大大小（字节）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// 静态文件服务配置（Web UI）
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_max_upload_size() -> usize {
    20 * 1024 * 1024 // 20 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Clarifai 推理服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ClarifaiConfig {
    /// API 基础 URL
    #[serde(default = "default_clarifai_url")]
    pub base_url: String,

    /// 用户 ID
    #[serde(default)]
    pub user_id: String,

    /// 应用 ID
    #[serde(default)]
    pub app_id: String,

    /// Personal Access Token
    #[serde(default)]
    pub pat: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_clarifai_timeout")]
    pub timeout_secs: u64,

    /// 工作流 ID
    #[serde(default)]
    pub workflows: WorkflowIds,
}

fn default_clarifai_url() -> String {
    "https://api.clarifai.com".to_string()
}

fn default_clarifai_timeout() -> u64 {
    120
}

impl Default for ClarifaiConfig {
    fn default() -> Self {
        Self {
            base_url: default_clarifai_url(),
            user_id: String::new(),
            app_id: String::new(),
            pat: None,
            timeout_secs: default_clarifai_timeout(),
            workflows: WorkflowIds::default(),
        }
    }
}

/// 四个工作流在供应商侧的 ID
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowIds {
    #[serde(default = "default_image_to_text")]
    pub image_to_text: String,
    #[serde(default = "default_text_to_text")]
    pub text_to_text: String,
    #[serde(default = "default_image_to_tags")]
    pub image_to_tags: String,
    #[serde(default = "default_text_to_audio")]
    pub text_to_audio: String,
}

fn default_image_to_text() -> String {
    WorkflowKind::ImageToText.as_str().to_string()
}

fn default_text_to_text() -> String {
    WorkflowKind::TextToText.as_str().to_string()
}

fn default_image_to_tags() -> String {
    WorkflowKind::ImageToTags.as_str().to_string()
}

fn default_text_to_audio() -> String {
    WorkflowKind::TextToAudio.as_str().to_string()
}

impl Default for WorkflowIds {
    fn default() -> Self {
        Self {
            image_to_text: default_image_to_text(),
            text_to_text: default_text_to_text(),
            image_to_tags: default_image_to_tags(),
            text_to_audio: default_text_to_audio(),
        }
    }
}

impl WorkflowIds {
    pub fn id_for(&self, kind: WorkflowKind) -> &str {
        match kind {
            WorkflowKind::ImageToText => &self.image_to_text,
            WorkflowKind::TextToText => &self.text_to_text,
            WorkflowKind::ImageToTags => &self.image_to_tags,
            WorkflowKind::TextToAudio => &self.text_to_audio,
        }
    }
}

/// 朗读配置
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 每个片段的最大合成尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 输出格式
    /// 可选: wav, opus
    #[serde(default)]
    pub output_format: AudioFormat,

    /// 目标比特率（bps），仅用于 Opus
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_bitrate() -> u32 {
    32000
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            output_format: AudioFormat::Wav,
            bitrate: default_bitrate(),
        }
    }
}

impl NarrationConfig {
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            format: self.output_format,
            bitrate: self.bitrate,
        }
    }
}

/// 推理结果缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// 最大条目数
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    /// 条目过期时间（秒）
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    256
}

fn default_cache_ttl() -> u64 {
    3600 // 1 小时
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_cache_max_entries(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.clarifai.base_url, "https://api.clarifai.com");
        assert_eq!(config.narration.max_attempts, 3);
        assert_eq!(config.narration.output_format, AudioFormat::Wav);
        assert!(config.clarifai.pat.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8501");
    }

    #[test]
    fn test_workflow_ids() {
        let ids = WorkflowIds::default();
        assert_eq!(ids.id_for(WorkflowKind::ImageToText), "image-to-text");
        assert_eq!(ids.id_for(WorkflowKind::TextToAudio), "text-to-audio");
    }

    #[test]
    fn test_merge_config_from_narration() {
        let narration = NarrationConfig {
            output_format: AudioFormat::Opus,
            bitrate: 24000,
            ..Default::default()
        };
        let merge = narration.merge_config();
        assert_eq!(merge.format, AudioFormat::Opus);
        assert_eq!(merge.bitrate, 24000);
    }
}
