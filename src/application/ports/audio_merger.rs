//! Audio Merger Port - 音频拼接抽象
//!
//! 将多段 base64 编码的 WAV 按顺序拼接为一条音频流，并导出为指定容器格式

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EncodedAudio;

/// 拼接错误
#[derive(Debug, Error)]
pub enum AudioMergeError {
    #[error("Invalid base64 audio: {0}")]
    InvalidBase64(String),

    #[error("Invalid WAV: {0}")]
    InvalidWav(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl AudioMergeError {
    /// 是否为输入音频无法解码导致的错误
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            AudioMergeError::InvalidBase64(_)
                | AudioMergeError::InvalidWav(_)
                | AudioMergeError::DecodingError(_)
        )
    }
}

/// 音频输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 16 位 PCM WAV
    #[default]
    Wav,
    /// Opus (OGG 容器)
    Opus,
}

impl AudioFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Opus => "audio/ogg",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Wav => write!(f, "wav"),
            AudioFormat::Opus => write!(f, "opus"),
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = AudioMergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "opus" => Ok(AudioFormat::Opus),
            _ => Err(AudioMergeError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 导出配置
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub format: AudioFormat,
    /// 目标比特率（bps），仅用于 Opus
    pub bitrate: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::Wav,
            bitrate: 32000, // 32kbps，语音足够
        }
    }
}

/// 拼接后的音频
#[derive(Debug, Clone)]
pub struct MergedAudio {
    /// 导出后的音频数据
    pub data: Vec<u8>,
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub channels: u8,
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 参与拼接的片段数
    pub clip_count: usize,
}

/// Audio Merger Port
pub trait AudioMergerPort: Send + Sync {
    /// 按顺序拼接音频片段
    ///
    /// 任一片段无法解码时整体失败
    fn merge(
        &self,
        clips: &[EncodedAudio],
        config: &MergeConfig,
    ) -> Result<MergedAudio, AudioMergeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("WAV".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("opus".parse::<AudioFormat>().unwrap(), AudioFormat::Opus);
        assert!("mp3".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_decode_error_classification() {
        assert!(AudioMergeError::InvalidBase64("x".into()).is_decode_error());
        assert!(AudioMergeError::InvalidWav("x".into()).is_decode_error());
        assert!(!AudioMergeError::EncodingError("x".into()).is_decode_error());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(AudioFormat::Wav.content_type(), "audio/wav");
        assert_eq!(AudioFormat::Opus.content_type(), "audio/ogg");
    }
}
