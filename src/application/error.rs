//! 应用层错误定义
//!
//! 统一的命令错误类型

use thiserror::Error;

use crate::application::ports::{AudioMergeError, InferenceError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 远程推理服务错误
    #[error("Remote service error: {0}")]
    RemoteServiceError(String),

    /// 音频无法解码
    #[error("Audio decode error: {0}")]
    AudioDecodeError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<InferenceError> for ApplicationError {
    fn from(err: InferenceError) -> Self {
        Self::RemoteServiceError(err.to_string())
    }
}

impl From<AudioMergeError> for ApplicationError {
    fn from(err: AudioMergeError) -> Self {
        if err.is_decode_error() {
            Self::AudioDecodeError(err.to_string())
        } else {
            Self::InternalError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_maps_to_remote() {
        let err: ApplicationError = InferenceError::Timeout.into();
        assert!(matches!(err, ApplicationError::RemoteServiceError(_)));
    }

    #[test]
    fn test_merge_error_mapping() {
        let err: ApplicationError = AudioMergeError::InvalidWav("bad".into()).into();
        assert!(matches!(err, ApplicationError::AudioDecodeError(_)));

        let err: ApplicationError = AudioMergeError::EncodingError("opus".into()).into();
        assert!(matches!(err, ApplicationError::InternalError(_)));
    }
}
