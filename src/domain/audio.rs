//! Encoded Audio - 远程服务返回的单段音频

/// base64 编码的 WAV 音频
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio(String);

impl EncodedAudio {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for EncodedAudio {
    fn from(value: String) -> Self {
        Self(value)
    }
}
