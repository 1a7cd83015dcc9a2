//! Transcoder Adapter - 音频拼接与导出

mod wav_merger;

pub use wav_merger::{encode_pcm16_wav, WavMerger, EMPTY_TIMELINE_SAMPLE_RATE};
