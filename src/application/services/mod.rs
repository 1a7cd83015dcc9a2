//! Application Services - 跨命令复用的编排逻辑

mod segment_synthesizer;

pub use segment_synthesizer::{SegmentSynthesizer, SynthesisOutcome, DEFAULT_MAX_ATTEMPTS};
