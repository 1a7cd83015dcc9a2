//! Domain Layer - 领域层
//!
//! 纯函数与值对象，不涉及 I/O:
//! - story: 故事 prompt 组装与句末截断
//! - sentence_splitter: 按标点切分朗读片段
//! - hashtags: 概念标签转话题标签
//! - audio: 单段编码音频

mod audio;
mod hashtags;
mod sentence_splitter;
mod story;

pub use audio::EncodedAudio;
pub use hashtags::{HashtagSet, FILTERED_CONCEPT};
pub use sentence_splitter::{split_segments, SEGMENT_DELIMITERS};
pub use story::{build_story_prompt, truncate_to_sentence_end, StoryText, NOT_INSPIRED_NOTICE};
