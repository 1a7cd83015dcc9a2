//! 句子分割器
//!
//! 按 `,` `?` `!` 将故事切分为独立合成的片段

/// 片段分隔符
pub const SEGMENT_DELIMITERS: [char; 3] = [',', '?', '!'];

/// 将文本切分为片段
///
/// 分隔符本身被丢弃，片段内的空白原样保留；
/// 相邻分隔符或首尾分隔符会产生空片段，片段数总是分隔符数 + 1
pub fn split_segments(text: &str) -> Vec<String> {
    text.split(&SEGMENT_DELIMITERS[..])
        .map(str::to_string)
        .collect()
}
