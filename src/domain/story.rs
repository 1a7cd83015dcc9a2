//! Story Text - 故事文本的组装与截断

use serde::Serialize;

/// 故事为空时展示给用户的提示
pub const NOT_INSPIRED_NOTICE: &str = "Mighty AI was not inspired to write a story for this image with the particular parameters. Maybe try something else?";

/// 固定的故事生成指令，拼接在图片描述与用户输入之间
const STORY_INSTRUCTION: &str = "Create a short story.";

/// 截断后的故事文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoryText(String);

impl StoryText {
    /// 从模型生成的原始文本构建故事
    ///
    /// 先追加一个空格，再截断到句末标点
    pub fn from_generated(raw: &str) -> Self {
        let padded = format!("{} ", raw);
        Self(truncate_to_sentence_end(&padded).to_string())
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// 去除空白后是否为空
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for StoryText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 构建发送给文本生成工作流的 prompt
pub fn build_story_prompt(caption: &str, user_prompt: &str) -> String {
    format!("{} {} {}.", caption, STORY_INSTRUCTION, user_prompt)
}

/// 截断到句末标点
///
/// 切点取 `.` 的最后出现位置、`?` 与 `!` 的首次出现位置（各自 +1，缺失记为 0）三者的最大值。
/// 当 `?`/`!` 出现在最后一个 `.` 之前时结果与"最后一个终止符"一致；
/// 三者都缺失时返回空串。
pub fn truncate_to_sentence_end(text: &str) -> &str {
    let dot = text.rfind('.').map_or(0, |i| i + 1);
    let question = text.find('?').map_or(0, |i| i + 1);
    let exclamation = text.find('!').map_or(0, |i| i + 1);

    let cut = dot.max(question).max(exclamation);
    &text[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_single_sentence() {
        assert_eq!(truncate_to_sentence_end("Hello world. "), "Hello world.");
    }

    #[test]
    fn test_truncate_keeps_trailing_dot_sentence() {
        assert_eq!(truncate_to_sentence_end("Hi! Bye."), "Hi! Bye.");
    }

    #[test]
    fn test_truncate_exclamation_without_dot() {
        assert_eq!(truncate_to_sentence_end("Wow! great"), "Wow!");
    }

    #[test]
    fn test_truncate_drops_unfinished_tail() {
        assert_eq!(
            truncate_to_sentence_end("One. Two. Three and"),
            "One. Two."
        );
    }

    #[test]
    fn test_truncate_uses_first_question_mark() {
        // `?` 使用首次出现位置，第二个问号之后的内容被截掉
        assert_eq!(truncate_to_sentence_end("Why? How? then"), "Why?");
    }

    #[test]
    fn test_truncate_without_terminator_is_empty() {
        assert_eq!(truncate_to_sentence_end("no terminator here"), "");
    }

    #[test]
    fn test_truncate_multibyte_text() {
        assert_eq!(truncate_to_sentence_end("Café au lait. Très"), "Café au lait.");
    }

    #[test]
    fn test_from_generated_appends_space_before_cut() {
        let story = StoryText::from_generated("Once upon a time.");
        assert_eq!(story.as_str(), "Once upon a time.");
        assert!(!story.is_blank());
    }

    #[test]
    fn test_from_generated_blank_when_no_terminator() {
        let story = StoryText::from_generated("   ");
        assert!(story.is_blank());
    }

    #[test]
    fn test_build_story_prompt() {
        assert_eq!(
            build_story_prompt("A dog on a beach", "Make it funny"),
            "A dog on a beach Create a short story. Make it funny."
        );
    }
}
