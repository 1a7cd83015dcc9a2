//! Hashtags - 由图片概念标签生成话题标签

use serde::Serialize;

/// 被过滤掉的概念标签
pub const FILTERED_CONCEPT: &str = "no person";

/// 有序的话题标签集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashtagSet(Vec<String>);

impl HashtagSet {
    /// 从概念名称构建，保持原有顺序
    pub fn from_concepts<I, S>(concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = concepts
            .into_iter()
            .filter(|name| name.as_ref() != FILTERED_CONCEPT)
            .map(|name| format!("#{}", name.as_ref().replace(' ', "_")))
            .collect();
        Self(tags)
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 以单个空格连接的展示文本
    pub fn to_text(&self) -> String {
        self.0.join(" ")
    }
}

impl std::fmt::Display for HashtagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_sentinel_and_keeps_order() {
        let tags = HashtagSet::from_concepts(["person", "no person", "Dog"]);
        assert_eq!(tags.to_text(), "#person #Dog");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_spaces_become_underscores() {
        let tags = HashtagSet::from_concepts(["ice cream", "summer day out"]);
        assert_eq!(tags.tags(), ["#ice_cream", "#summer_day_out"]);
    }

    #[test]
    fn test_only_exact_sentinel_is_filtered() {
        let tags = HashtagSet::from_concepts(["No person", "no person", "no persons"]);
        assert_eq!(tags.to_text(), "#No_person #no_persons");
    }

    #[test]
    fn test_empty_concepts_render_empty_text() {
        let tags = HashtagSet::from_concepts(Vec::<String>::new());
        assert!(tags.is_empty());
        assert_eq!(tags.to_string(), "");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let tags = HashtagSet::from_concepts(["dog", "dog"]);
        assert_eq!(tags.to_text(), "#dog #dog");
    }
}
