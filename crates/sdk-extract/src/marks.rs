use once_cell::sync::Lazy;
use regex::Regex;

static MARK_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<mark\s+name=["'](\w+)["']"#).expect("mark tag regex"));

/// Collect every SSML mark name in `text`, in document order.
///
/// Accepts both quote styles; a mark name is a run of word characters.
pub fn extract_marks(text: &str) -> Vec<String> {
    MARK_TAG_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_marks_in_document_order() {
        let speech = r#"<speak>Hi<mark name="one"/> there <mark name='two'/><mark name="three"/></speak>"#;
        assert_eq!(extract_marks(speech), vec!["one", "two", "three"]);
    }

    #[test]
    fn no_tags_yield_empty() {
        assert!(extract_marks("<speak>plain speech</speak>").is_empty());
        assert!(extract_marks("").is_empty());
    }

    #[test]
    fn non_word_names_are_not_captured() {
        assert!(extract_marks(r#"<mark name="two words"/>"#).is_empty());
    }
}
