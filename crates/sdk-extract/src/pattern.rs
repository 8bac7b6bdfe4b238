//! Pattern-source strategy: heuristic regex scan over webhook source text.
//!
//! Known false-negative modes: canvas constructions whose `data` argument is
//! not a literal, and data blocks whose braces nest deeper than the
//! non-greedy capture assumes. Zero matches is a normal outcome, not an
//! error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::marks::extract_marks;
use crate::model::ExtractionResult;

static CANVAS_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)new\s+Canvas\s*\(\s*\{.*?data\s*:\s*(\{.*?\})").expect("canvas literal regex")
});

/// Scan raw source text for canvas-construction literals and mark tags.
///
/// Captured data blocks are kept as source text; they are not re-parsed.
pub fn extract_from_source(text: &str) -> ExtractionResult {
    let mut out = ExtractionResult::default();
    for caps in CANVAS_LITERAL_RE.captures_iter(text) {
        out.data.push(caps[1].trim().to_string());
    }
    out.marks = extract_marks(text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_literal_data_blocks_and_marks() {
        let source = r#"
app.handle('welcome', (conv) => {
  conv.add(new Canvas({ data: { command: "WELCOME", lives: 5 } }));
  conv.add('<speak>Hi<mark name="greeting"/></speak>');
});
"#;
        let result = extract_from_source(source);
        assert_eq!(result.data, vec![r#"{ command: "WELCOME", lives: 5 }"#]);
        assert_eq!(result.marks, vec!["greeting"]);
    }

    #[test]
    fn every_construction_site_is_scanned() {
        let source = r#"
conv.add(new Canvas({ data: { a: 1 } }));
conv.add(new Canvas({
  data: { b: 2 },
  suppressMic: true,
}));
"#;
        let result = extract_from_source(source);
        assert_eq!(result.data, vec!["{ a: 1 }", "{ b: 2 }"]);
    }

    #[test]
    fn non_literal_or_absent_constructions_yield_empty() {
        let none = extract_from_source("const x = render(state);");
        assert!(none.data.is_empty());

        let unbalanced = extract_from_source("conv.add(new Canvas({ data: state }));");
        assert!(unbalanced.data.is_empty());
    }

    #[test]
    fn nested_braces_truncate_rather_than_fail() {
        let source = r#"conv.add(new Canvas({ data: { outer: { inner: 1 } } }));"#;
        let result = extract_from_source(source);
        // Heuristic limitation: the capture stops at the first closing brace.
        assert_eq!(result.data, vec!["{ outer: { inner: 1 }"]);
    }
}
