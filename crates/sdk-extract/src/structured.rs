//! Structured-source strategy: walk parsed prompt definitions along one
//! fixed schema path.

use serde_json::Value;
use tracing::warn;

use crate::marks::extract_marks;
use crate::model::ExtractionResult;

/// Where the handler block sits inside a document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentShape {
    /// Top-level `handler` block (global intent handlers).
    Global,
    /// Handler blocks nested under `intentEvents[*]` (scene definitions).
    Scene,
}

/// Extract payloads and marks from one YAML document.
///
/// Absent path segments short-circuit to an empty contribution; a document
/// that does not parse yields an empty result and a diagnostic, never an
/// error.
pub fn extract_from_yaml(source_name: &str, text: &str, shape: DocumentShape) -> ExtractionResult {
    let Some(doc) = parse_document(source_name, text) else {
        return ExtractionResult::default();
    };
    let mut out = ExtractionResult::default();
    for handler in handler_blocks(&doc, shape) {
        collect_from_handler(handler, &mut out);
    }
    out
}

fn parse_document(source_name: &str, text: &str) -> Option<Value> {
    let yaml: serde_yaml::Value = match serde_yaml::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(target: "sdk-extract", source = source_name, %err, "skipping unparseable document");
            return None;
        }
    };
    match serde_json::to_value(yaml) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(target: "sdk-extract", source = source_name, %err, "document does not map to json");
            None
        }
    }
}

fn handler_blocks(doc: &Value, shape: DocumentShape) -> Vec<&Value> {
    match shape {
        DocumentShape::Global => doc.get("handler").into_iter().collect(),
        DocumentShape::Scene => doc
            .get("intentEvents")
            .and_then(Value::as_array)
            .map(|events| events.iter().filter_map(|event| event.get("handler")).collect())
            .unwrap_or_default(),
    }
}

fn collect_from_handler(handler: &Value, out: &mut ExtractionResult) {
    let Some(candidates) = handler
        .pointer("/staticPrompt/candidates")
        .and_then(Value::as_array)
    else {
        return;
    };
    for candidate in candidates {
        let Some(response) = candidate.get("promptResponse") else {
            continue;
        };
        if let Some(items) = response.pointer("/canvas/data").and_then(Value::as_array) {
            for item in items {
                if let Ok(text) = serde_json::to_string_pretty(item) {
                    out.data.push(text);
                }
            }
        }
        if let Some(variants) = response
            .pointer("/firstSimple/variants")
            .and_then(Value::as_array)
        {
            for variant in variants {
                if let Some(speech) = variant.get("speech").and_then(Value::as_str) {
                    out.marks.extend(extract_marks(speech));
                }
            }
        }
    }
}
