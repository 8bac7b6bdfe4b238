use std::fmt;

use project_store::FileRef;
use serde::{Deserialize, Serialize};

/// Aggregate of discoveries from one traversal pass.
///
/// Entries are always strings: payloads stay as JSON text because the
/// consumer may re-edit them before injection, marks are bare names.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub data: Vec<String>,
    pub marks: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.marks.is_empty()
    }

    /// Append another pass's discoveries, preserving accumulation order.
    pub fn merge(&mut self, other: ExtractionResult) {
        self.data.extend(other.data);
        self.marks.extend(other.marks);
    }
}

/// Display metadata resolved from a project's settings document.
#[derive(Clone)]
pub struct ProjectHeader {
    pub title: String,
    pub project_id: String,
    pub logo: Option<FileRef>,
}

impl fmt::Debug for ProjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectHeader")
            .field("title", &self.title)
            .field("project_id", &self.project_id)
            .field("logo", &self.logo.as_ref().map(|file| file.name().to_string()))
            .finish()
    }
}

/// Everything one SDK traversal publishes.
#[derive(Clone, Debug)]
pub struct SdkBundle {
    pub header: ProjectHeader,
    pub extraction: ExtractionResult,
}
