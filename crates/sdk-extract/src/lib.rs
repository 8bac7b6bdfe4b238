//! Best-effort discovery of canvas payloads and SSML marks inside an
//! Actions SDK project tree.
//!
//! Two independent strategies feed one accumulator: a structured walk over
//! parsed YAML prompt definitions, and a regex scan over webhook source.
//! Neither is a parser for its input language; both are documented
//! heuristics that prefer partial results over failure.

pub mod errors;
pub mod marks;
pub mod model;
pub mod pattern;
pub mod processor;
pub mod structured;

pub use errors::ExtractError;
pub use marks::extract_marks;
pub use model::{ExtractionResult, ProjectHeader, SdkBundle};
pub use processor::SdkProcessor;
pub use structured::DocumentShape;
