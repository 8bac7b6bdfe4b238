use canvasprobe_core_types::ProbeError;
use project_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("required entry missing: {0}")]
    Required(String),
    #[error("settings malformed: {0}")]
    MalformedSettings(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ExtractError {
    /// Map a resolution failure on a path the layout requires. `NotFound`
    /// becomes [`ExtractError::Required`]; everything else passes through.
    pub(crate) fn required(path: &str, err: StoreError) -> Self {
        if err.is_not_found() {
            return Self::Required(path.to_string());
        }
        Self::Store(err)
    }
}

impl From<ExtractError> for ProbeError {
    fn from(value: ExtractError) -> Self {
        ProbeError::new(value.to_string())
    }
}
