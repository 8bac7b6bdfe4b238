use canvasprobe_core_types::ProbeError;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    #[error("no inspectable target: {0}")]
    TransportUnavailable(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("sdk load failed: {0}")]
    SdkLoad(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value.to_string())
    }
}

impl From<BridgeError> for ProbeError {
    fn from(value: BridgeError) -> Self {
        ProbeError::new(value.to_string())
    }
}
