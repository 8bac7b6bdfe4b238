use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type carried across the CanvasProbe crates.
#[derive(Debug, Error, Clone)]
pub enum ProbeError {
    #[error("{message}")]
    Message { message: String },
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifier of an inspectable browser tab.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TabId(pub Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one probe session (one transport decision lives this long).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProbeSessionId(pub String);

impl ProbeSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ProbeSessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What the target page should do when it sees a call the host API does not
/// support.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedApiBehavior {
    #[default]
    Off,
    Warn,
    Error,
}

impl UnsupportedApiBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UnsupportedApiBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnsupportedApiBehavior {
    type Err = ProbeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ProbeError::new(format!(
                "unknown unsupported-api behavior: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_round_trips_through_serde() {
        for (mode, wire) in [
            (UnsupportedApiBehavior::Off, "\"off\""),
            (UnsupportedApiBehavior::Warn, "\"warn\""),
            (UnsupportedApiBehavior::Error, "\"error\""),
        ] {
            assert_eq!(serde_json::to_string(&mode).unwrap(), wire);
            let back: UnsupportedApiBehavior = serde_json::from_str(wire).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn behavior_parses_from_str() {
        assert_eq!(
            "Warn".parse::<UnsupportedApiBehavior>().unwrap(),
            UnsupportedApiBehavior::Warn
        );
        assert!("loud".parse::<UnsupportedApiBehavior>().is_err());
    }
}
