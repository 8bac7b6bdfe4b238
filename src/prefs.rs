//! Session-spanning developer settings.
//!
//! Persisted as JSON under the platform config directory, with the key
//! names the legacy surface used. Absent files and absent keys fall back
//! to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canvasprobe_core_types::UnsupportedApiBehavior;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbePrefs {
    #[serde(rename = "flagDebugExtension")]
    pub debug_extension: bool,
    #[serde(rename = "flagDebugClient")]
    pub debug_client: bool,
    #[serde(rename = "unsupportedApiBehavior")]
    pub unsupported_api_behavior: UnsupportedApiBehavior,
}

/// File-backed preference store.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Store at the platform default, `<config dir>/canvasprobe/prefs.json`.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().context("no config directory on this platform")?;
        Ok(Self::at(base.join("canvasprobe").join("prefs.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences; an absent file yields defaults.
    pub fn load(&self) -> Result<ProbePrefs> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("malformed preferences at {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "canvasprobe", "no preferences file, using defaults");
                Ok(ProbePrefs::default())
            }
            Err(err) => Err(err).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    pub fn save(&self, prefs: &ProbePrefs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))
    }
}
