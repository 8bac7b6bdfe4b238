//! Fixed traversal pipeline over one project root.

use futures::StreamExt;
use project_store::{DirRef, Node, StoreError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::ExtractError;
use crate::model::{ExtractionResult, ProjectHeader, SdkBundle};
use crate::pattern;
use crate::structured::{self, DocumentShape};

const SETTINGS_PATH: &str = "settings/settings.yaml";
const GLOBAL_PATH: &str = "custom/global";
const SCENES_PATH: &str = "custom/scenes";
const WEBHOOK_PATH: &str = "webhooks/ActionsOnGoogleFulfillment";
const LOGO_REFERENCE_PREFIX: &str = "$resources.images.";

/// Walks a project layout and accumulates header, payloads and marks.
///
/// The pipeline is strictly forward: settings, global handlers, scenes,
/// webhook source. `settings`, `custom/global` and `custom/scenes` are
/// required; the webhook directory is optional and contributes nothing
/// when absent.
pub struct SdkProcessor {
    root: DirRef,
}

impl SdkProcessor {
    pub fn new(root: DirRef) -> Self {
        Self { root }
    }

    pub async fn process(&self) -> Result<SdkBundle, ExtractError> {
        let header = self.read_header().await?;

        let mut extraction = ExtractionResult::default();
        extraction.merge(
            self.structured_pass(GLOBAL_PATH, DocumentShape::Global)
                .await?,
        );
        extraction.merge(
            self.structured_pass(SCENES_PATH, DocumentShape::Scene)
                .await?,
        );
        extraction.merge(self.webhook_pass().await?);

        info!(
            target: "sdk-extract",
            payloads = extraction.data.len(),
            marks = extraction.marks.len(),
            project = %header.project_id,
            "sdk traversal complete"
        );
        Ok(SdkBundle { header, extraction })
    }

    async fn read_header(&self) -> Result<ProjectHeader, ExtractError> {
        let file = self
            .root
            .file(SETTINGS_PATH)
            .await
            .map_err(|err| ExtractError::required(SETTINGS_PATH, err))?;
        let text = file.read_text().await?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|err| ExtractError::MalformedSettings(err.to_string()))?;
        let doc = serde_json::to_value(yaml)
            .map_err(|err| ExtractError::MalformedSettings(err.to_string()))?;

        let project_id = match doc.get("projectId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                warn!(target: "sdk-extract", "settings carry no projectId");
                String::new()
            }
        };
        let title = match doc
            .pointer("/localizedSettings/displayName")
            .and_then(Value::as_str)
        {
            Some(name) => name.to_string(),
            None => {
                warn!(target: "sdk-extract", "settings carry no display name");
                String::new()
            }
        };

        let logo = match doc
            .pointer("/localizedSettings/smallLogoImage")
            .and_then(Value::as_str)
        {
            Some(reference) => self.resolve_logo(reference).await?,
            None => None,
        };

        Ok(ProjectHeader {
            title,
            project_id,
            logo,
        })
    }

    async fn resolve_logo(
        &self,
        reference: &str,
    ) -> Result<Option<project_store::FileRef>, ExtractError> {
        let Some(name) = reference.strip_prefix(LOGO_REFERENCE_PREFIX) else {
            warn!(target: "sdk-extract", reference, "unrecognized logo reference");
            return Ok(None);
        };
        let path = format!("resources/images/{name}.png");
        let file = self
            .root
            .file(&path)
            .await
            .map_err(|err| ExtractError::required(&path, err))?;
        Ok(Some(file))
    }

    async fn structured_pass(
        &self,
        path: &str,
        shape: DocumentShape,
    ) -> Result<ExtractionResult, ExtractError> {
        let dir = self
            .root
            .dir(path)
            .await
            .map_err(|err| ExtractError::required(path, err))?;
        let mut out = ExtractionResult::default();
        let mut entries = dir.entries();
        while let Some(entry) = entries.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(target: "sdk-extract", dir = path, %err, "skipping unreadable entry");
                    continue;
                }
            };
            let Node::File(file) = entry.node else {
                continue;
            };
            match file.read_text().await {
                Ok(text) => out.merge(structured::extract_from_yaml(&entry.name, &text, shape)),
                Err(err) => {
                    warn!(target: "sdk-extract", file = %entry.name, %err, "skipping unreadable file");
                }
            }
        }
        Ok(out)
    }

    async fn webhook_pass(&self) -> Result<ExtractionResult, ExtractError> {
        let dir = match self.root.dir(WEBHOOK_PATH).await {
            Ok(dir) => dir,
            Err(err) if err.is_not_found() => {
                debug!(target: "sdk-extract", "no webhook directory, skipping source scan");
                return Ok(ExtractionResult::default());
            }
            Err(err) => return Err(ExtractError::Store(err)),
        };

        let mut out = ExtractionResult::default();
        let mut entries = dir.entries();
        while let Some(entry) = entries.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(target: "sdk-extract", dir = WEBHOOK_PATH, %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !is_fulfillment_source(&entry.name) {
                continue;
            }
            let Node::File(file) = entry.node else {
                continue;
            };
            match file.read_text().await {
                Ok(text) => out.merge(pattern::extract_from_source(&text)),
                Err(err) => {
                    warn!(target: "sdk-extract", file = %entry.name, %err, "skipping unreadable file");
                }
            }
        }
        Ok(out)
    }
}

fn is_fulfillment_source(name: &str) -> bool {
    name.ends_with(".js") || name.ends_with(".ts")
}
