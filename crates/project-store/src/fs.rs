//! Local filesystem backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::api::{DirEntry, DirRef, DirectoryHandle, EntryStream, FileHandle, FileRef, Node};
use crate::errors::StoreError;

/// Directory handle backed by `tokio::fs`.
pub struct FsDirectory {
    path: PathBuf,
    name: String,
}

impl FsDirectory {
    /// Open a directory handle. Fails when the path is absent or not a
    /// directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<DirRef, StoreError> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|err| StoreError::io(path.display().to_string(), err))?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory(path.display().to_string()));
        }
        Ok(Arc::new(Self::from_path(path)))
    }

    fn from_path(path: PathBuf) -> Self {
        let name = segment_name(&path);
        Self { path, name }
    }

    fn child_path(&self, relative: &str) -> PathBuf {
        let mut path = self.path.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}

fn segment_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

enum Cursor {
    Start(PathBuf),
    Reading(tokio::fs::ReadDir),
}

#[async_trait]
impl DirectoryHandle for FsDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> EntryStream {
        let root = self.path.clone();
        futures::stream::try_unfold(Cursor::Start(root), |cursor| async move {
            let mut reader = match cursor {
                Cursor::Start(path) => tokio::fs::read_dir(&path)
                    .await
                    .map_err(|err| StoreError::io(path.display().to_string(), err))?,
                Cursor::Reading(reader) => reader,
            };
            loop {
                let next = reader
                    .next_entry()
                    .await
                    .map_err(|err| StoreError::io("<read_dir>", err))?;
                let Some(entry) = next else {
                    return Ok(None);
                };
                let path = entry.path();
                let kind = entry
                    .file_type()
                    .await
                    .map_err(|err| StoreError::io(path.display().to_string(), err))?;
                let node = if kind.is_dir() {
                    Node::Directory(Arc::new(FsDirectory::from_path(path)))
                } else if kind.is_file() {
                    Node::File(Arc::new(FsFile::from_path(path)))
                } else {
                    debug!(target: "project-store", path = %path.display(), "skipping non-regular entry");
                    continue;
                };
                let name = entry.file_name().to_string_lossy().into_owned();
                return Ok(Some((DirEntry { name, node }, Cursor::Reading(reader))));
            }
        })
        .boxed()
    }

    async fn dir(&self, path: &str) -> Result<DirRef, StoreError> {
        let target = self.child_path(path);
        let meta = tokio::fs::metadata(&target)
            .await
            .map_err(|err| StoreError::io(target.display().to_string(), err))?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory(target.display().to_string()));
        }
        Ok(Arc::new(Self::from_path(target)))
    }

    async fn file(&self, path: &str) -> Result<FileRef, StoreError> {
        let target = self.child_path(path);
        let meta = tokio::fs::metadata(&target)
            .await
            .map_err(|err| StoreError::io(target.display().to_string(), err))?;
        if !meta.is_file() {
            return Err(StoreError::NotAFile(target.display().to_string()));
        }
        Ok(Arc::new(FsFile::from_path(target)))
    }
}

/// File handle backed by `tokio::fs`.
pub struct FsFile {
    path: PathBuf,
    name: String,
}

impl FsFile {
    fn from_path(path: PathBuf) -> Self {
        let name = segment_name(&path);
        Self { path, name }
    }
}

#[async_trait]
impl FileHandle for FsFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> Result<String, StoreError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| StoreError::io(self.path.display().to_string(), err))
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|err| StoreError::io(self.path.display().to_string(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn resolves_nested_paths_and_content() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("custom/global")).unwrap();
        std::fs::write(tmp.path().join("custom/global/main.yaml"), "handler: {}\n").unwrap();

        let root = FsDirectory::open(tmp.path()).await.expect("open root");
        let file = root.file("custom/global/main.yaml").await.expect("file");
        assert_eq!(file.name(), "main.yaml");
        assert_eq!(file.read_text().await.unwrap(), "handler: {}\n");

        let global = root.dir("custom/global").await.expect("dir");
        let entries: Vec<DirEntry> = global.entries().try_collect().await.expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "main.yaml");
        assert!(entries[0].node.as_file().is_some());
    }

    #[tokio::test]
    async fn missing_paths_surface_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = FsDirectory::open(tmp.path()).await.expect("open root");

        let err = root.dir("custom/scenes").await.expect_err("missing dir");
        assert!(err.is_not_found(), "unexpected error: {err}");

        let err = root.file("settings/settings.yaml").await.expect_err("missing file");
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn file_lookup_on_directory_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("settings")).unwrap();

        let root = FsDirectory::open(tmp.path()).await.expect("open root");
        let err = root.file("settings").await.expect_err("dir is not a file");
        assert!(matches!(err, StoreError::NotAFile(_)));
    }
}
