//! In-memory backend used by tests and simulated targets.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::api::{DirEntry, DirRef, DirectoryHandle, EntryStream, FileHandle, FileRef, Node};
use crate::errors::StoreError;

#[derive(Clone)]
enum MemoryNode {
    Directory(Arc<MemoryDirectory>),
    File(Arc<MemoryFile>),
}

/// Builder-style in-memory directory tree.
pub struct MemoryDirectory {
    name: String,
    children: BTreeMap<String, MemoryNode>,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        self.children.insert(
            name.clone(),
            MemoryNode::File(Arc::new(MemoryFile::new(name, contents))),
        );
        self
    }

    pub fn with_dir(mut self, dir: MemoryDirectory) -> Self {
        self.children
            .insert(dir.name.clone(), MemoryNode::Directory(Arc::new(dir)));
        self
    }

    pub fn into_handle(self) -> DirRef {
        Arc::new(self)
    }

    fn resolve(&self, path: &str) -> Result<MemoryNode, StoreError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let Some(first) = segments.next() else {
            return Err(StoreError::NotFound(path.to_string()));
        };
        let mut node = self
            .children
            .get(first)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        for segment in segments {
            let MemoryNode::Directory(dir) = node else {
                return Err(StoreError::NotADirectory(path.to_string()));
            };
            node = dir
                .children
                .get(segment)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> EntryStream {
        let snapshot: Vec<DirEntry> = self
            .children
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                node: match node {
                    MemoryNode::Directory(dir) => Node::Directory(dir.clone() as DirRef),
                    MemoryNode::File(file) => Node::File(file.clone() as FileRef),
                },
            })
            .collect();
        futures::stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }

    async fn dir(&self, path: &str) -> Result<DirRef, StoreError> {
        match self.resolve(path)? {
            MemoryNode::Directory(dir) => Ok(dir as DirRef),
            MemoryNode::File(_) => Err(StoreError::NotADirectory(path.to_string())),
        }
    }

    async fn file(&self, path: &str) -> Result<FileRef, StoreError> {
        match self.resolve(path)? {
            MemoryNode::File(file) => Ok(file as FileRef),
            MemoryNode::Directory(_) => Err(StoreError::NotAFile(path.to_string())),
        }
    }
}

/// In-memory file contents.
pub struct MemoryFile {
    name: String,
    contents: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> Result<String, StoreError> {
        String::from_utf8(self.contents.clone())
            .map_err(|_| StoreError::NotAFile(format!("{} is not utf-8 text", self.name)))
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.contents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn sample_root() -> DirRef {
        MemoryDirectory::new("root")
            .with_dir(
                MemoryDirectory::new("custom")
                    .with_dir(MemoryDirectory::new("global").with_file("main.yaml", "a: 1\n")),
            )
            .with_file("top.txt", "hello")
            .into_handle()
    }

    #[tokio::test]
    async fn resolves_multi_segment_paths() {
        let root = sample_root();
        let file = root.file("custom/global/main.yaml").await.expect("file");
        assert_eq!(file.read_text().await.unwrap(), "a: 1\n");

        let dir = root.dir("custom/global").await.expect("dir");
        assert_eq!(dir.name(), "global");
    }

    #[tokio::test]
    async fn missing_and_mistyped_lookups_fail() {
        let root = sample_root();
        assert!(root.dir("webhooks").await.unwrap_err().is_not_found());
        assert!(matches!(
            root.dir("top.txt").await.unwrap_err(),
            StoreError::NotADirectory(_)
        ));
        assert!(matches!(
            root.file("custom").await.unwrap_err(),
            StoreError::NotAFile(_)
        ));
    }

    #[tokio::test]
    async fn entries_enumerate_every_child_once() {
        let root = sample_root();
        let entries: Vec<DirEntry> = root.entries().try_collect().await.expect("entries");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"custom"));
        assert!(names.contains(&"top.txt"));
    }
}
