use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::StoreError;

pub type DirRef = Arc<dyn DirectoryHandle>;
pub type FileRef = Arc<dyn FileHandle>;

/// One enumerated child of a directory.
#[derive(Clone)]
pub struct DirEntry {
    pub name: String,
    pub node: Node,
}

#[derive(Clone)]
pub enum Node {
    Directory(DirRef),
    File(FileRef),
}

impl Node {
    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Node::File(file) => Some(file),
            Node::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirRef> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }
}

/// Lazy, finite, non-restartable enumeration of a directory's children.
pub type EntryStream = BoxStream<'static, Result<DirEntry, StoreError>>;

#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    /// Last path segment of this directory.
    fn name(&self) -> &str;

    /// Enumerate immediate children. No ordering guarantee.
    fn entries(&self) -> EntryStream;

    /// Resolve a relative, `/`-separated path to a child directory.
    async fn dir(&self, path: &str) -> Result<DirRef, StoreError>;

    /// Resolve a relative, `/`-separated path to a child file.
    async fn file(&self, path: &str) -> Result<FileRef, StoreError>;
}

#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Last path segment of this file.
    fn name(&self) -> &str;

    async fn read_text(&self) -> Result<String, StoreError>;

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError>;
}
