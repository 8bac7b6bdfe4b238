//! Capability-style handles over hierarchical project trees.
//!
//! A project root is addressed through two trait objects: [`DirectoryHandle`]
//! for enumeration and relative-path resolution, [`FileHandle`] for content.
//! Enumeration is lazy, finite and non-restartable, and inherits whatever
//! order the backing store provides; callers must not rely on it. Traversal
//! is non-recursive; callers compose recursion explicitly.

pub mod api;
pub mod errors;
pub mod fs;
pub mod memory;

pub use api::{DirEntry, DirRef, DirectoryHandle, EntryStream, FileHandle, FileRef, Node};
pub use errors::StoreError;
pub use fs::FsDirectory;
pub use memory::{MemoryDirectory, MemoryFile};
