//! Content store
//!
//! File nodes carry a [`ContentHandle`]; the store maps each handle to
//! where the bytes currently live. Loading an archive registers one
//! [`ContentSource::Archive`] range per file, inserts register memory
//! buffers or external host files, and the writer asks the store to
//! [`compact`](ContentStore::compact) the live files into a fresh blob.
//!
//! Handles are never reused. Replacing or removing a file releases its
//! source, dropping any memory buffer it held. Archive ranges stay inside
//! the loaded region until the next save, which only copies live files.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tracing::{debug, warn};
use vdfs_formats::{Directory, File, Node};

use crate::{ArchiveError, Result};

/// Opaque reference to a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHandle(u32);

impl ContentHandle {
    /// Position in the store's registry
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Where the bytes of a file live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Range of the loaded archive's content region
    Archive {
        /// Offset from the start of the content region
        offset: u32,
        /// Length in bytes
        size: u32,
    },
    /// Buffer held in memory
    Memory(Bytes),
    /// Host file read on demand
    External {
        /// Host path
        path: PathBuf,
        /// Size when registered
        size: u64,
    },
}

impl ContentSource {
    /// Length of the content in bytes
    pub fn len(&self) -> u64 {
        match self {
            Self::Archive { size, .. } => u64::from(*size),
            Self::Memory(bytes) => bytes.len() as u64,
            Self::External { size, .. } => *size,
        }
    }

    /// Check if the content is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Final position of one file in a compacted blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Content that was copied
    pub handle: ContentHandle,
    /// Offset in the blob
    pub offset: u32,
    /// Length in bytes
    pub size: u32,
}

/// Result of compacting the live files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compacted {
    /// Concatenated content of every live file
    pub blob: Vec<u8>,
    /// One placement per file, in catalog order
    pub placements: Vec<Placement>,
}

/// Registry of content sources keyed by handle
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    region: Bytes,
    sources: Vec<Option<ContentSource>>,
}

impl ContentStore {
    /// Create an empty store with no archive region
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store backed by a loaded content region
    pub fn with_region(region: Bytes) -> Self {
        Self {
            region,
            sources: Vec::new(),
        }
    }

    /// Register a source and return its handle
    pub fn register(&mut self, source: ContentSource) -> ContentHandle {
        let handle = ContentHandle(self.sources.len() as u32);
        self.sources.push(Some(source));
        handle
    }

    /// Drop the source behind a handle
    ///
    /// The handle is not reused; reading it afterwards fails with
    /// [`ArchiveError::UnknownHandle`].
    pub fn release(&mut self, handle: ContentHandle) -> Option<ContentSource> {
        self.sources.get_mut(handle.0 as usize).and_then(Option::take)
    }

    /// Release every file handle under `node`, returning how many were held
    pub fn release_node(&mut self, node: &Node<ContentHandle>) -> usize {
        match node {
            Node::File(file) => usize::from(self.release(*file.payload()).is_some()),
            Node::Directory(dir) => dir
                .files()
                .filter(|(_, file)| self.release(*file.payload()).is_some())
                .count(),
        }
    }

    /// Number of sources that have not been released
    pub fn len(&self) -> usize {
        self.sources.iter().flatten().count()
    }

    /// Check if no source is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source behind a handle
    pub fn source(&self, handle: ContentHandle) -> Result<&ContentSource> {
        self.sources
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(ArchiveError::UnknownHandle(handle.0))
    }

    /// Read the bytes behind a handle
    ///
    /// Archive ranges and memory buffers are returned without copying.
    /// External files are read from disk and must still have the size they
    /// had when registered.
    pub fn read(&self, handle: ContentHandle) -> Result<Bytes> {
        match self.source(handle)? {
            ContentSource::Archive { offset, size } => {
                let start = *offset as usize;
                let end = start + *size as usize;
                if end > self.region.len() {
                    return Err(ArchiveError::ContentOutOfRange {
                        offset: *offset,
                        size: *size,
                        region: self.region.len(),
                    });
                }
                Ok(self.region.slice(start..end))
            }
            ContentSource::Memory(bytes) => Ok(bytes.clone()),
            ContentSource::External { path, size } => {
                let data = fs::read(path)?;
                if data.len() as u64 != *size {
                    warn!(
                        "External file {} changed size since insert",
                        path.display()
                    );
                    return Err(ArchiveError::ExternalChanged {
                        path: path.clone(),
                        expected: *size,
                        actual: data.len() as u64,
                    });
                }
                Ok(Bytes::from(data))
            }
        }
    }

    /// Copy the content of every file under `root` into one blob
    ///
    /// Files are visited in catalog order, so placements line up with the
    /// file entries of [`vdfs_formats::tree::flatten`]. `cancel` is checked
    /// between top-level children of the root.
    pub fn compact(
        &self,
        root: &Directory<ContentHandle>,
        cancel: Option<&AtomicBool>,
    ) -> Result<Compacted> {
        let mut compacted = Compacted {
            blob: Vec::new(),
            placements: Vec::new(),
        };

        for child in root.children() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                debug!("Compaction cancelled");
                return Err(ArchiveError::Cancelled);
            }
            match child {
                Node::File(file) => self.append(file, &mut compacted)?,
                Node::Directory(dir) => {
                    for (_, file) in dir.files() {
                        self.append(file, &mut compacted)?;
                    }
                }
            }
        }

        let registered: u64 = self.sources.iter().flatten().map(ContentSource::len).sum();
        let live = compacted.blob.len() as u64;
        debug!(
            "Compacted {} files: {} live bytes, {} orphaned sources ({} bytes)",
            compacted.placements.len(),
            live,
            self.len().saturating_sub(compacted.placements.len()),
            registered.saturating_sub(live)
        );

        Ok(compacted)
    }

    fn append(&self, file: &File<ContentHandle>, compacted: &mut Compacted) -> Result<()> {
        let handle = *file.payload();
        let data = self.read(handle)?;

        let offset = u32::try_from(compacted.blob.len())
            .map_err(|_| ArchiveError::ContentTooLarge(compacted.blob.len() as u64))?;
        let size =
            u32::try_from(data.len()).map_err(|_| ArchiveError::ContentTooLarge(data.len() as u64))?;
        if u32::try_from(compacted.blob.len() + data.len()).is_err() {
            return Err(ArchiveError::ContentTooLarge(
                (compacted.blob.len() + data.len()) as u64,
            ));
        }

        compacted.blob.extend_from_slice(&data);
        compacted.placements.push(Placement {
            handle,
            offset,
            size,
        });
        Ok(())
    }
}
