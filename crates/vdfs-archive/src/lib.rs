//! Load, edit and save VDF (Virtual Disk Format) container archives.
//!
//! This crate is the archive engine on top of [`vdfs_formats`]: it owns the
//! decoded directory tree, tracks where every file's bytes live, applies
//! structural edits and writes a fresh, compacted container on save.
//!
//! - **Archive model** ([`VdfArchive`]): path and wildcard resolution,
//!   insert, remove, extract and tree listing
//! - **Content store** ([`ContentStore`]): original archive ranges,
//!   in-memory buffers and external file references behind opaque handles
//! - **Writer** ([`ArchiveWriter`]): flatten, compact, recompute the header
//!   and encode
//!
//! # Example
//!
//! ```rust,no_run
//! use vdfs_archive::{ArchiveConfig, VdfArchive};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut archive = VdfArchive::open("Anims.vdf", ArchiveConfig::default())?;
//! let removed = archive.remove("*BODY")?;
//! archive.insert(b"new mesh".to_vec(), "_WORK/DATA/MESHES/NEW.MRM")?;
//! archive.write_to_path("Anims.vdf")?;
//! println!("removed {removed} files, {} remain", archive.file_count());
//! # Ok(())
//! # }
//! ```
//!
//! Edits take `&mut self` and reads take `&self`, so concurrent readers are
//! possible while mutation stays exclusive.

#![warn(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;
use vdfs_formats::{CatalogError, NodeKind, TreeError};

mod archive;
mod config;
mod content;
mod path;
mod pattern;
mod view;
mod writer;

pub use archive::{InsertOutcome, InsertSource, ResolvedNode, VdfArchive};
pub use config::{ArchiveConfig, ConflictPolicy};
pub use content::{Compacted, ContentHandle, ContentSource, ContentStore, Placement};
pub use pattern::{NameMatcher, PathPattern};
pub use view::{TreeViewItem, render_tree};
pub use writer::ArchiveWriter;

pub use vdfs_formats::{GameVersion, WalkOrder};

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur during archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Header or catalog bytes are not a usable VDF.
    #[error("Format error: {0}")]
    Format(#[from] CatalogError),

    /// Catalog nesting flags are inconsistent.
    #[error("Corrupt catalog: {0}")]
    CorruptCatalog(#[from] TreeError),

    /// Insert target collides with an existing node of the other kind.
    #[error("Name conflict: {path} already exists as a {existing}")]
    NameConflict {
        /// Conflicting path
        path: String,
        /// Kind of the node already there
        existing: NodeKind,
    },

    /// Pattern matched nothing where a match was required.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination path cannot be stored in the catalog.
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath {
        /// Offending path
        path: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Pattern uses unsupported wildcard syntax.
    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Content exceeds the 32-bit offsets of the format.
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(u64),

    /// Too many entries for the 32-bit catalog size field.
    #[error("Too many catalog entries: {0}")]
    TooManyEntries(usize),

    /// Handle does not belong to this store.
    #[error("Unknown content handle: {0}")]
    UnknownHandle(u32),

    /// Archive range points outside the loaded content region.
    #[error("Content range {offset}+{size} outside region of {region} bytes")]
    ContentOutOfRange {
        /// Range offset
        offset: u32,
        /// Range size
        size: u32,
        /// Region length
        region: usize,
    },

    /// External file changed size since it was inserted.
    #[error("External file {} changed: expected {expected} bytes, found {actual}", path.display())]
    ExternalChanged {
        /// External file path
        path: PathBuf,
        /// Size at insert time
        expected: u64,
        /// Size now
        actual: u64,
    },

    /// Save was cancelled through the writer's cancellation flag.
    #[error("Save cancelled")]
    Cancelled,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Check if the archive that produced this error is unusable
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Format(_) | Self::CorruptCatalog(_))
    }

    /// Check if the caller can retry with different input
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NameConflict { .. }
                | Self::NotFound(_)
                | Self::InvalidPath { .. }
                | Self::InvalidPattern { .. }
                | Self::Cancelled
        )
    }
}
