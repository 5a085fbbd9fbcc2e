//! Tree error types

use thiserror::Error;

/// Tree construction and editing error type
///
/// All variants raised by [`crate::tree::build`] mean the catalog's nesting
/// encoding is corrupt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Entry that belongs to no directory level
    ///
    /// Raised for entries after the close of the root level that no
    /// directory offset points at.
    #[error("entry {index} ({name}) is outside every directory level")]
    StackUnderflow {
        /// Catalog index of the entry
        index: usize,
        /// Entry name
        name: String,
    },

    /// Catalog ended with directories still open
    #[error("catalog ended with {open} unclosed directory level(s)")]
    UnclosedDirectories {
        /// Number of open levels, including the root
        open: usize,
    },

    /// Directory first-child index points past the end of the catalog
    #[error("directory entry {index} ({name}) points at child index {found}, catalog has {count} entries")]
    ChildIndexOutOfRange {
        /// Catalog index of the directory
        index: usize,
        /// Directory name
        name: String,
        /// Index stored in the entry
        found: u32,
        /// Number of entries in the catalog
        count: usize,
    },

    /// Entry reached from two directory levels
    #[error("entry {index} ({name}) is claimed by more than one directory level")]
    SharedEntry {
        /// Catalog index of the entry
        index: usize,
        /// Entry name
        name: String,
    },

    /// Name field holds only padding
    #[error("entry {index} has an empty name")]
    EmptyName {
        /// Catalog index of the entry
        index: usize,
    },

    /// Two siblings share a name under case-insensitive comparison
    #[error("duplicate name in directory: {0}")]
    DuplicateName(String),
}

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;
