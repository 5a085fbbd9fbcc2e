//! Catalog error types

use thiserror::Error;

/// Catalog codec error type
///
/// Every variant except [`CatalogError::InvalidGameVersion`] and the text
/// width errors describes an archive that cannot be used at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Buffer shorter than the fixed header
    #[error("truncated header: need {expected} bytes, got {actual}")]
    TruncatedHeader {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Signature is not one of the known game signatures
    #[error("invalid VDF signature: {0:02X?}")]
    InvalidSignature([u8; 16]),

    /// Declared entry count disagrees with the catalog size
    #[error("entry count {entry_count} implies a {expected}-byte catalog, header declares {declared}")]
    EntryCountMismatch {
        /// Entry count from the header
        entry_count: u32,
        /// Catalog size implied by the entry count
        expected: u64,
        /// Catalog size from the header
        declared: u32,
    },

    /// Declared file count disagrees with the non-directory entries
    #[error("header declares {declared} files, catalog contains {actual}")]
    FileCountMismatch {
        /// File count from the header
        declared: u32,
        /// Number of non-directory entries
        actual: u32,
    },

    /// Catalog extends past the end of the buffer
    #[error("catalog at {offset}+{size} exceeds buffer of {len} bytes")]
    CatalogOutOfBounds {
        /// Catalog offset
        offset: u32,
        /// Catalog size
        size: u32,
        /// Buffer length
        len: usize,
    },

    /// Content region extends past the end of the buffer
    #[error("content region at {offset}+{size} exceeds buffer of {len} bytes")]
    ContentOutOfBounds {
        /// Content region start
        offset: u64,
        /// Content region size
        size: u32,
        /// Buffer length
        len: usize,
    },

    /// A file entry points outside the content region
    #[error("entry {index} ({name}) at {offset}+{size} exceeds content region of {content_size} bytes")]
    EntryOutOfBounds {
        /// Catalog index of the entry
        index: usize,
        /// Entry name
        name: String,
        /// Entry offset
        offset: u32,
        /// Entry size
        size: u32,
        /// Content region size
        content_size: u32,
    },

    /// Name does not fit a fixed-width Latin-1 field
    #[error("name {name:?} is not representable in {width} Latin-1 bytes")]
    NameNotRepresentable {
        /// Offending name
        name: String,
        /// Field width in bytes
        width: usize,
    },

    /// Comment does not fit the fixed-width Latin-1 field
    #[error("comment is not representable in {width} Latin-1 bytes")]
    CommentNotRepresentable {
        /// Field width in bytes
        width: usize,
    },

    /// Unknown game version name
    #[error("invalid game version: {0}")]
    InvalidGameVersion(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
