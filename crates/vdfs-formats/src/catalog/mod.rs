//! VDF catalog codec
//!
//! A VDF container is laid out as:
//!
//! ```text
//! [header: 300 bytes][catalog: entry_count * 80 bytes][content region]
//! ```
//!
//! # Header
//!
//! 256-byte comment padded with `0x1A`, 16-byte signature (one per game
//! version), then seven little-endian `u32` fields: entry count, file count,
//! DOS timestamp, content size, catalog offset, catalog size and version tag.
//!
//! # Catalog
//!
//! A flat sequence of 80-byte records (64-byte space-padded name, offset,
//! size, flags, attributes). A directory record's offset is the index of
//! its first child and the final sibling of every directory carries
//! [`EntryFlags::LAST`]. Written catalogs are depth-first, with each
//! directory record immediately followed by its children. This module does
//! not interpret that nesting; see [`crate::tree`].
//!
//! # Content
//!
//! File offsets are relative to the first byte after the catalog.

mod entry;
mod error;
mod header;
pub mod text;
pub mod timestamp;

pub use entry::{DEFAULT_ATTRIBUTES, ENTRY_NAME_LEN, ENTRY_SIZE, EntryFlags, NAME_PADDING, VdfEntry};
pub use error::{CatalogError, CatalogResult};
pub use header::{
    COMMENT_LEN, COMMENT_PADDING, GameVersion, HEADER_SIZE, SIGNATURE_GOTHIC1, SIGNATURE_GOTHIC2,
    SIGNATURE_LEN, VDF_VERSION, VdfHeader,
};

use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use std::ops::Range;

/// Decoded header and flat entry list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdfCatalog {
    /// Archive header
    pub header: VdfHeader,
    /// Entries in on-disk order
    pub entries: Vec<VdfEntry>,
}

impl VdfCatalog {
    /// Decode the header and catalog from a complete archive buffer.
    ///
    /// Validates every byte range against `data` so that later content reads
    /// can slice without further checks.
    pub fn parse(data: &[u8]) -> CatalogResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CatalogError::TruncatedHeader {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let header = VdfHeader::read_options(&mut cursor, binrw::Endian::Little, ())?;
        header.validate()?;

        let catalog_end = u64::from(header.catalog_offset) + u64::from(header.catalog_size);
        if catalog_end > data.len() as u64 {
            return Err(CatalogError::CatalogOutOfBounds {
                offset: header.catalog_offset,
                size: header.catalog_size,
                len: data.len(),
            });
        }

        let content_start = header.content_offset();
        if content_start + u64::from(header.content_size) > data.len() as u64 {
            return Err(CatalogError::ContentOutOfBounds {
                offset: content_start,
                size: header.content_size,
                len: data.len(),
            });
        }

        cursor.set_position(u64::from(header.catalog_offset));
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        let mut file_count = 0u32;
        for index in 0..header.entry_count as usize {
            let entry = VdfEntry::read_options(&mut cursor, binrw::Endian::Little, ())?;

            if !entry.is_directory() {
                file_count += 1;
                if u64::from(entry.offset) + u64::from(entry.size)
                    > u64::from(header.content_size)
                {
                    return Err(CatalogError::EntryOutOfBounds {
                        index,
                        name: entry.name,
                        offset: entry.offset,
                        size: entry.size,
                        content_size: header.content_size,
                    });
                }
            }

            entries.push(entry);
        }

        if file_count != header.file_count {
            return Err(CatalogError::FileCountMismatch {
                declared: header.file_count,
                actual: file_count,
            });
        }

        Ok(Self { header, entries })
    }

    /// Encode the header followed by the catalog.
    ///
    /// The header is written as given; use
    /// [`VdfHeader::update_catalog_info`] to recompute it first. Output is
    /// deterministic for identical input.
    pub fn build(&self) -> CatalogResult<Vec<u8>> {
        if !text::fits(&self.header.comment, COMMENT_LEN) {
            return Err(CatalogError::CommentNotRepresentable { width: COMMENT_LEN });
        }
        if let Some(entry) = self.entries.iter().find(|e| !e.name_fits()) {
            return Err(CatalogError::NameNotRepresentable {
                name: entry.name.clone(),
                width: ENTRY_NAME_LEN,
            });
        }

        let mut output = Vec::with_capacity(HEADER_SIZE + self.entries.len() * ENTRY_SIZE);
        let mut cursor = Cursor::new(&mut output);
        self.header
            .write_options(&mut cursor, binrw::Endian::Little, ())?;
        for entry in &self.entries {
            entry.write_options(&mut cursor, binrw::Endian::Little, ())?;
        }

        Ok(output)
    }

    /// Byte range of the content region within the archive buffer
    pub fn content_range(&self) -> Range<usize> {
        let start = self.header.content_offset() as usize;
        start..start + self.header.content_size as usize
    }

    /// Number of non-directory entries
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory()).count()
    }
}

impl crate::VdfsFormat for VdfCatalog {
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        Self::parse(data).map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.build()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }
}
