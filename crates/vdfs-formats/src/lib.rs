//! Catalog codec and tree builder for VDF (Virtual Disk Format) containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many VDF-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::derive_partial_eq_without_eq)] // Binary format structs
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! VDF containers pack thousands of game assets into a single file. The
//! on-disk catalog is a flat table of fixed-width records that encodes a
//! directory hierarchy purely through record order and two marker flags.
//! This crate provides the two layers that know about that encoding:
//!
//! - **Catalog**: symmetric (parse and build) codec for the header and the
//!   flat entry table. No tree knowledge.
//! - **Tree**: conversion between the flat entry list and an owned in-memory
//!   directory tree, plus lookup and traversal over that tree.
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: Both parsing and building supported
//! - **No Partial Results**: Malformed input fails with a typed error
//! - **Round-Trip Guarantee**: `build(flatten(tree)) == tree` and
//!   `parse(build(catalog)) == catalog`

#![warn(missing_docs)]

/// Header and flat entry table codec
///
/// The catalog codec reads and writes the fixed 300-byte header and the
/// 80-byte entry records that follow it. Parsing validates the signature,
/// the entry count against the declared catalog size, and every byte range
/// against the buffer, but performs no structural validation of the
/// directory encoding.
///
/// See the [`catalog`] module for the exact layout.
pub mod catalog;
/// In-memory directory tree and flat-list conversion
///
/// Converts the flag-encoded entry list into an owned tree of
/// [`tree::Directory`] and [`tree::File`] nodes and back again.
pub mod tree;

pub use catalog::{
    CatalogError, CatalogResult, EntryFlags, GameVersion, VdfCatalog, VdfEntry, VdfHeader,
};
pub use tree::{Directory, File, Node, NodeKind, TreeError, TreeResult, WalkOrder};

/// Common format trait for the symmetric codecs in this crate
pub trait VdfsFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err("Round-trip verification failed".into());
        }
        Ok(())
    }
}
