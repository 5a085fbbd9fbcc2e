//! Catalog entry records and flags

use binrw::{BinRead, BinWrite};
use std::fmt;

use crate::catalog::text;

/// Size of one catalog record in bytes
pub const ENTRY_SIZE: usize = 80;
/// Width of the name field
pub const ENTRY_NAME_LEN: usize = 64;
/// Padding byte for the name field
pub const NAME_PADDING: u8 = b' ';
/// Attribute word given to new entries (archive bit)
pub const DEFAULT_ATTRIBUTES: u32 = 0x20;

/// Entry type flags
///
/// Only [`EntryFlags::DIRECTORY`] and [`EntryFlags::LAST`] are interpreted.
/// Any other bit is carried through parse and build unchanged.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryFlags {
    /// Raw flag value
    pub value: u32,
}

impl EntryFlags {
    /// No flags
    pub const NONE: u32 = 0x0000_0000;

    /// Entry is a directory
    pub const DIRECTORY: u32 = 0x8000_0000;

    /// Entry is the final sibling of its directory
    pub const LAST: u32 = 0x4000_0000;

    /// Bits the tree structure is encoded in
    pub const STRUCTURAL: u32 = Self::DIRECTORY | Self::LAST;

    /// Create flags from a raw value
    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    /// Check if flag is set
    pub const fn has(&self, flag: u32) -> bool {
        (self.value & flag) != 0
    }

    /// Set flag
    pub fn set(&mut self, flag: u32) {
        self.value |= flag;
    }

    /// Clear flag
    pub fn clear(&mut self, flag: u32) {
        self.value &= !flag;
    }

    /// Directory marker
    pub const fn is_directory(&self) -> bool {
        self.has(Self::DIRECTORY)
    }

    /// Last-in-directory marker
    pub const fn is_last(&self) -> bool {
        self.has(Self::LAST)
    }

    /// Bits outside [`EntryFlags::STRUCTURAL`]
    pub const fn extra(&self) -> u32 {
        self.value & !Self::STRUCTURAL
    }
}

impl fmt::Display for EntryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_directory() { "DIR" } else { "FILE" };
        if self.is_last() {
            write!(f, "{kind}|LAST")
        } else {
            write!(f, "{kind}")
        }
    }
}

/// One catalog record
///
/// For files `offset` is relative to the content region. For directories
/// it holds the catalog index of the first child, or `0` when the
/// directory is empty, and `size` is always `0`.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct VdfEntry {
    /// Entry name, case preserved
    #[br(map = |raw: [u8; ENTRY_NAME_LEN]| text::decode_padded(&raw, NAME_PADDING))]
    #[bw(map = |name: &String| text::encode_padded::<ENTRY_NAME_LEN>(name, NAME_PADDING))]
    pub name: String,

    /// Content offset (files) or first child index (directories)
    pub offset: u32,

    /// Content size in bytes
    pub size: u32,

    /// Type flags
    pub flags: EntryFlags,

    /// Attribute word, passed through untouched
    pub attributes: u32,
}

impl VdfEntry {
    /// Create a file entry with placeholder offset
    pub fn file(name: impl Into<String>, size: u32, attributes: u32) -> Self {
        Self {
            name: name.into(),
            offset: 0,
            size,
            flags: EntryFlags::new(EntryFlags::NONE),
            attributes,
        }
    }

    /// Create a directory entry
    pub fn directory(name: impl Into<String>, first_child: u32, attributes: u32) -> Self {
        Self {
            name: name.into(),
            offset: first_child,
            size: 0,
            flags: EntryFlags::new(EntryFlags::DIRECTORY),
            attributes,
        }
    }

    /// Directory marker
    pub const fn is_directory(&self) -> bool {
        self.flags.is_directory()
    }

    /// Last-in-directory marker
    pub const fn is_last(&self) -> bool {
        self.flags.is_last()
    }

    /// Mark this entry as the final sibling
    pub fn mark_last(&mut self) {
        self.flags.set(EntryFlags::LAST);
    }

    /// Whether the name survives encoding unchanged
    pub fn name_fits(&self) -> bool {
        text::fits(&self.name, ENTRY_NAME_LEN)
    }
}
