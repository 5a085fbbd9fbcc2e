//! VDF header structures and parsing

use std::fmt;
use std::str::FromStr;

use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};

use crate::catalog::entry::ENTRY_SIZE;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::text;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 300;
/// Width of the comment field
pub const COMMENT_LEN: usize = 256;
/// Width of the signature field
pub const SIGNATURE_LEN: usize = 16;
/// Padding byte for the comment field (DOS end-of-file marker)
pub const COMMENT_PADDING: u8 = 0x1A;
/// Version tag written by every known game
pub const VDF_VERSION: u32 = 0x50;

/// Signature written by Gothic 1
pub const SIGNATURE_GOTHIC1: [u8; SIGNATURE_LEN] = *b"PSVDSC_V2.00\r\n\r\n";
/// Signature written by Gothic 2
pub const SIGNATURE_GOTHIC2: [u8; SIGNATURE_LEN] = *b"PSVDSC_V2.00\n\r\n\r";

/// Game generation an archive is written for
///
/// Only the header signature depends on it; catalog and content layout are
/// identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameVersion {
    /// Gothic 1
    Gothic1,
    /// Gothic 2 and Gothic 2: Night of the Raven
    #[default]
    Gothic2,
}

impl GameVersion {
    /// Header signature for this version
    pub const fn signature(self) -> [u8; SIGNATURE_LEN] {
        match self {
            Self::Gothic1 => SIGNATURE_GOTHIC1,
            Self::Gothic2 => SIGNATURE_GOTHIC2,
        }
    }

    /// Identify a version from its header signature
    pub fn from_signature(signature: &[u8; SIGNATURE_LEN]) -> Option<Self> {
        match *signature {
            SIGNATURE_GOTHIC1 => Some(Self::Gothic1),
            SIGNATURE_GOTHIC2 => Some(Self::Gothic2),
            _ => None,
        }
    }
}

impl FromStr for GameVersion {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "g1" | "gothic1" => Ok(Self::Gothic1),
            "g2" | "gothic2" => Ok(Self::Gothic2),
            _ => Err(CatalogError::InvalidGameVersion(s.to_string())),
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gothic1 => write!(f, "Gothic 1"),
            Self::Gothic2 => write!(f, "Gothic 2"),
        }
    }
}

/// VDF file header (300 bytes, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct VdfHeader {
    /// Free-text comment, padded with `0x1A`
    #[br(map = |raw: [u8; COMMENT_LEN]| text::decode_padded(&raw, COMMENT_PADDING))]
    #[bw(map = |comment: &String| text::encode_padded::<COMMENT_LEN>(comment, COMMENT_PADDING))]
    pub comment: String,

    /// Format signature, selects the game version
    pub signature: [u8; SIGNATURE_LEN],

    /// Total number of catalog entries
    pub entry_count: u32,

    /// Number of non-directory entries
    pub file_count: u32,

    /// Creation time in MS-DOS encoding
    pub timestamp: u32,

    /// Size of the content region in bytes
    pub content_size: u32,

    /// Byte offset of the catalog
    pub catalog_offset: u32,

    /// Byte size of the catalog
    pub catalog_size: u32,

    /// Version tag
    pub version: u32,
}

impl VdfHeader {
    /// Create an empty header for the given game version
    pub fn new(game_version: GameVersion) -> Self {
        Self {
            comment: String::new(),
            signature: game_version.signature(),
            entry_count: 0,
            file_count: 0,
            timestamp: 0,
            content_size: 0,
            catalog_offset: HEADER_SIZE as u32,
            catalog_size: 0,
            version: VDF_VERSION,
        }
    }

    /// Validate header values that can be checked without the buffer
    pub fn validate(&self) -> CatalogResult<()> {
        if GameVersion::from_signature(&self.signature).is_none() {
            return Err(CatalogError::InvalidSignature(self.signature));
        }

        let expected = u64::from(self.entry_count) * ENTRY_SIZE as u64;
        if expected != u64::from(self.catalog_size) {
            return Err(CatalogError::EntryCountMismatch {
                entry_count: self.entry_count,
                expected,
                declared: self.catalog_size,
            });
        }

        Ok(())
    }

    /// Game version identified by the signature
    pub fn game_version(&self) -> Option<GameVersion> {
        GameVersion::from_signature(&self.signature)
    }

    /// Switch the signature to another game version
    pub fn set_game_version(&mut self, game_version: GameVersion) {
        self.signature = game_version.signature();
    }

    /// Offset of the first content byte
    pub fn content_offset(&self) -> u64 {
        u64::from(self.catalog_offset) + u64::from(self.catalog_size)
    }

    /// Update counts, sizes and offsets after the catalog has been laid out
    pub fn update_catalog_info(&mut self, entry_count: u32, file_count: u32, content_size: u32) {
        self.entry_count = entry_count;
        self.file_count = file_count;
        self.content_size = content_size;
        self.catalog_offset = HEADER_SIZE as u32;
        self.catalog_size = entry_count * ENTRY_SIZE as u32;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_size() {
        let header = VdfHeader::new(GameVersion::Gothic2);
        let mut buffer = Vec::new();
        header
            .write_options(&mut Cursor::new(&mut buffer), binrw::Endian::Little, ())
            .expect("Operation should succeed");
        assert_eq!(buffer.len(), HEADER_SIZE);
        assert_eq!(&buffer[256..272], b"PSVDSC_V2.00\n\r\n\r");
        assert_eq!(buffer[0], COMMENT_PADDING);
        assert_eq!(&buffer[296..300], &VDF_VERSION.to_le_bytes());
    }

    #[test]
    fn test_header_comment_round_trip() {
        let mut header = VdfHeader::new(GameVersion::Gothic1);
        header.comment = "Built for the Khorinis mod".to_string();
        header.update_catalog_info(3, 2, 1024);

        let mut buffer = Vec::new();
        header
            .write_options(&mut Cursor::new(&mut buffer), binrw::Endian::Little, ())
            .expect("Operation should succeed");
        let parsed = VdfHeader::read_options(&mut Cursor::new(&buffer), binrw::Endian::Little, ())
            .expect("Operation should succeed");

        assert_eq!(parsed, header);
        assert_eq!(parsed.catalog_size, 240);
        assert_eq!(parsed.content_offset(), 540);
        assert_eq!(parsed.game_version(), Some(GameVersion::Gothic1));
    }

    #[test]
    fn test_validate_rejects_unknown_signature() {
        let mut header = VdfHeader::new(GameVersion::Gothic2);
        header.signature = *b"NOT_A_VDF_FILE!!";
        assert!(matches!(
            header.validate(),
            Err(CatalogError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let mut header = VdfHeader::new(GameVersion::Gothic2);
        header.update_catalog_info(2, 2, 0);
        header.catalog_size = 100;
        assert!(matches!(
            header.validate(),
            Err(CatalogError::EntryCountMismatch { expected: 160, .. })
        ));
    }

    #[test]
    fn test_game_version_from_str() {
        assert_eq!("g1".parse::<GameVersion>().unwrap(), GameVersion::Gothic1);
        assert_eq!("G2".parse::<GameVersion>().unwrap(), GameVersion::Gothic2);
        assert_eq!(
            "gothic1".parse::<GameVersion>().unwrap(),
            GameVersion::Gothic1
        );
        assert!(matches!(
            "g3".parse::<GameVersion>(),
            Err(CatalogError::InvalidGameVersion(v)) if v == "g3"
        ));
    }
}
