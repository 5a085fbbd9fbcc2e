//! Archive serialization
//!
//! Saving never touches the archive: the tree is flattened, live content
//! is compacted into a fresh blob, file entries get their new offsets and
//! the header counts are recomputed. Any failure discards the output.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tempfile::NamedTempFile;
use tracing::info;
use vdfs_formats::catalog::{ENTRY_SIZE, timestamp};
use vdfs_formats::{GameVersion, VdfCatalog, tree};

use crate::archive::VdfArchive;
use crate::{ArchiveError, Result};

/// Writer for a [`VdfArchive`] with optional header overrides
#[derive(Debug, Clone)]
pub struct ArchiveWriter<'a> {
    archive: &'a VdfArchive,
    timestamp: Option<u32>,
    comment: Option<String>,
    game_version: Option<GameVersion>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> ArchiveWriter<'a> {
    /// Create a writer using the archive's own header values
    pub const fn new(archive: &'a VdfArchive) -> Self {
        Self {
            archive,
            timestamp: None,
            comment: None,
            game_version: None,
            cancel: None,
        }
    }

    /// Use a fixed MS-DOS timestamp instead of the current time
    #[must_use]
    pub const fn with_timestamp(mut self, dos_timestamp: u32) -> Self {
        self.timestamp = Some(dos_timestamp);
        self
    }

    /// Override the header comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Override the signature
    #[must_use]
    pub const fn with_game_version(mut self, game_version: GameVersion) -> Self {
        self.game_version = Some(game_version);
        self
    }

    /// Abort with [`ArchiveError::Cancelled`] once `flag` is set
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Encode the archive into a complete VDF image
    pub fn save(&self) -> Result<Vec<u8>> {
        let root = self.archive.root();
        let mut entries = tree::flatten(root);
        let compacted = self
            .archive
            .store()
            .compact(root, self.cancel.as_deref())?;

        for (entry, placement) in entries
            .iter_mut()
            .filter(|entry| !entry.is_directory())
            .zip(&compacted.placements)
        {
            entry.offset = placement.offset;
            entry.size = placement.size;
        }

        let entry_count = u32::try_from(entries.len())
            .ok()
            .filter(|count| count.checked_mul(ENTRY_SIZE as u32).is_some())
            .ok_or(ArchiveError::TooManyEntries(entries.len()))?;
        let file_count = compacted.placements.len() as u32;
        let content_size = u32::try_from(compacted.blob.len())
            .map_err(|_| ArchiveError::ContentTooLarge(compacted.blob.len() as u64))?;

        let mut header = self.archive.header().clone();
        if let Some(game_version) = self.game_version {
            header.set_game_version(game_version);
        }
        if let Some(comment) = &self.comment {
            header.comment.clone_from(comment);
        }
        header.timestamp = self.timestamp.unwrap_or_else(timestamp::now);
        header.update_catalog_info(entry_count, file_count, content_size);

        let mut output = VdfCatalog { header, entries }.build()?;
        output.extend_from_slice(&compacted.blob);

        info!(
            "Saved {}: {} entries, {} files, {} bytes",
            self.archive.name(),
            entry_count,
            file_count,
            output.len()
        );
        Ok(output)
    }

    /// Encode and atomically replace `path`
    ///
    /// The image is written to a temporary file next to `path` and renamed
    /// over it; on failure the temporary file is removed and `path` is left
    /// as it was. Returns the number of bytes written.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let data = self.save()?;

        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&data)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        info!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveConfig;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use vdfs_formats::catalog::HEADER_SIZE;

    fn archive() -> VdfArchive {
        let mut archive = VdfArchive::new(ArchiveConfig::default().with_comment("writer test"));
        archive.insert("abc", "_WORK/A.TXT").expect("Operation should succeed");
        archive.insert("hello", "_WORK/B.TXT").expect("Operation should succeed");
        archive.insert_dir("_WORK/EMPTY").expect("Operation should succeed");
        archive
    }

    #[test]
    fn test_save_layout() {
        let data = ArchiveWriter::new(&archive())
            .with_timestamp(0x0021_0000)
            .save()
            .expect("Operation should succeed");

        let catalog = VdfCatalog::parse(&data).expect("Operation should succeed");
        assert_eq!(catalog.header.entry_count, 4);
        assert_eq!(catalog.header.file_count, 2);
        assert_eq!(catalog.header.content_size, 8);
        assert_eq!(catalog.header.timestamp, 0x0021_0000);
        assert_eq!(catalog.header.comment, "writer test");
        assert_eq!(catalog.header.catalog_offset as usize, HEADER_SIZE);
        assert_eq!(data.len(), HEADER_SIZE + 4 * ENTRY_SIZE + 8);
        assert_eq!(&data[catalog.content_range()], b"abchello");

        let b = &catalog.entries[2];
        assert_eq!((b.name.as_str(), b.offset, b.size), ("B.TXT", 3, 5));
    }

    #[test]
    fn test_save_is_deterministic_with_fixed_timestamp() {
        let archive = archive();
        let first = ArchiveWriter::new(&archive)
            .with_timestamp(7)
            .save()
            .expect("Operation should succeed");
        let second = ArchiveWriter::new(&archive)
            .with_timestamp(7)
            .save()
            .expect("Operation should succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn test_overrides() {
        let data = ArchiveWriter::new(&archive())
            .with_comment("override")
            .with_game_version(GameVersion::Gothic1)
            .save()
            .expect("Operation should succeed");
        let catalog = VdfCatalog::parse(&data).expect("Operation should succeed");
        assert_eq!(catalog.header.comment, "override");
        assert_eq!(catalog.header.game_version(), Some(GameVersion::Gothic1));
    }

    #[test]
    fn test_empty_archive() {
        let archive = VdfArchive::new(ArchiveConfig::default());
        let data = archive.save().expect("Operation should succeed");
        assert_eq!(data.len(), HEADER_SIZE);
        let reloaded =
            VdfArchive::from_bytes(data, ArchiveConfig::default()).expect("Operation should succeed");
        assert_eq!(reloaded.node_count(), 0);
    }

    #[test]
    fn test_cancelled_save() {
        let archive = archive();
        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);
        let result = ArchiveWriter::new(&archive).with_cancel_flag(flag).save();
        assert!(matches!(result, Err(ArchiveError::Cancelled)));
        assert_eq!(archive.file_count(), 2);
    }
}
