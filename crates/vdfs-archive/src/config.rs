//! Archive configuration

use serde::{Deserialize, Serialize};
use vdfs_formats::GameVersion;

/// Default size above which host files are referenced instead of loaded (16 MiB)
pub const DEFAULT_EXTERNAL_THRESHOLD: u64 = 16 * 1024 * 1024;

/// What to do when an insert targets an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Replace the file's content, keeping its stored name
    #[default]
    Overwrite,
    /// Fail with a name conflict
    Reject,
}

/// Configuration for archive editing and saving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Signature written for new archives
    pub game_version: GameVersion,

    /// Header comment for new archives
    pub comment: String,

    /// Policy for inserts onto existing files
    pub conflict_policy: ConflictPolicy,

    /// Store inserted file names in upper case
    pub uppercase_file_names: bool,

    /// Host files larger than this are referenced on disk until save
    pub external_threshold: u64,

    /// Memory-map archives on open instead of reading them into memory
    pub use_mmap: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            game_version: GameVersion::default(),
            comment: String::new(),
            conflict_policy: ConflictPolicy::default(),
            uppercase_file_names: false,
            external_threshold: DEFAULT_EXTERNAL_THRESHOLD,
            use_mmap: true,
        }
    }
}

impl ArchiveConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the game version
    #[must_use]
    pub const fn with_game_version(mut self, version: GameVersion) -> Self {
        self.game_version = version;
        self
    }

    /// Set the header comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the conflict policy
    #[must_use]
    pub const fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Upper-case inserted file names
    #[must_use]
    pub const fn with_uppercase_file_names(mut self, enabled: bool) -> Self {
        self.uppercase_file_names = enabled;
        self
    }

    /// Set the external reference threshold
    #[must_use]
    pub const fn with_external_threshold(mut self, bytes: u64) -> Self {
        self.external_threshold = bytes;
        self
    }

    /// Enable or disable memory mapping on open
    #[must_use]
    pub const fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.game_version, GameVersion::Gothic2);
        assert_eq!(config.conflict_policy, ConflictPolicy::Overwrite);
        assert!(!config.uppercase_file_names);
        assert!(config.use_mmap);
        assert_eq!(config.external_threshold, DEFAULT_EXTERNAL_THRESHOLD);
    }

    #[test]
    fn test_builder() {
        let config = ArchiveConfig::new()
            .with_game_version(GameVersion::Gothic1)
            .with_comment("mod patch")
            .with_conflict_policy(ConflictPolicy::Reject)
            .with_uppercase_file_names(true)
            .with_external_threshold(0)
            .with_mmap(false);

        assert_eq!(config.game_version, GameVersion::Gothic1);
        assert_eq!(config.comment, "mod patch");
        assert_eq!(config.conflict_policy, ConflictPolicy::Reject);
        assert!(config.uppercase_file_names);
        assert_eq!(config.external_threshold, 0);
        assert!(!config.use_mmap);
    }

    #[test]
    fn test_serde_partial() {
        let config: ArchiveConfig = serde_json::from_str(
            r#"{"game_version": "gothic1", "conflict_policy": "reject"}"#,
        )
        .expect("Operation should succeed");
        assert_eq!(config.game_version, GameVersion::Gothic1);
        assert_eq!(config.conflict_policy, ConflictPolicy::Reject);
        assert!(config.use_mmap);

        let json = serde_json::to_string(&config).expect("Operation should succeed");
        let back: ArchiveConfig = serde_json::from_str(&json).expect("Operation should succeed");
        assert_eq!(back, config);
    }
}
