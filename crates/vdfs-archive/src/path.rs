//! Archive path handling
//!
//! Paths use `/` or `\` as separators. Empty segments and `.` are ignored,
//! so `"/_WORK//DATA/./A.TXT"` and `"_WORK\\DATA\\A.TXT"` are the same path.

use vdfs_formats::catalog::{ENTRY_NAME_LEN, text};

use crate::{ArchiveError, Result};

/// Split a path into its significant segments
pub(crate) fn split(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Split and validate a path naming a node to create
pub(crate) fn parse_destination(path: &str) -> Result<Vec<String>> {
    let segments = split(path);
    if segments.is_empty() {
        return Err(invalid(path, "path has no name segments"));
    }
    for segment in &segments {
        validate_name(segment, path)?;
    }
    Ok(segments.into_iter().map(str::to_string).collect())
}

/// Check that a single name can be stored in a catalog entry
pub(crate) fn validate_name(name: &str, path: &str) -> Result<()> {
    if name == ".." {
        return Err(invalid(path, "parent references are not supported"));
    }
    if name.contains('*') {
        return Err(invalid(path, "names cannot contain `*`"));
    }
    if !text::fits(name, ENTRY_NAME_LEN) {
        return Err(invalid(path, "names must be at most 64 Latin-1 characters"));
    }
    Ok(())
}

/// Join a parent path and a child name
pub(crate) fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn invalid(path: &str, reason: &'static str) -> ArchiveError {
    ArchiveError::InvalidPath {
        path: path.to_string(),
        reason,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_normalizes() {
        assert_eq!(split("/_WORK//DATA/./A.TXT"), vec!["_WORK", "DATA", "A.TXT"]);
        assert_eq!(split("_WORK\\DATA\\A.TXT"), vec!["_WORK", "DATA", "A.TXT"]);
        assert!(split("").is_empty());
        assert!(split("/./").is_empty());
    }

    #[test]
    fn test_parse_destination() {
        assert_eq!(
            parse_destination("a/b/c.txt").expect("Operation should succeed"),
            vec!["a", "b", "c.txt"]
        );
        assert!(matches!(
            parse_destination("//"),
            Err(ArchiveError::InvalidPath { .. })
        ));
        assert!(parse_destination("a/../b").is_err());
        assert!(parse_destination("a/*.txt").is_err());
        assert!(parse_destination(&"N".repeat(65)).is_err());
        assert!(parse_destination(&"N".repeat(64)).is_ok());
        assert!(parse_destination("\u{4E16}.TXT").is_err());
        assert!(parse_destination("\u{C4}RGER.TXT").is_ok());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "A.TXT"), "A.TXT");
        assert_eq!(join("_WORK/DATA", "A.TXT"), "_WORK/DATA/A.TXT");
    }
}
