#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests combining the catalog codec with the tree builder
//!
//! Archives are assembled by hand, decoded, turned into a tree, flattened
//! and encoded again.

use pretty_assertions::assert_eq;
use vdfs_formats::catalog::{DEFAULT_ATTRIBUTES, HEADER_SIZE, ENTRY_SIZE};
use vdfs_formats::tree::{self, WalkOrder};
use vdfs_formats::{EntryFlags, GameVersion, VdfCatalog, VdfEntry, VdfHeader};

struct Content {
    offset: u32,
    size: u32,
}

/// Lay out a Gothic-style archive:
///
/// ```text
/// _WORK/
///   DATA/
///     ANIMS/
///       HUMANS.MDS
///       HUM_BODY_NAKED0.ASC
///     SCRIPTS/        (empty)
///   README.TXT
/// VERSION.TXT
/// ```
fn gothic_archive() -> Vec<u8> {
    let blobs: [&[u8]; 4] = [b"mds-data", b"asc-mesh-data", b"readme", b"1.30"];

    let mut entries = vec![
        VdfEntry::directory("_WORK", 1, DEFAULT_ATTRIBUTES),
        VdfEntry::directory("DATA", 2, DEFAULT_ATTRIBUTES),
        VdfEntry::directory("ANIMS", 3, DEFAULT_ATTRIBUTES),
        VdfEntry::file("HUMANS.MDS", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::file("HUM_BODY_NAKED0.ASC", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::directory("SCRIPTS", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::file("README.TXT", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::file("VERSION.TXT", 0, DEFAULT_ATTRIBUTES),
    ];
    for index in [4, 5, 6, 7] {
        entries[index].mark_last();
    }

    let mut content = Vec::new();
    for (entry_index, blob) in [3usize, 4, 6, 7].into_iter().zip(blobs) {
        entries[entry_index].offset = content.len() as u32;
        entries[entry_index].size = blob.len() as u32;
        content.extend_from_slice(blob);
    }

    let mut header = VdfHeader::new(GameVersion::Gothic1);
    header.comment = "integration fixture".to_string();
    header.timestamp = 0x2F7C_8A40;
    header.update_catalog_info(entries.len() as u32, 4, content.len() as u32);

    let mut data = VdfCatalog { header, entries }
        .build()
        .expect("Operation should succeed");
    data.extend_from_slice(&content);
    data
}

#[test]
fn decode_build_tree() {
    let data = gothic_archive();
    let catalog = VdfCatalog::parse(&data).expect("Operation should succeed");
    assert_eq!(catalog.header.game_version(), Some(GameVersion::Gothic1));
    assert_eq!(catalog.entries.len(), 8);

    let root = tree::build(&catalog.entries, |e| Content {
        offset: e.offset,
        size: e.size,
    })
    .expect("Operation should succeed");

    let paths: Vec<String> = root
        .walk(WalkOrder::DirectoriesFirst)
        .map(|item| item.path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "_WORK",
            "_WORK/DATA",
            "_WORK/DATA/ANIMS",
            "_WORK/DATA/ANIMS/HUMANS.MDS",
            "_WORK/DATA/ANIMS/HUM_BODY_NAKED0.ASC",
            "_WORK/DATA/SCRIPTS",
            "_WORK/README.TXT",
            "VERSION.TXT",
        ]
    );

    let content_start = catalog.content_range().start;
    let (_, node) = root
        .find_path(&["_work", "data", "anims", "hum_body_naked0.asc"])
        .expect("path resolves");
    let file = node.as_file().expect("is a file");
    let start = content_start + file.payload().offset as usize;
    assert_eq!(
        &data[start..start + file.payload().size as usize],
        b"asc-mesh-data"
    );
}

#[test]
fn catalog_bytes_survive_tree_round_trip() {
    let data = gothic_archive();
    let catalog = VdfCatalog::parse(&data).expect("Operation should succeed");
    let root = tree::build(&catalog.entries, |e| (e.offset, e.size))
        .expect("Operation should succeed");

    let mut entries = tree::flatten(&root);
    for (entry, (_, file)) in entries
        .iter_mut()
        .filter(|e| !e.is_directory())
        .zip(root.files())
    {
        entry.offset = file.payload().0;
    }

    let rebuilt = VdfCatalog {
        header: catalog.header.clone(),
        entries,
    }
    .build()
    .expect("Operation should succeed");

    let catalog_end = HEADER_SIZE + catalog.entries.len() * ENTRY_SIZE;
    assert_eq!(rebuilt, data[..catalog_end].to_vec());
}

/// Lay out the same kind of archive with child blocks, the way the game's
/// own archives are packed:
///
/// ```text
/// 0 _WORK/       -> 2
/// 1 VERSION.TXT        LAST
/// 2 DATA/        -> 3  LAST
/// 3 HUMANS.MDS
/// 4 GOTHIC.DAT         LAST
/// ```
fn block_archive() -> Vec<u8> {
    let mut entries = vec![
        VdfEntry::directory("_WORK", 2, DEFAULT_ATTRIBUTES),
        VdfEntry::file("VERSION.TXT", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::directory("DATA", 3, DEFAULT_ATTRIBUTES),
        VdfEntry::file("HUMANS.MDS", 0, DEFAULT_ATTRIBUTES),
        VdfEntry::file("GOTHIC.DAT", 0, DEFAULT_ATTRIBUTES),
    ];
    for index in [1, 2, 4] {
        entries[index].mark_last();
    }
    entries[4].flags.set(0x0000_0200);

    // content deliberately out of catalog order
    let mut content = Vec::new();
    for (entry_index, blob) in [(4usize, &b"dat"[..]), (1, b"1.30"), (3, b"mds")] {
        entries[entry_index].offset = content.len() as u32;
        entries[entry_index].size = blob.len() as u32;
        content.extend_from_slice(blob);
    }

    let mut header = VdfHeader::new(GameVersion::Gothic2);
    header.update_catalog_info(entries.len() as u32, 3, content.len() as u32);
    let mut data = VdfCatalog { header, entries }
        .build()
        .expect("Operation should succeed");
    data.extend_from_slice(&content);
    data
}

#[test]
fn child_block_catalog_builds_same_tree() {
    let data = block_archive();
    let catalog = VdfCatalog::parse(&data).expect("Operation should succeed");
    let content_start = catalog.content_range().start;
    let root = tree::build(&catalog.entries, |e| {
        data[content_start + e.offset as usize..][..e.size as usize].to_vec()
    })
    .expect("Operation should succeed");

    let files: Vec<(String, Vec<u8>)> = root
        .files()
        .map(|(path, file)| (path, file.payload().clone()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("_WORK/DATA/HUMANS.MDS".to_string(), b"mds".to_vec()),
            ("_WORK/DATA/GOTHIC.DAT".to_string(), b"dat".to_vec()),
            ("VERSION.TXT".to_string(), b"1.30".to_vec()),
        ]
    );

    // rewritten depth-first, keeping names, flags and attributes
    let flat = tree::flatten(&root);
    let summary: Vec<(&str, u32, u32)> = flat
        .iter()
        .map(|e| (e.name.as_str(), e.offset, e.flags.value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("_WORK", 1, EntryFlags::DIRECTORY),
            ("DATA", 2, EntryFlags::DIRECTORY | EntryFlags::LAST),
            ("HUMANS.MDS", 0, 0),
            ("GOTHIC.DAT", 0, EntryFlags::LAST | 0x0000_0200),
            ("VERSION.TXT", 0, EntryFlags::LAST),
        ]
    );
    assert_eq!(
        tree::build(&flat, |e| e.size).expect("Operation should succeed"),
        root.map(|payload| payload.len() as u32)
    );
}
