//! In-memory VDF archive

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::MmapOptions;
use tracing::{debug, info};
use vdfs_formats::catalog::{COMMENT_LEN, text, timestamp};
use vdfs_formats::tree::{self, Directory, File, Node, NodeKind, WalkOrder};
use vdfs_formats::{CatalogError, GameVersion, VdfCatalog, VdfHeader};
use walkdir::WalkDir;

use crate::config::{ArchiveConfig, ConflictPolicy};
use crate::content::{ContentHandle, ContentSource, ContentStore};
use crate::path;
use crate::pattern::{NameMatcher, PathPattern};
use crate::view::{self, TreeViewItem};
use crate::writer::ArchiveWriter;
use crate::{ArchiveError, Result};

/// Content for [`VdfArchive::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertSource {
    /// Bytes held in memory
    Bytes(Bytes),
    /// File on the host filesystem
    HostFile(PathBuf),
}

impl From<Bytes> for InsertSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for InsertSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

impl From<&'static [u8]> for InsertSource {
    fn from(data: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(data))
    }
}

impl From<&'static str> for InsertSource {
    fn from(text: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Whether an insert created a file or replaced one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new file node was added
    Created,
    /// An existing file's content was replaced
    Replaced,
}

/// A node matched by a path pattern
#[derive(Debug, Clone)]
pub struct ResolvedNode<'a> {
    /// Full path in stored case
    pub path: String,
    /// Child positions from the root
    pub index_path: Vec<usize>,
    /// The matched node
    pub node: &'a Node<ContentHandle>,
}

impl ResolvedNode<'_> {
    /// Kind of the matched node
    pub const fn kind(&self) -> NodeKind {
        self.node.kind()
    }
}

/// A VDF archive loaded into memory
///
/// The archive owns the directory tree and a [`ContentStore`] that knows
/// where each file's bytes live. Edits only touch the tree and the store;
/// nothing is written until [`save`](Self::save) or
/// [`write_to_path`](Self::write_to_path).
#[derive(Debug, Clone)]
pub struct VdfArchive {
    name: String,
    header: VdfHeader,
    root: Directory<ContentHandle>,
    store: ContentStore,
    config: ArchiveConfig,
}

impl VdfArchive {
    /// Create an empty archive
    pub fn new(config: ArchiveConfig) -> Self {
        let mut header = VdfHeader::new(config.game_version);
        header.comment.clone_from(&config.comment);
        header.timestamp = timestamp::now();

        Self {
            name: default_name(header.timestamp),
            header,
            root: Directory::root(),
            store: ContentStore::new(),
            config,
        }
    }

    /// Decode an archive held in memory
    ///
    /// The buffer is kept and file content is sliced from it on demand.
    pub fn from_bytes(data: impl Into<Bytes>, config: ArchiveConfig) -> Result<Self> {
        let data: Bytes = data.into();
        let catalog = VdfCatalog::parse(&data)?;

        let mut store = ContentStore::with_region(data.slice(catalog.content_range()));
        let root = tree::build(&catalog.entries, |entry| {
            store.register(ContentSource::Archive {
                offset: entry.offset,
                size: entry.size,
            })
        })?;

        info!(
            "Loaded {} archive: {} entries, {} files, {} content bytes",
            catalog
                .header
                .game_version()
                .map_or_else(|| "unknown".to_string(), |v| v.to_string()),
            catalog.entries.len(),
            catalog.header.file_count,
            catalog.header.content_size
        );

        Ok(Self {
            name: default_name(catalog.header.timestamp),
            header: catalog.header,
            root,
            store,
            config,
        })
    }

    /// Open an archive file
    ///
    /// With [`ArchiveConfig::use_mmap`] the file is memory-mapped, otherwise
    /// it is read into memory.
    pub fn open(path: impl AsRef<Path>, config: ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening archive {}", path.display());

        let data = if config.use_mmap {
            let file = fs::File::open(path)?;
            #[allow(unsafe_code)]
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            Bytes::from_owner(mmap)
        } else {
            Bytes::from(fs::read(path)?)
        };

        let mut archive = Self::from_bytes(data, config)?;
        if let Some(name) = path.file_name() {
            archive.name = name.to_string_lossy().into_owned();
        }
        Ok(archive)
    }

    /// Archive name (file name when opened from disk)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the archive
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Header as loaded or last configured
    ///
    /// Counts and offsets are recomputed on save.
    pub const fn header(&self) -> &VdfHeader {
        &self.header
    }

    /// Active configuration
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Game version from the header signature
    pub fn game_version(&self) -> GameVersion {
        self.header
            .game_version()
            .unwrap_or(self.config.game_version)
    }

    /// Change the signature written on save
    pub fn set_game_version(&mut self, game_version: GameVersion) {
        self.header.set_game_version(game_version);
    }

    /// Replace the header comment
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        let comment = comment.into();
        if !text::fits(&comment, COMMENT_LEN) {
            return Err(CatalogError::CommentNotRepresentable { width: COMMENT_LEN }.into());
        }
        self.header.comment = comment;
        Ok(())
    }

    /// Root directory
    pub const fn root(&self) -> &Directory<ContentHandle> {
        &self.root
    }

    /// Content store
    pub const fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Number of files in the tree
    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// Number of nodes of either kind in the tree
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Resolve a path or wildcard pattern to the nodes it names
    ///
    /// - `NAME` matches every node called `NAME` anywhere in the tree
    /// - `DIR/.../NAME` is an exact path from the root
    /// - `[DIR/...]/PATTERN` with `*` matches files under `DIR` (or the
    ///   whole tree) whose name matches `PATTERN`, see [`PathPattern`]
    ///
    /// Matching nothing yields an empty list. Results are in catalog order.
    pub fn resolve_path(&self, pattern: &str) -> Result<Vec<ResolvedNode<'_>>> {
        let parsed = PathPattern::parse(pattern)?;

        if let NameMatcher::Exact(name) = parsed.matcher() {
            if parsed.scope().is_empty() {
                return Ok(self
                    .root
                    .walk(WalkOrder::DirectoriesFirst)
                    .filter(|item| parsed.matcher().matches(item.node.name()))
                    .map(|item| ResolvedNode {
                        path: item.path,
                        index_path: item.index_path,
                        node: item.node,
                    })
                    .collect());
            }

            let mut segments = parsed.scope().to_vec();
            segments.push(name.clone());
            return Ok(self
                .root
                .find_path(&segments)
                .map(|(index_path, node)| ResolvedNode {
                    path: self.stored_path(&index_path),
                    index_path,
                    node,
                })
                .into_iter()
                .collect());
        }

        let (scope, prefix, base) = if parsed.scope().is_empty() {
            (&self.root, String::new(), Vec::new())
        } else {
            match self.root.find_path(parsed.scope()) {
                Some((index_path, Node::Directory(dir))) => {
                    (dir, self.stored_path(&index_path), index_path)
                }
                _ => return Ok(Vec::new()),
            }
        };

        Ok(scope
            .walk(WalkOrder::DirectoriesFirst)
            .filter(|item| {
                matches!(item.node, Node::File(file) if parsed.matcher().matches(file.name()))
            })
            .map(|item| ResolvedNode {
                path: path::join(&prefix, &item.path),
                index_path: base.iter().copied().chain(item.index_path).collect(),
                node: item.node,
            })
            .collect())
    }

    /// Insert a file at `destination`, creating missing directories
    ///
    /// An existing file at the destination is replaced under
    /// [`ConflictPolicy::Overwrite`], keeping its stored name and position.
    /// Conflicts are detected before the tree is touched, so a failed insert
    /// leaves the archive unchanged.
    pub fn insert(
        &mut self,
        source: impl Into<InsertSource>,
        destination: &str,
    ) -> Result<InsertOutcome> {
        let mut segments = path::parse_destination(destination)?;
        if self.config.uppercase_file_names
            && let Some(name) = segments.last_mut()
        {
            *name = name.to_uppercase();
            path::validate_name(name, destination)?;
        }
        self.check_insert(&segments)?;

        let (source, size) = self.prepare_source(source.into())?;
        let Some((file_name, parents)) = segments.split_last() else {
            return Err(ArchiveError::InvalidPath {
                path: destination.to_string(),
                reason: "path has no name segments",
            });
        };

        let dir = ensure_directories(&mut self.root, parents)?;
        let outcome = match dir.position(file_name) {
            Some(index) => {
                let Some(file) = dir.child_at_mut(index).and_then(Node::as_file_mut) else {
                    return Err(conflict(&segments, segments.len(), NodeKind::Directory));
                };
                let handle = self.store.register(source);
                let previous = file.replace_content(size, handle);
                self.store.release(previous);
                InsertOutcome::Replaced
            }
            None => {
                let handle = self.store.register(source);
                dir.add_child(Node::File(File::new(file_name.clone(), size, handle)))
                    .map_err(|_| conflict(&segments, segments.len(), NodeKind::File))?;
                InsertOutcome::Created
            }
        };

        debug!("Inserted {} ({} bytes, {:?})", segments.join("/"), size, outcome);
        Ok(outcome)
    }

    /// Insert in-memory bytes
    pub fn insert_bytes(
        &mut self,
        data: impl Into<Bytes>,
        destination: &str,
    ) -> Result<InsertOutcome> {
        self.insert(InsertSource::Bytes(data.into()), destination)
    }

    /// Insert a host file
    ///
    /// Files larger than [`ArchiveConfig::external_threshold`] are read at
    /// save or extract time instead of now.
    pub fn insert_file(
        &mut self,
        host_path: impl AsRef<Path>,
        destination: &str,
    ) -> Result<InsertOutcome> {
        self.insert(
            InsertSource::HostFile(host_path.as_ref().to_path_buf()),
            destination,
        )
    }

    /// Create a directory chain, succeeding if it already exists
    pub fn insert_dir(&mut self, destination: &str) -> Result<()> {
        let segments = path::parse_destination(destination)?;
        let mut dir = &self.root;
        for (depth, segment) in segments.iter().enumerate() {
            match dir.child(segment) {
                Some(Node::Directory(child)) => dir = child,
                Some(Node::File(_)) => return Err(conflict(&segments, depth + 1, NodeKind::File)),
                None => break,
            }
        }
        ensure_directories(&mut self.root, &segments)?;
        Ok(())
    }

    /// Import a host directory recursively under `destination`
    ///
    /// Entries are visited in file-name order so the resulting tree does
    /// not depend on the host filesystem. Returns the number of files
    /// inserted.
    pub fn insert_tree(&mut self, host_dir: impl AsRef<Path>, destination: &str) -> Result<usize> {
        let host_dir = host_dir.as_ref();
        let base = path::split(destination).join("/");
        let mut inserted = 0;

        for entry in WalkDir::new(host_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(host_dir)
                .map_err(|_| ArchiveError::InvalidPath {
                    path: entry.path().display().to_string(),
                    reason: "entry is outside the imported directory",
                })?;
            let Some(relative) = relative.to_str() else {
                return Err(ArchiveError::InvalidPath {
                    path: entry.path().display().to_string(),
                    reason: "host path is not valid UTF-8",
                });
            };
            let target = path::join(&base, &path::split(relative).join("/"));

            if entry.file_type().is_dir() {
                self.insert_dir(&target)?;
            } else if entry.file_type().is_file() {
                self.insert(InsertSource::HostFile(entry.path().to_path_buf()), &target)?;
                inserted += 1;
            }
        }

        info!(
            "Imported {} files from {} into /{}",
            inserted,
            host_dir.display(),
            base
        );
        Ok(inserted)
    }

    /// Remove every node matched by `pattern`
    ///
    /// Directories are removed with their subtrees and the content of every
    /// removed file is released from the store. A node whose ancestor is
    /// also matched is only removed once. Returns the number of nodes
    /// detached; zero means nothing matched.
    pub fn remove(&mut self, pattern: &str) -> Result<usize> {
        let mut targets: Vec<Vec<usize>> = self
            .resolve_path(pattern)?
            .into_iter()
            .map(|resolved| resolved.index_path)
            .collect();
        targets.sort();
        targets.dedup();

        let mut selected: Vec<Vec<usize>> = Vec::with_capacity(targets.len());
        for target in targets {
            if !selected.last().is_some_and(|ancestor| target.starts_with(ancestor)) {
                selected.push(target);
            }
        }

        // Later siblings first so earlier index paths stay valid
        let mut removed = 0;
        for index_path in selected.iter().rev() {
            if let Some(node) = self.root.remove_at(index_path) {
                let released = self.store.release_node(&node);
                debug!(
                    "Removed {} {} ({} content sources released)",
                    node.kind(),
                    node.name(),
                    released
                );
                removed += 1;
            }
        }

        info!("Removed {} nodes matching {:?}", removed, pattern);
        Ok(removed)
    }

    /// Read every file matched by `pattern`, keyed by path
    ///
    /// Matched directories contribute all their descendant files.
    pub fn extract(&self, pattern: &str) -> Result<BTreeMap<String, Bytes>> {
        self.matched_files(pattern)?
            .into_iter()
            .map(|(path, handle)| self.store.read(handle).map(|data| (path, data)))
            .collect()
    }

    /// Like [`extract`](Self::extract), but fail when nothing matches
    pub fn extract_exact(&self, pattern: &str) -> Result<BTreeMap<String, Bytes>> {
        let files = self.extract(pattern)?;
        if files.is_empty() {
            return Err(ArchiveError::NotFound(pattern.to_string()));
        }
        Ok(files)
    }

    /// Read every file in the archive
    pub fn extract_all(&self) -> Result<BTreeMap<String, Bytes>> {
        self.root
            .files()
            .map(|(path, file)| self.store.read(*file.payload()).map(|data| (path, data)))
            .collect()
    }

    /// Like [`extract`](Self::extract), reading files on the rayon pool
    #[cfg(feature = "parallel")]
    pub fn extract_parallel(&self, pattern: &str) -> Result<BTreeMap<String, Bytes>> {
        use rayon::prelude::*;

        self.matched_files(pattern)?
            .into_par_iter()
            .map(|(path, handle)| self.store.read(handle).map(|data| (path, data)))
            .collect()
    }

    /// Lazy listing of every node
    pub fn tree_view(&self, order: WalkOrder) -> impl Iterator<Item = TreeViewItem> + '_ {
        self.root.walk(order).map(|item| TreeViewItem {
            depth: item.depth,
            name: item.node.name().to_string(),
            path: item.path,
            kind: item.node.kind(),
            size: item.node.as_file().map(File::size),
        })
    }

    /// Box-drawing listing, see [`view::render_tree`]
    pub fn render_tree(&self) -> String {
        view::render_tree(&self.root)
    }

    /// Encode the archive with default writer settings
    pub fn save(&self) -> Result<Vec<u8>> {
        ArchiveWriter::new(self).save()
    }

    /// Encode the archive and atomically replace `path`
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<u64> {
        ArchiveWriter::new(self).write_to_path(path)
    }

    fn matched_files(&self, pattern: &str) -> Result<Vec<(String, ContentHandle)>> {
        let mut files = Vec::new();
        for resolved in self.resolve_path(pattern)? {
            match resolved.node {
                Node::File(file) => files.push((resolved.path, *file.payload())),
                Node::Directory(dir) => files.extend(
                    dir.files()
                        .map(|(path, file)| (path::join(&resolved.path, &path), *file.payload())),
                ),
            }
        }
        Ok(files)
    }

    fn check_insert(&self, segments: &[String]) -> Result<()> {
        let Some((file_name, parents)) = segments.split_last() else {
            return Ok(());
        };
        let mut dir = &self.root;
        for (depth, segment) in parents.iter().enumerate() {
            match dir.child(segment) {
                Some(Node::Directory(child)) => dir = child,
                Some(Node::File(_)) => return Err(conflict(segments, depth + 1, NodeKind::File)),
                None => return Ok(()),
            }
        }
        match dir.child(file_name) {
            Some(Node::Directory(_)) => Err(conflict(segments, segments.len(), NodeKind::Directory)),
            Some(Node::File(_)) if self.config.conflict_policy == ConflictPolicy::Reject => {
                Err(conflict(segments, segments.len(), NodeKind::File))
            }
            _ => Ok(()),
        }
    }

    fn prepare_source(&self, source: InsertSource) -> Result<(ContentSource, u32)> {
        match source {
            InsertSource::Bytes(bytes) => {
                let size = content_size(bytes.len() as u64)?;
                Ok((ContentSource::Memory(bytes), size))
            }
            InsertSource::HostFile(host_path) => {
                let len = fs::metadata(&host_path)?.len();
                let size = content_size(len)?;
                if len > self.config.external_threshold {
                    debug!("Referencing {} on disk ({} bytes)", host_path.display(), len);
                    return Ok((
                        ContentSource::External {
                            path: host_path,
                            size: len,
                        },
                        size,
                    ));
                }
                let data = fs::read(&host_path)?;
                let size = content_size(data.len() as u64)?;
                Ok((ContentSource::Memory(Bytes::from(data)), size))
            }
        }
    }

    fn stored_path(&self, index_path: &[usize]) -> String {
        let mut names = Vec::with_capacity(index_path.len());
        let mut dir = &self.root;
        for &index in index_path {
            let Some(node) = dir.child_at(index) else {
                break;
            };
            names.push(node.name());
            if let Node::Directory(child) = node {
                dir = child;
            }
        }
        names.join("/")
    }
}

/// Walk `segments` from `dir`, creating directories that do not exist
fn ensure_directories<'a>(
    mut dir: &'a mut Directory<ContentHandle>,
    segments: &[String],
) -> Result<&'a mut Directory<ContentHandle>> {
    for (depth, segment) in segments.iter().enumerate() {
        let index = match dir.position(segment) {
            Some(index) => index,
            None => {
                debug!("Creating directory {}", segments[..=depth].join("/"));
                dir.add_child(Node::Directory(Directory::new(segment.clone())))?
            }
        };
        dir = match dir.child_at_mut(index) {
            Some(Node::Directory(child)) => child,
            _ => return Err(conflict(segments, depth + 1, NodeKind::File)),
        };
    }
    Ok(dir)
}

fn conflict(segments: &[String], depth: usize, existing: NodeKind) -> ArchiveError {
    ArchiveError::NameConflict {
        path: segments[..depth].join("/"),
        existing,
    }
}

fn content_size(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| ArchiveError::ContentTooLarge(len))
}

fn default_name(dos_timestamp: u32) -> String {
    timestamp::from_dos(dos_timestamp).map_or_else(
        || "Unnamed.vdf".to_string(),
        |created| format!("Unnamed_{}.vdf", created.format("%Y-%m-%d_%H-%M-%S")),
    )
}
