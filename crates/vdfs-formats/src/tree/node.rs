//! Owned directory tree nodes

use crate::catalog::{DEFAULT_ATTRIBUTES, EntryFlags};
use crate::tree::error::{TreeError, TreeResult};
use crate::tree::walk::{Walk, WalkOrder};

/// Case-insensitive name comparison used for every sibling lookup
pub fn names_equal(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Directory node
    Directory,
    /// File node
    File,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A node in the directory tree
///
/// `T` is the file payload: whatever the owner uses to locate content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<T> {
    /// Directory with ordered children
    Directory(Directory<T>),
    /// File leaf
    File(File<T>),
}

impl<T> Node<T> {
    /// Node name
    pub fn name(&self) -> &str {
        match self {
            Self::Directory(dir) => dir.name(),
            Self::File(file) => file.name(),
        }
    }

    /// Node kind
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Directory(_) => NodeKind::Directory,
            Self::File(_) => NodeKind::File,
        }
    }

    /// Check if this is a directory
    pub const fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Attribute word
    pub const fn attributes(&self) -> u32 {
        match self {
            Self::Directory(dir) => dir.attributes,
            Self::File(file) => file.attributes,
        }
    }

    /// Flag bits other than `DIRECTORY` and `LAST`
    pub const fn extra_flags(&self) -> u32 {
        match self {
            Self::Directory(dir) => dir.extra_flags,
            Self::File(file) => file.extra_flags,
        }
    }

    /// Borrow as a directory
    pub const fn as_directory(&self) -> Option<&Directory<T>> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Borrow mutably as a directory
    pub fn as_directory_mut(&mut self) -> Option<&mut Directory<T>> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Borrow as a file
    pub const fn as_file(&self) -> Option<&File<T>> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }

    /// Borrow mutably as a file
    pub fn as_file_mut(&mut self) -> Option<&mut File<T>> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }

    fn map_with<U, F: FnMut(&T) -> U>(&self, f: &mut F) -> Node<U> {
        match self {
            Self::Directory(dir) => Node::Directory(dir.map_with(f)),
            Self::File(file) => Node::File(File {
                name: file.name.clone(),
                attributes: file.attributes,
                extra_flags: file.extra_flags,
                size: file.size,
                payload: f(&file.payload),
            }),
        }
    }
}

/// Directory node, exclusively owning its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory<T> {
    name: String,
    attributes: u32,
    extra_flags: u32,
    children: Vec<Node<T>>,
}

impl<T> Directory<T> {
    /// Create the unnamed root directory
    pub const fn root() -> Self {
        Self {
            name: String::new(),
            attributes: DEFAULT_ATTRIBUTES,
            extra_flags: 0,
            children: Vec::new(),
        }
    }

    /// Create an empty directory with default attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_attributes(name, DEFAULT_ATTRIBUTES)
    }

    /// Create an empty directory with an explicit attribute word
    pub fn with_attributes(name: impl Into<String>, attributes: u32) -> Self {
        Self {
            name: name.into(),
            attributes,
            extra_flags: 0,
            children: Vec::new(),
        }
    }

    /// Carry unrecognized flag bits through to the catalog
    #[must_use]
    pub const fn with_extra_flags(mut self, extra_flags: u32) -> Self {
        self.extra_flags = extra_flags & !EntryFlags::STRUCTURAL;
        self
    }

    /// Directory name (empty for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute word
    pub const fn attributes(&self) -> u32 {
        self.attributes
    }

    /// Flag bits written back next to `DIRECTORY` and `LAST`
    pub const fn extra_flags(&self) -> u32 {
        self.extra_flags
    }

    /// Children in insertion order
    pub fn children(&self) -> &[Node<T>] {
        &self.children
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if the directory has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Position of the child with the given name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| names_equal(child.name(), name))
    }

    /// Child with the given name
    pub fn child(&self, name: &str) -> Option<&Node<T>> {
        self.position(name).map(|i| &self.children[i])
    }

    /// Mutable child with the given name
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node<T>> {
        self.position(name).map(|i| &mut self.children[i])
    }

    /// Child at a position
    pub fn child_at(&self, index: usize) -> Option<&Node<T>> {
        self.children.get(index)
    }

    /// Mutable child at a position
    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.children.get_mut(index)
    }

    /// Append a child, rejecting case-insensitive name collisions
    pub fn add_child(&mut self, node: Node<T>) -> TreeResult<usize> {
        if self.position(node.name()).is_some() {
            return Err(TreeError::DuplicateName(node.name().to_string()));
        }
        self.children.push(node);
        Ok(self.children.len() - 1)
    }

    /// Detach the child at a position
    pub fn remove_child(&mut self, index: usize) -> Option<Node<T>> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Look up a path given as name segments, returning its index path
    pub fn find_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<(Vec<usize>, &Node<T>)> {
        let (last, parents) = segments.split_last()?;
        let mut index_path = Vec::with_capacity(segments.len());
        let mut dir = self;
        for segment in parents {
            let index = dir.position(segment.as_ref())?;
            index_path.push(index);
            dir = dir.children[index].as_directory()?;
        }
        let index = dir.position(last.as_ref())?;
        index_path.push(index);
        Some((index_path, &dir.children[index]))
    }

    /// Node at an index path from this directory
    pub fn node_at(&self, index_path: &[usize]) -> Option<&Node<T>> {
        let (last, parents) = index_path.split_last()?;
        let mut dir = self;
        for &index in parents {
            dir = dir.children.get(index)?.as_directory()?;
        }
        dir.children.get(*last)
    }

    /// Detach the node at an index path
    pub fn remove_at(&mut self, index_path: &[usize]) -> Option<Node<T>> {
        let (last, parents) = index_path.split_last()?;
        let mut dir = self;
        for &index in parents {
            dir = dir.children.get_mut(index)?.as_directory_mut()?;
        }
        dir.remove_child(*last)
    }

    /// Lazy depth-first traversal of all descendants
    pub fn walk(&self, order: WalkOrder) -> Walk<'_, T> {
        Walk::new(self, order)
    }

    /// All descendant files with their paths, in catalog order
    pub fn files(&self) -> impl Iterator<Item = (String, &File<T>)> {
        self.walk(WalkOrder::DirectoriesFirst)
            .filter_map(|item| item.node.as_file().map(|file| (item.path, file)))
    }

    /// Number of descendant files
    pub fn file_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Node::Directory(dir) => dir.file_count(),
                Node::File(_) => 1,
            })
            .sum()
    }

    /// Number of descendant nodes of either kind
    pub fn node_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Node::Directory(dir) => 1 + dir.node_count(),
                Node::File(_) => 1,
            })
            .sum()
    }

    /// Copy the tree shape with every file payload transformed
    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> Directory<U> {
        self.map_with(&mut f)
    }

    fn map_with<U, F: FnMut(&T) -> U>(&self, f: &mut F) -> Directory<U> {
        Directory {
            name: self.name.clone(),
            attributes: self.attributes,
            extra_flags: self.extra_flags,
            children: self.children.iter().map(|c| c.map_with(f)).collect(),
        }
    }
}

impl<T> Default for Directory<T> {
    fn default() -> Self {
        Self::root()
    }
}

/// File leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File<T> {
    name: String,
    attributes: u32,
    extra_flags: u32,
    size: u32,
    payload: T,
}

impl<T> File<T> {
    /// Create a file with default attributes
    pub fn new(name: impl Into<String>, size: u32, payload: T) -> Self {
        Self::with_attributes(name, size, DEFAULT_ATTRIBUTES, payload)
    }

    /// Create a file with an explicit attribute word
    pub fn with_attributes(name: impl Into<String>, size: u32, attributes: u32, payload: T) -> Self {
        Self {
            name: name.into(),
            attributes,
            extra_flags: 0,
            size,
            payload,
        }
    }

    /// Carry unrecognized flag bits through to the catalog
    #[must_use]
    pub const fn with_extra_flags(mut self, extra_flags: u32) -> Self {
        self.extra_flags = extra_flags & !EntryFlags::STRUCTURAL;
        self
    }

    /// File name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content size in bytes
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Attribute word
    pub const fn attributes(&self) -> u32 {
        self.attributes
    }

    /// Flag bits written back next to `LAST`
    pub const fn extra_flags(&self) -> u32 {
        self.extra_flags
    }

    /// Content payload
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// Swap in new content, returning the previous payload
    pub fn replace_content(&mut self, size: u32, payload: T) -> T {
        self.size = size;
        std::mem::replace(&mut self.payload, payload)
    }
}
