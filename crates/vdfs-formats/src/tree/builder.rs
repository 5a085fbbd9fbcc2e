//! Flat entry list to tree conversion and back

use crate::catalog::VdfEntry;
use crate::tree::error::{TreeError, TreeResult};
use crate::tree::node::{Directory, File, Node};

/// A directory whose children are still being read
struct Frame<T> {
    dir: Directory<T>,
    /// Catalog index of the next child
    next: usize,
    /// Children directly follow the directory entry, so the parent resumes after them
    inline: bool,
    /// The directory entry itself carried `LAST`, so closing it closes the parent too
    closes_parent: bool,
}

impl<T> Frame<T> {
    fn attach(&mut self, node: Node<T>) -> TreeResult<()> {
        self.dir.add_child(node).map(|_| ())
    }
}

/// Build a tree from the flat catalog entries.
///
/// `file_payload` is called once per file entry, in tree order, and its
/// result becomes the file node's payload.
///
/// A directory's offset is the index of its first child. Two layouts are
/// read:
///
/// - depth-first, where the children directly follow the directory
///   (`offset == index + 1`) and the parent level resumes after the subtree
/// - child blocks, where `offset` points at a contiguous run of siblings
///   elsewhere in the catalog, ending with `LAST`
///
/// Walks the list with an explicit stack of open directories. The root is
/// the bottom frame and starts at index `0`. Every entry must be reached
/// exactly once.
pub fn build<T, F>(entries: &[VdfEntry], mut file_payload: F) -> TreeResult<Directory<T>>
where
    F: FnMut(&VdfEntry) -> T,
{
    if entries.is_empty() {
        return Ok(Directory::root());
    }

    let mut claimed = vec![false; entries.len()];
    let mut stack = vec![Frame {
        dir: Directory::root(),
        next: 0,
        inline: false,
        closes_parent: false,
    }];

    let root = loop {
        let open = stack.len();
        let Some(top) = stack.last_mut() else {
            return Err(TreeError::UnclosedDirectories { open });
        };
        let index = top.next;
        let Some(entry) = entries.get(index) else {
            return Err(TreeError::UnclosedDirectories { open });
        };
        if std::mem::replace(&mut claimed[index], true) {
            return Err(TreeError::SharedEntry {
                index,
                name: entry.name.clone(),
            });
        }
        if entry.name.is_empty() {
            return Err(TreeError::EmptyName { index });
        }
        top.next += 1;

        if entry.is_directory() {
            let dir = Directory::with_attributes(entry.name.clone(), entry.attributes)
                .with_extra_flags(entry.flags.extra());
            let first_child = entry.offset as usize;
            if first_child != 0 {
                if first_child >= entries.len() {
                    return Err(TreeError::ChildIndexOutOfRange {
                        index,
                        name: entry.name.clone(),
                        found: entry.offset,
                        count: entries.len(),
                    });
                }
                stack.push(Frame {
                    dir,
                    next: first_child,
                    inline: first_child == index + 1,
                    closes_parent: entry.is_last(),
                });
                continue;
            }

            top.attach(Node::Directory(dir))?;
        } else {
            let payload = file_payload(entry);
            top.attach(Node::File(
                File::with_attributes(entry.name.clone(), entry.size, entry.attributes, payload)
                    .with_extra_flags(entry.flags.extra()),
            ))?;
        }

        if entry.is_last()
            && let Some(root) = close_levels(&mut stack)?
        {
            break root;
        }
    };

    if let Some(index) = claimed.iter().position(|&reached| !reached) {
        return Err(TreeError::StackUnderflow {
            index,
            name: entries[index].name.clone(),
        });
    }
    Ok(root)
}

/// Close the top frame, cascading while closed directories were themselves last.
///
/// Returns the root once the bottom frame closes.
fn close_levels<T>(stack: &mut Vec<Frame<T>>) -> TreeResult<Option<Directory<T>>> {
    while let Some(frame) = stack.pop() {
        let Some(parent) = stack.last_mut() else {
            return Ok(Some(frame.dir));
        };
        if frame.inline {
            parent.next = frame.next;
        }
        parent.attach(Node::Directory(frame.dir))?;
        if !frame.closes_parent {
            break;
        }
    }
    Ok(None)
}

/// Flatten a tree into catalog order.
///
/// Depth-first: each directory entry is immediately followed by its
/// children, and the final sibling at every level is marked `LAST`.
/// Non-empty directories store the index of their first child; file
/// offsets are left at `0` for the writer to fill in. Extra flag bits kept
/// on the nodes are written back.
pub fn flatten<T>(root: &Directory<T>) -> Vec<VdfEntry> {
    let mut entries = Vec::with_capacity(root.node_count());
    emit_children(root.children(), &mut entries);
    entries
}

fn emit_children<T>(children: &[Node<T>], out: &mut Vec<VdfEntry>) {
    let last = children.len().saturating_sub(1);
    for (position, child) in children.iter().enumerate() {
        let mut entry = match child {
            Node::File(file) => VdfEntry::file(file.name(), file.size(), file.attributes()),
            Node::Directory(dir) => {
                let first_child = if dir.is_empty() {
                    0
                } else {
                    out.len() as u32 + 1
                };
                VdfEntry::directory(dir.name(), first_child, dir.attributes())
            }
        };
        entry.flags.set(child.extra_flags());
        if position == last {
            entry.mark_last();
        }
        out.push(entry);

        if let Node::Directory(dir) = child {
            emit_children(dir.children(), out);
        }
    }
}
