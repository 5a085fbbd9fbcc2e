//! Lazy depth-first traversal

use crate::tree::node::{Directory, Node};

/// Where a directory appears relative to its descendants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkOrder {
    /// Directory before its children (catalog order)
    #[default]
    DirectoriesFirst,
    /// Directory after its children
    DirectoriesLast,
}

/// One visited node
#[derive(Debug, Clone)]
pub struct WalkItem<'a, T> {
    /// Nesting depth, `0` for children of the walk origin
    pub depth: usize,
    /// Slash-separated path from the walk origin, stored case
    pub path: String,
    /// Child positions from the walk origin
    pub index_path: Vec<usize>,
    /// The node itself
    pub node: &'a Node<T>,
}

struct Frame<'a, T> {
    depth: usize,
    prefix: String,
    index_path: Vec<usize>,
    children: &'a [Node<T>],
    next: usize,
    owner: Option<WalkItem<'a, T>>,
}

/// Iterator returned by [`Directory::walk`]
///
/// Uses an explicit stack, so arbitrarily deep trees never recurse.
pub struct Walk<'a, T> {
    stack: Vec<Frame<'a, T>>,
    order: WalkOrder,
}

impl<'a, T> Walk<'a, T> {
    pub(crate) fn new(origin: &'a Directory<T>, order: WalkOrder) -> Self {
        Self {
            stack: vec![Frame {
                depth: 0,
                prefix: String::new(),
                index_path: Vec::new(),
                children: origin.children(),
                next: 0,
                owner: None,
            }],
            order,
        }
    }
}

impl<'a, T> Iterator for Walk<'a, T> {
    type Item = WalkItem<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let children = frame.children;

            let Some(node) = children.get(frame.next) else {
                let finished = self.stack.pop()?;
                if let Some(owner) = finished.owner {
                    return Some(owner);
                }
                continue;
            };

            let mut index_path = frame.index_path.clone();
            index_path.push(frame.next);
            frame.next += 1;

            let depth = frame.depth;
            let path = if frame.prefix.is_empty() {
                node.name().to_string()
            } else {
                format!("{}/{}", frame.prefix, node.name())
            };
            let item = WalkItem {
                depth,
                path,
                index_path,
                node,
            };

            let Node::Directory(dir) = node else {
                return Some(item);
            };

            let mut child_frame = Frame {
                depth: depth + 1,
                prefix: item.path.clone(),
                index_path: item.index_path.clone(),
                children: dir.children(),
                next: 0,
                owner: None,
            };
            match self.order {
                WalkOrder::DirectoriesFirst => {
                    self.stack.push(child_frame);
                    return Some(item);
                }
                WalkOrder::DirectoriesLast => {
                    child_frame.owner = Some(item);
                    self.stack.push(child_frame);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::node::File;

    fn sample() -> Directory<()> {
        let mut inner = Directory::new("B");
        inner.add_child(Node::File(File::new("C.TXT", 1, ()))).unwrap();
        let mut outer = Directory::new("A");
        outer.add_child(Node::Directory(inner)).unwrap();
        outer.add_child(Node::File(File::new("D.TXT", 1, ()))).unwrap();
        let mut root = Directory::root();
        root.add_child(Node::Directory(outer)).unwrap();
        root.add_child(Node::File(File::new("E.TXT", 1, ()))).unwrap();
        root
    }

    #[test]
    fn test_walk_directories_first() {
        let root = sample();
        let visited: Vec<(usize, String)> = root
            .walk(WalkOrder::DirectoriesFirst)
            .map(|item| (item.depth, item.path))
            .collect();
        assert_eq!(
            visited,
            vec![
                (0, "A".to_string()),
                (1, "A/B".to_string()),
                (2, "A/B/C.TXT".to_string()),
                (1, "A/D.TXT".to_string()),
                (0, "E.TXT".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_directories_last() {
        let root = sample();
        let visited: Vec<String> = root
            .walk(WalkOrder::DirectoriesLast)
            .map(|item| item.path)
            .collect();
        assert_eq!(visited, vec!["A/B/C.TXT", "A/B", "A/D.TXT", "A", "E.TXT"]);
    }

    #[test]
    fn test_walk_index_paths_resolve() {
        let root = sample();
        for item in root.walk(WalkOrder::DirectoriesFirst) {
            let node = root.node_at(&item.index_path).expect("index path resolves");
            assert_eq!(node.name(), item.node.name());
        }
    }

    #[test]
    fn test_walk_empty() {
        let root: Directory<()> = Directory::root();
        assert_eq!(root.walk(WalkOrder::DirectoriesLast).count(), 0);
    }
}
