//! Tree listings

use std::fmt::Write;

use vdfs_formats::{Directory, Node, NodeKind};

/// One node of a tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeViewItem {
    /// Nesting depth, 0 for children of the root
    pub depth: usize,
    /// Node name as stored
    pub name: String,
    /// Full path from the root
    pub path: String,
    /// Directory or file
    pub kind: NodeKind,
    /// File size, `None` for directories
    pub size: Option<u32>,
}

/// Render a box-drawing listing of the tree
///
/// Siblings are sorted directories first, then by case-insensitive name.
/// Names are title-cased for display and directory names are shown in
/// brackets. [`TreeViewItem`] carries the stored names.
///
/// ```text
/// ├── [_Work]
/// │   └── [Data]
/// │       └── Humans.Mds
/// └── Readme.Txt
/// ```
pub fn render_tree<T>(root: &Directory<T>) -> String {
    let mut out = String::new();
    render_level(root, "", &mut out);
    out
}

fn render_level<T>(dir: &Directory<T>, indent: &str, out: &mut String) {
    let mut children: Vec<&Node<T>> = dir.children().iter().collect();
    children.sort_by_cached_key(|child| (!child.is_dir(), child.name().to_lowercase()));

    let total = children.len();
    for (position, child) in children.into_iter().enumerate() {
        let is_last = position + 1 == total;
        let connector = if is_last { "└── " } else { "├── " };
        match child {
            Node::Directory(sub) => {
                let _ = writeln!(out, "{indent}{connector}[{}]", title_case(sub.name()));
                let extension = if is_last { "    " } else { "│   " };
                render_level(sub, &format!("{indent}{extension}"), out);
            }
            Node::File(file) => {
                let _ = writeln!(out, "{indent}{connector}{}", title_case(file.name()));
            }
        }
    }
}

/// Upper-case the first letter of every run of letters, lower-case the rest
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_lowercase() || c.is_uppercase();
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vdfs_formats::File;

    #[test]
    fn test_render_sorted_with_connectors() {
        let mut data = Directory::new("DATA");
        data.add_child(Node::File(File::new("b.mds", 1, ())))
            .expect("Operation should succeed");
        data.add_child(Node::File(File::new("A.MDS", 1, ())))
            .expect("Operation should succeed");

        let mut root = Directory::root();
        root.add_child(Node::File(File::new("README.TXT", 1, ())))
            .expect("Operation should succeed");
        root.add_child(Node::Directory(data))
            .expect("Operation should succeed");
        root.add_child(Node::Directory(Directory::new("EMPTY")))
            .expect("Operation should succeed");

        let expected = "\
├── [Data]
│   ├── A.Mds
│   └── B.Mds
├── [Empty]
└── Readme.Txt
";
        assert_eq!(render_tree(&root), expected);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("HUM_BODY_NAKED0.ASC"), "Hum_Body_Naked0.Asc");
        assert_eq!(title_case("_work"), "_Work");
        assert_eq!(title_case("t_1hrun_2_1h.man"), "T_1Hrun_2_1H.Man");
        assert_eq!(title_case("\u{E4}RGER"), "\u{C4}rger");
    }

    #[test]
    fn test_render_empty() {
        let root: Directory<()> = Directory::root();
        assert_eq!(render_tree(&root), "");
    }
}
