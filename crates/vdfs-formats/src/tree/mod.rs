//! VDF directory tree
//!
//! The catalog stores the tree as a flat list. A directory entry's offset
//! is the index of its first child, and the final sibling at each level
//! carries `LAST`. [`flatten`] writes the depth-first layout, where a
//! directory entry is followed by its descendants and whatever follows the
//! close of a level belongs to the next ancestor. [`build`] also reads
//! catalogs whose directories point at child blocks elsewhere in the list,
//! and `build(flatten(tree)) == tree`.
//!
//! Nodes exclusively own their children. Callers that need to remember a
//! position keep an index path (child positions from the root) rather than
//! a reference, see [`Directory::node_at`].

mod builder;
mod error;
mod node;
mod walk;

pub use builder::{build, flatten};
pub use error::{TreeError, TreeResult};
pub use node::{Directory, File, Node, NodeKind, names_equal};
pub use walk::{Walk, WalkItem, WalkOrder};
