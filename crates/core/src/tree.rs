//! Read-only access to a host tree.
//!
//! The projection engine never stores anything inside the host's nodes. It only
//! needs a cheap, copyable handle per node whose equality is node identity, and a
//! handful of structural and content accessors.

use core::fmt::Debug;
use core::hash::Hash;

/// The kind of a tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A node with a tag, attributes and children (an element).
    Container,
    /// A text node.
    Text,
    /// A comment node.
    Comment,
    /// Anything else (document roots, processing instructions, ...).
    Other,
}

impl NodeKind {
    /// Returns true for nodes carrying a text payload.
    #[inline]
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::Comment)
    }
}

/// A live tree the engine can inspect.
///
/// `Node` is an identity handle: two handles are equal iff they refer to the same
/// node. All accessors describe the tree as it stands *now*.
pub trait Tree {
    /// Node identity handle.
    type Node: Copy + Eq + Hash + Debug;

    /// Returns the kind of `node`.
    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Returns the current parent of `node`.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the first child of `node`.
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the sibling following `node`.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the sibling preceding `node`.
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the tag name of a container node.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// Returns the current value of an attribute on a container node.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Returns the text payload of a text or comment node.
    fn text(&self, node: Self::Node) -> Option<&str>;

    /// Iterates over the children of `node` in order.
    fn children(&self, node: Self::Node) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }
}

/// Iterator over the children of a node.
pub struct Children<'a, T: Tree> {
    tree: &'a T,
    next: Option<T::Node>,
}

impl<'a, T: Tree> Iterator for Children<'a, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
