//! An arena-backed tree that records its own mutations.
//!
//! `Document` is a minimal host for the projection engine: it owns its nodes,
//! hands out copyable [`NodeId`] handles, and, while observed, emits a
//! [`MutationRecord`] for every change in emission order, the way a live DOM
//! mutation observer would.
//!
//! ```
//! use canopy_core::{Document, ObserverOptions, Tree};
//!
//! let mut doc = Document::new();
//! doc.observe(ObserverOptions::everything());
//!
//! let div = doc.create_element("div");
//! doc.append_child(doc.root(), div).unwrap();
//! doc.set_attribute(div, "class", "note").unwrap();
//!
//! assert_eq!(doc.tag_name(div), Some("DIV"));
//! assert_eq!(doc.take_records().len(), 2);
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::options::ObserverOptions;
use crate::record::MutationRecord;
use crate::tree::{NodeKind, Tree};

/// Handle to a node owned by a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    tag_name: Option<String>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag_name: None,
            attributes: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An owned tree of nodes plus an optional mutation recorder.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    observer: Option<ObserverOptions>,
    records: Vec<MutationRecord<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document containing only its root node.
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![NodeData::new(NodeKind::Other)],
            root: NodeId(0),
            observer: None,
            records: Vec::new(),
        }
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of nodes ever created, attached or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the document holds only its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Creates a detached container. The tag is upper-cased.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Container);
        data.tag_name = Some(tag_name.to_ascii_uppercase());
        self.push(data)
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = Some(text.to_string());
        self.push(data)
    }

    /// Creates a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Comment);
        data.text = Some(text.to_string());
        self.push(data)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    fn data(&self, node: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(node.index())
            .ok_or_else(|| Error::hierarchy(alloc::format!("unknown node {:?}", node)))
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node.index())
            .ok_or_else(|| Error::hierarchy(alloc::format!("unknown node {:?}", node)))
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes.get(n.index()).and_then(|d| d.parent);
        }
        false
    }

    /// Returns the current children of `node`.
    pub fn child_ids(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    fn sibling_at(&self, parent: NodeId, index: Option<usize>) -> Option<NodeId> {
        index.and_then(|i| self.child_ids(parent).get(i).copied())
    }

    fn record(&mut self, record: MutationRecord<NodeId>) {
        if let Some(options) = &self.observer {
            if options.accepts_record(&record) {
                self.records.push(record);
            }
        }
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or last if `reference` is `None`.
    ///
    /// A child that already has a parent is removed from it first, producing its own
    /// removal record.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent_kind = self.data(parent)?.kind;
        self.data(child)?;
        if !matches!(parent_kind, NodeKind::Container | NodeKind::Other) {
            return Err(Error::hierarchy("parent cannot have children"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::hierarchy("cannot insert a node into its own subtree"));
        }
        if reference == Some(child) {
            return Err(Error::hierarchy("reference node is the inserted node"));
        }
        if let Some(reference) = reference {
            if self.data(reference)?.parent != Some(parent) {
                return Err(Error::hierarchy("reference node is not a child of parent"));
            }
        }

        if let Some(old_parent) = self.data(child)?.parent {
            self.remove_child(old_parent, child)?;
        }

        let index = match reference {
            Some(reference) => self
                .child_ids(parent)
                .iter()
                .position(|&c| c == reference)
                .ok_or_else(|| Error::hierarchy("reference node is not a child of parent"))?,
            None => self.child_ids(parent).len(),
        };
        let previous = self.sibling_at(parent, index.checked_sub(1));

        self.data_mut(parent)?.children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);

        self.record(MutationRecord::insertion(parent, child, previous, reference));
        Ok(())
    }

    /// Removes `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self
            .data(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| Error::hierarchy("node is not a child of parent"))?;
        let previous = self.sibling_at(parent, index.checked_sub(1));
        let next = self.sibling_at(parent, Some(index + 1));

        self.data_mut(parent)?.children.remove(index);
        self.data_mut(child)?.parent = None;

        self.record(MutationRecord::removal(parent, child, previous, next));
        Ok(())
    }

    /// Removes `node` from its parent, if it has one.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        match self.data(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Sets an attribute on a container.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let data = self.data_mut(node)?;
        if data.kind != NodeKind::Container {
            return Err(Error::hierarchy("only containers carry attributes"));
        }
        let old_value = match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, current)) => Some(core::mem::replace(current, value.to_string())),
            None => {
                data.attributes.push((name.to_string(), value.to_string()));
                None
            }
        };
        self.record_attribute(node, name, old_value);
        Ok(())
    }

    /// Removes an attribute from a container. Removing an absent attribute is a no-op.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        let data = self.data_mut(node)?;
        if data.kind != NodeKind::Container {
            return Err(Error::hierarchy("only containers carry attributes"));
        }
        let Some(index) = data.attributes.iter().position(|(n, _)| n == name) else {
            return Ok(());
        };
        let (_, old_value) = data.attributes.remove(index);
        self.record_attribute(node, name, Some(old_value));
        Ok(())
    }

    fn record_attribute(&mut self, node: NodeId, name: &str, old_value: Option<String>) {
        let keep_old = self
            .observer
            .as_ref()
            .map(|o| o.attribute_old_value)
            .unwrap_or(false);
        self.record(MutationRecord::Attributes {
            target: node,
            name: name.to_string(),
            old_value: if keep_old { old_value } else { None },
        });
    }

    /// Replaces the payload of a text or comment node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let data = self.data_mut(node)?;
        if !data.kind.is_character_data() {
            return Err(Error::hierarchy("only text and comment nodes carry text"));
        }
        let old_value = data.text.replace(text.to_string());
        let keep_old = self
            .observer
            .as_ref()
            .map(|o| o.character_data_old_value)
            .unwrap_or(false);
        self.record(MutationRecord::CharacterData {
            target: node,
            old_value: if keep_old { old_value } else { None },
        });
        Ok(())
    }

    /// Starts recording mutations matching `options`, replacing any previous options.
    pub fn observe(&mut self, options: ObserverOptions) {
        self.observer = Some(options);
    }

    /// Stops recording and discards records not yet taken.
    pub fn disconnect(&mut self) {
        self.observer = None;
        self.records.clear();
    }

    /// Returns true while mutations are being recorded.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.observer.is_some()
    }

    /// Drains the recorded mutations in emission order.
    pub fn take_records(&mut self) -> Vec<MutationRecord<NodeId>> {
        core::mem::take(&mut self.records)
    }

    /// Collects the root and all its descendants in document order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.child_ids(node).iter().rev().copied());
        }
        out
    }
}

impl Tree for Document {
    type Node = NodeId;

    fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes
            .get(node.index())
            .map(|d| d.kind)
            .unwrap_or(NodeKind::Other)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|d| d.parent)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.child_ids(node).first().copied()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.child_ids(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.child_ids(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.index())?.tag_name.as_deref()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.index())?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.index())?.text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_build_and_navigate() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("p");
        let b = doc.create_text("hello");
        let c = doc.create_comment("note");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.insert_before(root, c, Some(b)).unwrap();

        assert_eq!(doc.child_ids(root), &[a, c, b]);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, c, b]);
        assert_eq!(doc.previous_sibling(b), Some(c));
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.parent(c), Some(root));
        assert_eq!(doc.kind(b), NodeKind::Text);
        assert_eq!(doc.text(b), Some("hello"));
        assert_eq!(doc.tag_name(a), Some("P"));
        assert_eq!(doc.descendants(), vec![root, a, c, b]);
    }

    #[test]
    fn test_nothing_recorded_until_observed() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        doc.append_child(doc.root(), a).unwrap();
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn test_insert_records_siblings() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();

        doc.observe(ObserverOptions::child_list());
        let c = doc.create_element("c");
        doc.insert_before(root, c, Some(b)).unwrap();

        assert_eq!(
            doc.take_records(),
            vec![MutationRecord::insertion(root, c, Some(a), Some(b))]
        );
    }

    #[test]
    fn test_move_records_removal_then_insertion() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        let q = doc.create_element("q");
        doc.append_child(root, p).unwrap();
        doc.append_child(root, q).unwrap();

        doc.observe(ObserverOptions::child_list());
        doc.insert_before(root, q, Some(p)).unwrap();

        assert_eq!(
            doc.take_records(),
            vec![
                MutationRecord::removal(root, q, Some(p), None),
                MutationRecord::insertion(root, q, None, Some(p)),
            ]
        );
        assert_eq!(doc.child_ids(root), &[q, p]);
    }

    #[test]
    fn test_attribute_records_honor_options() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "class", "x").unwrap();

        let mut options = ObserverOptions::child_list();
        options.watch_attributes(Some(["class"]));
        doc.observe(options);

        doc.set_attribute(div, "class", "y").unwrap();
        doc.set_attribute(div, "id", "main").unwrap();
        doc.remove_attribute(div, "class").unwrap();
        doc.remove_attribute(div, "missing").unwrap();

        assert_eq!(
            doc.take_records(),
            vec![
                MutationRecord::Attributes {
                    target: div,
                    name: "class".into(),
                    old_value: Some("x".into()),
                },
                MutationRecord::Attributes {
                    target: div,
                    name: "class".into(),
                    old_value: Some("y".into()),
                },
            ]
        );
        assert_eq!(doc.attribute(div, "class"), None);
        assert_eq!(doc.attribute(div, "id"), Some("main"));
    }

    #[test]
    fn test_character_data_records() {
        let mut doc = Document::new();
        let text = doc.create_text("a");
        doc.observe(ObserverOptions::everything());
        doc.set_text(text, "b").unwrap();
        assert_eq!(
            doc.take_records(),
            vec![MutationRecord::CharacterData {
                target: text,
                old_value: Some("a".into()),
            }]
        );
    }

    #[test]
    fn test_hierarchy_errors_leave_tree_untouched() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        let text = doc.create_text("t");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.observe(ObserverOptions::everything());

        assert!(doc.append_child(inner, outer).is_err());
        assert!(doc.append_child(outer, outer).is_err());
        assert!(doc.append_child(text, inner).is_err());
        assert!(doc.remove_child(root, inner).is_err());
        assert!(doc.insert_before(root, text, Some(inner)).is_err());
        assert!(doc.set_attribute(text, "id", "x").is_err());
        assert!(doc.set_text(outer, "x").is_err());

        assert_eq!(doc.child_ids(root), &[outer]);
        assert_eq!(doc.child_ids(outer), &[inner]);
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn test_disconnect_discards_pending() {
        let mut doc = Document::new();
        doc.observe(ObserverOptions::child_list());
        let a = doc.create_element("a");
        doc.append_child(doc.root(), a).unwrap();
        doc.disconnect();
        assert!(!doc.is_observed());
        assert!(doc.take_records().is_empty());
    }
}
