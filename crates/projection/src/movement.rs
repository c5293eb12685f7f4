//! Movement detection for nodes that kept their parent.
//!
//! For every parent whose child list changed (and which itself stayed inside
//! the observed region), the batch's child-list records are replayed to split
//! the touched children into:
//!
//! - `added`: inserted and not removed earlier in the batch
//! - `removed`: removed and not inserted again
//! - `maybe_moved`: removed, then inserted again
//!
//! together with each child's *old previous sibling* as seen by the records.
//!
//! A maybe-moved node moved if its previous sibling among the nodes that stayed
//! put differs between the old and the current order. That question is mutually
//! recursive (whether a node moved depends on whether its neighbours moved), so
//! resolution marks nodes as pending and breaks cycles deterministically: a
//! pending node re-entered is "moved" only if no earlier sibling is also pending.

use alloc::vec::Vec;
use canopy_core::{MutationRecord, Tree};
use core::hash::Hash;

use crate::node_map::{NodeMap, NodeSet};

/// Child-list facts for one parent.
#[derive(Clone, Debug)]
pub struct ChildListChange<N> {
    added: NodeSet<N>,
    removed: NodeSet<N>,
    maybe_moved: NodeSet<N>,
    old_previous: NodeMap<N, Option<N>>,
    moved: Option<NodeMap<N, bool>>,
}

impl<N> Default for ChildListChange<N>
where
    N: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self {
            added: NodeSet::new(),
            removed: NodeSet::new(),
            maybe_moved: NodeSet::new(),
            old_previous: NodeMap::new(),
            moved: None,
        }
    }
}

impl<N> ChildListChange<N>
where
    N: Copy + Eq + Hash,
{
    /// Returns true if `node` was inserted without an earlier removal.
    #[inline]
    pub fn is_added(&self, node: N) -> bool {
        self.added.has(node)
    }

    /// Returns true if `node` was removed and not inserted again.
    #[inline]
    pub fn is_removed(&self, node: N) -> bool {
        self.removed.has(node)
    }

    /// Returns true if `node` was removed and inserted again.
    #[inline]
    pub fn is_maybe_moved(&self, node: N) -> bool {
        self.maybe_moved.has(node)
    }

    fn record_old_previous(&mut self, node: Option<N>, previous: Option<N>) {
        let Some(node) = node else {
            return;
        };
        if self.old_previous.has(node) || self.added.has(node) || self.maybe_moved.has(node) {
            return;
        }
        if let Some(previous) = previous {
            if self.added.has(previous) || self.maybe_moved.has(previous) {
                return;
            }
        }
        self.old_previous.set(node, previous);
    }

    fn apply(&mut self, removed: &[N], added: &[N], previous_sibling: Option<N>, next_sibling: Option<N>) {
        let mut old_previous = previous_sibling;
        for &node in removed {
            self.record_old_previous(Some(node), old_previous);
            if self.added.has(node) {
                self.added.delete(node);
            } else {
                self.removed.insert(node);
                self.maybe_moved.delete(node);
            }
            old_previous = Some(node);
        }

        self.record_old_previous(next_sibling, old_previous);

        for &node in added {
            if self.removed.has(node) {
                self.removed.delete(node);
                self.maybe_moved.insert(node);
            } else {
                self.added.insert(node);
            }
        }
    }
}

/// Lazily built per-parent child-list facts for one batch.
#[derive(Clone, Debug)]
pub struct MovementDetector<N> {
    parents: Option<NodeMap<N, ChildListChange<N>>>,
}

impl<N> Default for MovementDetector<N> {
    fn default() -> Self {
        Self { parents: None }
    }
}

impl<N> MovementDetector<N>
where
    N: Copy + Eq + Hash + core::fmt::Debug,
{
    /// Creates an unbuilt detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`build`](Self::build) has run.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.parents.is_some()
    }

    /// Replays the child-list records of a batch.
    ///
    /// Only records whose target satisfies `stayed_in` are considered: children
    /// of parents that entered or left the region cannot be reordered within it.
    pub fn build<F>(&mut self, records: &[MutationRecord<N>], mut stayed_in: F)
    where
        F: FnMut(N) -> bool,
    {
        let mut parents: NodeMap<N, ChildListChange<N>> = NodeMap::new();
        for record in records {
            let MutationRecord::ChildList {
                target,
                removed,
                added,
                previous_sibling,
                next_sibling,
            } = record
            else {
                continue;
            };
            if !stayed_in(*target) {
                continue;
            }
            parents
                .get_or_insert_with(*target, ChildListChange::default)
                .apply(removed, added, *previous_sibling, *next_sibling);
        }
        self.parents = Some(parents);
    }

    /// Returns the child-list facts recorded for `parent`.
    pub fn parent_change(&self, parent: N) -> Option<&ChildListChange<N>> {
        self.parents.as_ref()?.get(parent)
    }

    /// Returns true if `node` moved among the siblings that stayed under its
    /// parent. Resolves every maybe-moved child of that parent on first use.
    pub fn was_reordered<T>(&mut self, tree: &T, node: N) -> bool
    where
        T: Tree<Node = N>,
    {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        let Some(change) = self.parents.as_mut().and_then(|p| p.get_mut(parent)) else {
            return false;
        };

        if change.moved.is_none() {
            let moved = MoveResolver::new(tree, change).resolve();
            change.moved = Some(moved);
        }

        change
            .moved
            .as_ref()
            .and_then(|moved| moved.get(node).copied())
            .unwrap_or(false)
    }
}

/// Resolution state for the maybe-moved children of one parent.
struct MoveResolver<'a, T: Tree> {
    tree: &'a T,
    change: &'a ChildListChange<T::Node>,
    moved: NodeMap<T::Node, bool>,
    pending: NodeSet<T::Node>,
    old_previous_cache: NodeMap<T::Node, Option<T::Node>>,
    previous_cache: NodeMap<T::Node, Option<T::Node>>,
}

impl<'a, T: Tree> MoveResolver<'a, T> {
    fn new(tree: &'a T, change: &'a ChildListChange<T::Node>) -> Self {
        Self {
            tree,
            change,
            moved: NodeMap::new(),
            pending: NodeSet::new(),
            old_previous_cache: NodeMap::new(),
            previous_cache: NodeMap::new(),
        }
    }

    fn resolve(mut self) -> NodeMap<T::Node, bool> {
        for node in self.change.maybe_moved.keys() {
            self.is_moved(Some(node));
        }
        self.moved
    }

    fn is_first_of_pending(&self, node: T::Node) -> bool {
        let mut current = self.tree.previous_sibling(node);
        while let Some(sibling) = current {
            if self.pending.has(sibling) {
                return false;
            }
            current = self.tree.previous_sibling(sibling);
        }
        true
    }

    fn is_moved(&mut self, node: Option<T::Node>) -> bool {
        let Some(node) = node else {
            return false;
        };
        if !self.change.maybe_moved.has(node) {
            return false;
        }
        if let Some(&did_move) = self.moved.get(node) {
            return did_move;
        }

        let mut did_move = if self.pending.has(node) {
            self.is_first_of_pending(node)
        } else {
            self.pending.insert(node);
            let previous = self.previous(node);
            let old_previous = self.old_previous(node);
            previous != old_previous
        };

        if self.pending.has(node) {
            self.pending.delete(node);
            self.moved.set(node, did_move);
        } else if let Some(&decided) = self.moved.get(node) {
            // A re-entrant visit settled this node while it was pending.
            did_move = decided;
        }

        log::trace!("maybe-moved {:?} resolved as moved={}", node, did_move);
        did_move
    }

    /// The node's previous sibling in the old order, skipping removed and moved nodes.
    ///
    /// Cycles through `is_moved` are cut by its pending set, so re-entering
    /// this lookup for a node still being resolved recomputes the same chain.
    fn old_previous(&mut self, node: T::Node) -> Option<T::Node> {
        if let Some(&cached) = self.old_previous_cache.get(node) {
            return cached;
        }

        let mut old_previous = self.change.old_previous.get(node).copied();
        while let Some(Some(previous)) = old_previous {
            if self.change.removed.has(previous) || self.is_moved(Some(previous)) {
                old_previous = Some(self.old_previous(previous));
            } else {
                break;
            }
        }
        let resolved = match old_previous {
            Some(previous) => previous,
            None => self.tree.previous_sibling(node),
        };

        self.old_previous_cache.set(node, resolved);
        resolved
    }

    /// The node's previous sibling in the current order, skipping added and moved nodes.
    fn previous(&mut self, node: T::Node) -> Option<T::Node> {
        if let Some(&cached) = self.previous_cache.get(node) {
            return cached;
        }

        let mut previous = self.tree.previous_sibling(node);
        while let Some(sibling) = previous {
            if self.change.added.has(sibling) || self.is_moved(Some(sibling)) {
                previous = self.tree.previous_sibling(sibling);
            } else {
                break;
            }
        }

        self.previous_cache.set(node, previous);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use canopy_core::{Document, NodeId, ObserverOptions};

    fn list(doc: &mut Document, count: usize) -> (NodeId, Vec<NodeId>) {
        let parent = doc.create_element("ul");
        doc.append_child(doc.root(), parent).unwrap();
        let items = (0..count)
            .map(|_| {
                let li = doc.create_element("li");
                doc.append_child(parent, li).unwrap();
                li
            })
            .collect();
        (parent, items)
    }

    fn detector(records: &[MutationRecord<NodeId>]) -> MovementDetector<NodeId> {
        let mut detector = MovementDetector::new();
        detector.build(records, |_| true);
        assert!(detector.is_built());
        detector
    }

    #[test]
    fn test_classify_added_removed_maybe_moved() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 3);
        doc.observe(ObserverOptions::child_list());

        let fresh = doc.create_element("li");
        doc.append_child(parent, fresh).unwrap();
        doc.remove_child(parent, items[0]).unwrap();
        doc.insert_before(parent, items[2], Some(items[1])).unwrap();

        let records = doc.take_records();
        let detector = detector(&records);
        let change = detector.parent_change(parent).unwrap();
        assert!(change.is_added(fresh));
        assert!(change.is_removed(items[0]));
        assert!(change.is_maybe_moved(items[2]));
        assert!(!change.is_maybe_moved(items[1]));
    }

    #[test]
    fn test_move_last_to_front() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 3);
        doc.observe(ObserverOptions::child_list());
        doc.insert_before(parent, items[2], Some(items[0])).unwrap();

        let records = doc.take_records();
        let mut detector = detector(&records);
        assert!(detector.was_reordered(&doc, items[2]));
        assert!(!detector.was_reordered(&doc, items[0]));
        assert!(!detector.was_reordered(&doc, items[1]));
    }

    #[test]
    fn test_remove_and_reinsert_in_place_is_not_a_move() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 3);
        doc.observe(ObserverOptions::child_list());
        doc.remove_child(parent, items[1]).unwrap();
        doc.insert_before(parent, items[1], Some(items[2])).unwrap();

        let records = doc.take_records();
        let mut detector = detector(&records);
        assert!(!detector.was_reordered(&doc, items[1]));
    }

    #[test]
    fn test_swap_reports_one_mover() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 2);
        doc.observe(ObserverOptions::child_list());
        // [a, b] -> [b, a] by moving both through removal and re-insertion.
        doc.remove_child(parent, items[0]).unwrap();
        doc.remove_child(parent, items[1]).unwrap();
        doc.append_child(parent, items[1]).unwrap();
        doc.append_child(parent, items[0]).unwrap();

        let records = doc.take_records();
        let mut detector = detector(&records);
        let a = detector.was_reordered(&doc, items[0]);
        let b = detector.was_reordered(&doc, items[1]);
        assert!(a ^ b, "exactly one of a swapped pair is reported, got a={} b={}", a, b);
    }

    #[test]
    fn test_interleaved_moves_resolve_against_full_old_chain() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 6);
        let [a, b, c, d, e, f] = [items[0], items[1], items[2], items[3], items[4], items[5]];
        doc.observe(ObserverOptions::child_list());

        doc.insert_before(parent, e, Some(a)).unwrap();
        doc.detach(b).unwrap();
        doc.append_child(parent, f).unwrap();
        doc.append_child(parent, d).unwrap();
        doc.append_child(parent, c).unwrap();
        doc.detach(a).unwrap();
        assert_eq!(doc.child_ids(parent), &[e, f, d, c]);

        let records = doc.take_records();
        let mut detector = detector(&records);
        let moved: Vec<NodeId> = [e, f, d, c]
            .into_iter()
            .filter(|&node| detector.was_reordered(&doc, node))
            .collect();
        assert_eq!(moved, vec![e, f, c]);
    }

    #[test]
    fn test_unbuilt_or_untouched_parent_is_not_reordered() {
        let mut doc = Document::new();
        let (_, items) = list(&mut doc, 2);
        let mut detector = MovementDetector::new();
        assert!(!detector.was_reordered(&doc, items[0]));

        detector.build(&[], |_| true);
        assert!(!detector.was_reordered(&doc, items[0]));
        assert!(detector.parent_change(doc.root()).is_none());
    }

    #[test]
    fn test_records_outside_region_are_ignored() {
        let mut doc = Document::new();
        let (parent, items) = list(&mut doc, 3);
        doc.observe(ObserverOptions::child_list());
        doc.insert_before(parent, items[2], Some(items[0])).unwrap();

        let records = doc.take_records();
        let mut detector = MovementDetector::new();
        detector.build(&records, |target| target != parent);
        assert!(detector.parent_change(parent).is_none());
        assert!(!detector.was_reordered(&doc, items[2]));
    }
}
