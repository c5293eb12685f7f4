//! Reachability oracle: was / is a node a descendant of the observed root.
//!
//! `is reachable` follows the live parent chain; `was reachable` follows the old
//! parent chain reconstructed from the ledger. Both are memoized per node for the
//! batch. Chains are walked iteratively and every node on a resolved chain is
//! filled in at once, so each node is resolved at most once per direction.

use alloc::vec::Vec;
use canopy_core::Tree;
use hashbrown::HashSet;

use crate::change::ChangeState;
use crate::ledger::Ledger;
use crate::node_map::NodeMap;

/// Memo tables for one batch.
#[derive(Clone, Debug)]
pub struct Reachability<N> {
    root: N,
    is_reachable: NodeMap<N, bool>,
    was_reachable: NodeMap<N, bool>,
}

impl<N> Reachability<N>
where
    N: Copy + Eq + core::hash::Hash,
{
    /// Creates empty memo tables for the given root.
    pub fn new(root: N) -> Self {
        Self {
            root,
            is_reachable: NodeMap::new(),
            was_reachable: NodeMap::new(),
        }
    }

    /// Returns the observed root.
    #[inline]
    pub fn root(&self) -> N {
        self.root
    }

    /// Classifies `node` as stayed out, entered, stayed in or exited.
    pub fn change<T>(&mut self, tree: &T, ledger: &Ledger<N>, node: N) -> ChangeState
    where
        T: Tree<Node = N>,
    {
        let is = self.is_reachable(tree, node);
        let was = self.was_reachable(tree, ledger, node);
        ChangeState::from_endpoints(was, is)
    }

    /// Returns true if `node` is the root or a descendant of it now.
    pub fn is_reachable<T>(&mut self, tree: &T, node: N) -> bool
    where
        T: Tree<Node = N>,
    {
        let root = self.root;
        resolve_chain(&mut self.is_reachable, root, node, |n| tree.parent(n))
    }

    /// Returns true if `node` was the root or a descendant of it at batch start.
    pub fn was_reachable<T>(&mut self, tree: &T, ledger: &Ledger<N>, node: N) -> bool
    where
        T: Tree<Node = N>,
    {
        let root = self.root;
        resolve_chain(&mut self.was_reachable, root, node, |n| {
            ledger.old_parent(n, tree.parent(n))
        })
    }
}

/// Walks `parent_of` upward from `node` until reaching the root, a detached
/// node, or a memoized answer, then memoizes the answer for the whole chain.
///
/// A chain revisiting one of its own nodes has no root above it and resolves
/// to unreachable.
fn resolve_chain<N, F>(cache: &mut NodeMap<N, bool>, root: N, node: N, mut parent_of: F) -> bool
where
    N: Copy + Eq + core::hash::Hash,
    F: FnMut(N) -> Option<N>,
{
    let mut chain: Vec<N> = Vec::new();
    let mut pending: HashSet<N> = HashSet::new();
    let mut current = Some(node);

    let reachable = loop {
        let Some(n) = current else {
            break false;
        };
        if n == root {
            break true;
        }
        if let Some(&known) = cache.get(n) {
            break known;
        }
        if !pending.insert(n) {
            break false;
        }
        chain.push(n);
        current = parent_of(n);
    };

    for n in chain {
        cache.set(n, reachable);
    }
    reachable
}
