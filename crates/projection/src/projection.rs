//! Projection driver.
//!
//! A `MutationProjection` is built once per batch of records. It classifies the
//! batch into a ledger, then walks outward from every touched node to decide
//! which nodes entered, exited or stayed inside the observed region. The
//! per-query questions (added, removed, reparented, reordered, attribute and
//! text changes) are answered from that walk on demand, sharing one set of
//! memo tables across every query of the batch.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use canopy_core::{FilterPattern, MutationRecord, Result, Tree};
use core::cell::RefCell;

use crate::change::{ChangeState, Movement};
use crate::ledger::Ledger;
use crate::matchability::{MatchMode, Matchability};
use crate::movement::MovementDetector;
use crate::node_map::{NodeMap, NodeSet};
use crate::reachability::Reachability;

/// Engine-wide switches for one projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Compute same-parent reordering for nodes that stayed in.
    pub track_reordering: bool,
}

impl ProjectionOptions {
    /// Creates options with every switch off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables reorder detection.
    pub fn with_track_reordering(mut self, track_reordering: bool) -> Self {
        self.track_reordering = track_reordering;
        self
    }
}

/// Nodes grouped by how they changed relative to one query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangedNodes<N> {
    pub added: Vec<N>,
    pub removed: Vec<N>,
    pub reparented: Vec<N>,
    pub reordered: Vec<N>,
}

impl<N> Default for ChangedNodes<N> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            reparented: Vec::new(),
            reordered: Vec::new(),
        }
    }
}

/// The projection of one batch of records onto a tree.
pub struct MutationProjection<'a, T: Tree> {
    tree: &'a T,
    root: T::Node,
    records: &'a [MutationRecord<T::Node>],
    patterns: &'a [FilterPattern],
    options: ProjectionOptions,
    ledger: Ledger<T::Node>,
    entered: Vec<T::Node>,
    exited: Vec<T::Node>,
    stayed_in: NodeMap<T::Node, Movement>,
    reachability: RefCell<Reachability<T::Node>>,
    matchability: RefCell<Matchability<T::Node>>,
    movement: RefCell<MovementDetector<T::Node>>,
}

/// Projects a batch of records onto `tree` below `root`.
///
/// `patterns` is the union of every element filter the projection will be asked
/// about; matchability for them is primed during the walk.
pub fn project<'a, T: Tree>(
    tree: &'a T,
    root: T::Node,
    records: &'a [MutationRecord<T::Node>],
    patterns: &'a [FilterPattern],
    options: ProjectionOptions,
) -> MutationProjection<'a, T> {
    MutationProjection::new(tree, root, records, patterns, options)
}

impl<'a, T: Tree> MutationProjection<'a, T> {
    /// Classifies `records` and walks the affected part of the tree.
    pub fn new(
        tree: &'a T,
        root: T::Node,
        records: &'a [MutationRecord<T::Node>],
        patterns: &'a [FilterPattern],
        options: ProjectionOptions,
    ) -> Self {
        let ledger = Ledger::classify(records);
        let mut projection = Self {
            tree,
            root,
            records,
            patterns,
            options,
            ledger,
            entered: Vec::new(),
            exited: Vec::new(),
            stayed_in: NodeMap::new(),
            reachability: RefCell::new(Reachability::new(root)),
            matchability: RefCell::new(Matchability::new()),
            movement: RefCell::new(MovementDetector::new()),
        };

        if !projection.ledger.has_child_list_changes() && !projection.ledger.has_attribute_changes() {
            log::trace!("no structural or attribute changes in {} records, skipping walk", records.len());
            return projection;
        }

        projection.walk();
        log::debug!(
            "projected {} records over {} nodes: {} entered, {} exited, {} stayed in",
            records.len(),
            projection.ledger.len(),
            projection.entered.len(),
            projection.exited.len(),
            projection.stayed_in.len()
        );
        projection
    }

    /// Visits each touched node and, for nodes whose reachability changed,
    /// their descendants.
    ///
    /// A descendant inherits its parent's reachability unless it has a
    /// structural change of its own. Nodes that stayed out are pruned; nodes
    /// that stayed in are classified by movement and not descended into.
    fn walk(&mut self) {
        let mut visited: NodeSet<T::Node> = NodeSet::new();
        let mut entered = Vec::new();
        let mut exited = Vec::new();
        let mut stayed_in = NodeMap::new();
        let mut stack: Vec<(T::Node, Option<ChangeState>)> = Vec::new();

        for start in self.ledger.nodes() {
            stack.push((start, None));
            while let Some((node, inherited)) = stack.pop() {
                if visited.has(node) {
                    continue;
                }
                visited.insert(node);

                let structural = self.ledger.has_structural_change(node);
                let reachable = match inherited {
                    Some(state) if !structural => state,
                    _ => self.reachability_change(node),
                };
                if reachable == ChangeState::StayedOut {
                    continue;
                }

                if !self.patterns.is_empty() {
                    self.matchability_change(MatchMode::Patterns(self.patterns), node);
                }

                match reachable {
                    ChangeState::Entered => entered.push(node),
                    ChangeState::Exited => exited.push(node),
                    ChangeState::StayedIn => {
                        let movement = if structural {
                            self.classify_movement(node)
                        } else {
                            Movement::Stable
                        };
                        stayed_in.set(node, movement);
                        continue;
                    }
                    ChangeState::StayedOut => continue,
                }

                let children: Vec<T::Node> = self.tree.children(node).collect();
                for child in children.into_iter().rev() {
                    stack.push((child, Some(reachable)));
                }
            }
        }

        self.entered = entered;
        self.exited = exited;
        self.stayed_in = stayed_in;
    }

    fn classify_movement(&self, node: T::Node) -> Movement {
        let old_parent = self.ledger.get(node).and_then(|change| change.old_parent);
        if old_parent != self.tree.parent(node) {
            Movement::Reparented
        } else if self.options.track_reordering && self.was_reordered(node) {
            Movement::Reordered
        } else {
            Movement::Stable
        }
    }

    fn was_reordered(&self, node: T::Node) -> bool {
        if !self.ledger.has_child_list_changes() {
            return false;
        }
        let mut movement = self.movement.borrow_mut();
        if !movement.is_built() {
            movement.build(self.records, |target| {
                self.reachability_change(target) == ChangeState::StayedIn
            });
        }
        movement.was_reordered(self.tree, node)
    }

    /// Returns the tree the batch is projected onto.
    #[inline]
    pub fn tree(&self) -> &'a T {
        self.tree
    }

    /// Returns the observed root.
    #[inline]
    pub fn root(&self) -> T::Node {
        self.root
    }

    /// Returns the engine switches.
    #[inline]
    pub fn options(&self) -> ProjectionOptions {
        self.options
    }

    /// Returns the classified batch.
    #[inline]
    pub fn ledger(&self) -> &Ledger<T::Node> {
        &self.ledger
    }

    /// Returns nodes that entered the region, in walk order.
    #[inline]
    pub fn entered(&self) -> &[T::Node] {
        &self.entered
    }

    /// Returns nodes that left the region, in walk order.
    #[inline]
    pub fn exited(&self) -> &[T::Node] {
        &self.exited
    }

    /// Iterates over visited nodes that stayed in the region, with their movement.
    pub fn stayed_in(&self) -> impl Iterator<Item = (T::Node, Movement)> + '_ {
        self.stayed_in.iter().map(|(node, &movement)| (node, movement))
    }

    /// Returns how `node` moved, if the walk found it inside the region at
    /// both endpoints.
    pub fn movement(&self, node: T::Node) -> Option<Movement> {
        self.stayed_in.get(node).copied()
    }

    /// Classifies `node` against the observed region.
    pub fn reachability_change(&self, node: T::Node) -> ChangeState {
        self.reachability
            .borrow_mut()
            .change(self.tree, &self.ledger, node)
    }

    /// Classifies `node` against a query's filter.
    pub fn matchability_change(&self, mode: MatchMode<'_>, node: T::Node) -> ChangeState {
        self.matchability
            .borrow_mut()
            .change(self.tree, &self.ledger, mode, node)
    }

    /// Groups the walked nodes by how they changed relative to `mode`.
    ///
    /// Added and removed nodes combine reachability and matchability: a node
    /// is added if it is in both sets now and was not in both before. The
    /// movement lists are only filled when `movements` is true.
    pub fn changed(&self, mode: MatchMode<'_>, movements: bool) -> ChangedNodes<T::Node> {
        let mut changed = ChangedNodes::default();

        for &node in &self.entered {
            if self.matchability_change(mode, node).is_in() {
                changed.added.push(node);
            }
        }

        for (node, movement) in self.stayed_in() {
            match self.matchability_change(mode, node) {
                ChangeState::Entered => changed.added.push(node),
                ChangeState::Exited => changed.removed.push(node),
                ChangeState::StayedIn if movements => match movement {
                    Movement::Reparented => changed.reparented.push(node),
                    Movement::Reordered => changed.reordered.push(node),
                    Movement::Stable => {}
                },
                _ => {}
            }
        }

        for &node in &self.exited {
            if self.matchability_change(mode, node).was_in() {
                changed.removed.push(node);
            }
        }

        changed
    }

    /// Groups nodes with changed attributes by attribute name.
    ///
    /// Only nodes that stayed in the region and matched `mode` at both
    /// endpoints count, and only if the current value differs from the value
    /// at batch start. `filter` restricts the reported names.
    pub fn attributes_changed(&self, mode: MatchMode<'_>, filter: Option<&[String]>) -> BTreeMap<String, Vec<T::Node>> {
        let mut result: BTreeMap<String, Vec<T::Node>> = BTreeMap::new();
        if !self.ledger.has_attribute_changes() {
            return result;
        }

        for (node, change) in self.ledger.iter() {
            if !change.attributes || !self.stayed_matched(mode, node) {
                continue;
            }
            for name in change.attribute_names() {
                if filter.is_some_and(|names| !names.contains(name)) {
                    continue;
                }
                let old_value = change.old_attribute(name).flatten();
                if self.tree.attribute(node, name) == old_value {
                    continue;
                }
                result.entry(name.clone()).or_default().push(node);
            }
        }

        result
    }

    /// Returns nodes whose text differs from its value at batch start.
    pub fn character_data_changed(&self, mode: MatchMode<'_>) -> Vec<T::Node> {
        if !self.ledger.has_character_data_changes() {
            return Vec::new();
        }

        self.ledger
            .iter()
            .filter(|(_, change)| change.character_data)
            .filter(|&(node, _)| self.stayed_matched(mode, node))
            .filter(|(node, change)| {
                change.old_character_data().flatten() != self.tree.text(*node)
            })
            .map(|(node, _)| node)
            .collect()
    }

    fn stayed_matched(&self, mode: MatchMode<'_>, node: T::Node) -> bool {
        self.reachability_change(node) == ChangeState::StayedIn
            && self.matchability_change(mode, node) == ChangeState::StayedIn
    }

    /// Returns the value attribute `name` of `node` had at batch start.
    pub fn old_attribute(&self, node: T::Node, name: &str) -> Result<Option<&str>> {
        self.ledger.old_attribute(node, name)
    }

    /// Returns the text `node` had at batch start.
    pub fn old_character_data(&self, node: T::Node) -> Result<Option<&str>> {
        self.ledger.old_character_data(node)
    }
}
