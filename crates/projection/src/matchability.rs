//! Matchability oracle: did / does a node satisfy a query's filter.

use alloc::string::String;
use canopy_core::{FilterPattern, NodeKind, Tree};
use core::hash::Hash;
use hashbrown::HashMap;

use crate::change::ChangeState;
use crate::ledger::Ledger;
use crate::node_map::NodeMap;

/// What a query considers a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode<'a> {
    /// Every node matches.
    Everything,
    /// Text and comment nodes match; nothing else does.
    CharacterData,
    /// Containers matching at least one of the patterns match.
    Patterns(&'a [FilterPattern]),
}

/// Per-pattern memo tables for one batch, keyed by canonical pattern name.
#[derive(Clone, Debug)]
pub struct Matchability<N> {
    caches: HashMap<String, NodeMap<N, ChangeState>>,
}

impl<N> Default for Matchability<N> {
    fn default() -> Self {
        Self {
            caches: HashMap::new(),
        }
    }
}

impl<N> Matchability<N>
where
    N: Copy + Eq + Hash,
{
    /// Creates empty memo tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `node` as stayed out, entered, stayed in or exited the set of
    /// nodes matching `mode`.
    pub fn change<T>(&mut self, tree: &T, ledger: &Ledger<N>, mode: MatchMode<'_>, node: N) -> ChangeState
    where
        T: Tree<Node = N>,
    {
        match mode {
            MatchMode::Everything => ChangeState::StayedIn,
            MatchMode::CharacterData => {
                if tree.kind(node).is_character_data() {
                    ChangeState::StayedIn
                } else {
                    ChangeState::StayedOut
                }
            }
            MatchMode::Patterns(patterns) => {
                if tree.kind(node) != NodeKind::Container {
                    return ChangeState::StayedOut;
                }
                ChangeState::fold(
                    patterns
                        .iter()
                        .map(|pattern| self.pattern_change(tree, ledger, pattern, node)),
                )
            }
        }
    }

    /// Classifies a container against a single pattern.
    ///
    /// Current values come from the live node; old values come from the ledger
    /// when the relevant attribute changed in the batch and equal the current
    /// values otherwise.
    pub fn pattern_change<T>(&mut self, tree: &T, ledger: &Ledger<N>, pattern: &FilterPattern, node: N) -> ChangeState
    where
        T: Tree<Node = N>,
    {
        if let Some(&cached) = self.caches.get(pattern.name()).and_then(|c| c.get(node)) {
            return cached;
        }

        let tag_name = tree.tag_name(node).unwrap_or("");
        let attr_now = pattern.attr_name().and_then(|name| tree.attribute(node, name));
        let class_now = pattern
            .class_name()
            .and_then(|_| tree.attribute(node, "class"));
        let is_matching = pattern.matches(tag_name, attr_now, class_now);

        let change = ledger.get(node);
        let attr_old = pattern
            .attr_name()
            .and_then(|name| change.and_then(|c| c.old_attribute(name)));
        let class_old = pattern
            .class_name()
            .and_then(|_| change.and_then(|c| c.old_attribute("class")));

        let was_matching = if attr_old.is_none() && class_old.is_none() {
            is_matching
        } else {
            pattern.matches(
                tag_name,
                attr_old.unwrap_or(attr_now),
                class_old.unwrap_or(class_now),
            )
        };

        let result = ChangeState::from_endpoints(was_matching, is_matching);
        self.caches
            .entry(String::from(pattern.name()))
            .or_default()
            .set(node, result);
        result
    }
}
