//! Per-query summaries of one projected batch.
//!
//! A `QuerySummary` is the difference between two states of a query's result:
//! nodes that started or stopped matching, nodes that moved while matching, and
//! attribute or text values that changed. Which of the optional fields are
//! present depends on the query:
//!
//! | query             | reparented | reordered | attribute_changed | value_changed | character_data_changed |
//! |-------------------|------------|-----------|-------------------|---------------|------------------------|
//! | `All`             | yes        | yes       | yes               |               | yes                    |
//! | `Element`         | yes        |           | with attributes   |               |                        |
//! | `Attribute`       |            |           |                   | yes           |                        |
//! | `CharacterData`   |            |           |                   | yes           |                        |

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use canopy_core::{Error, Result, Tree};
use canopy_projection::{Ledger, MutationProjection};
use core::hash::Hash;

use crate::query::Query;

/// What changed for one query over one batch.
///
/// The old-value accessors read the ledger of the projection the summary was
/// built from, so a summary cannot outlive its projection.
#[derive(Clone, Debug)]
pub struct QuerySummary<'p, N> {
    /// The observed root.
    pub target: N,
    /// Nodes that match now and did not before, in walk order.
    pub added: Vec<N>,
    /// Nodes that matched before and do not now, in walk order.
    pub removed: Vec<N>,
    /// Matching nodes now under a different parent.
    pub reparented: Option<Vec<N>>,
    /// Matching nodes that moved among their siblings.
    pub reordered: Option<Vec<N>>,
    /// Matching nodes with changed attributes, keyed by attribute name.
    pub attribute_changed: Option<BTreeMap<String, Vec<N>>>,
    /// Nodes whose watched attribute or text changed.
    pub value_changed: Option<Vec<N>>,
    /// Text and comment nodes whose payload changed.
    pub character_data_changed: Option<Vec<N>>,
    query: &'p Query,
    ledger: &'p Ledger<N>,
}

/// Builds the summary of `query` from a projection.
pub fn summarize<'p, T: Tree>(projection: &'p MutationProjection<'_, T>, query: &'p Query) -> QuerySummary<'p, T::Node> {
    let mode = query.match_mode();
    let movements = matches!(query, Query::All | Query::Element { .. });
    let changed = projection.changed(mode, movements);

    let mut summary = QuerySummary {
        target: projection.root(),
        added: changed.added,
        removed: changed.removed,
        reparented: movements.then_some(changed.reparented),
        reordered: query.is_all().then_some(changed.reordered),
        attribute_changed: None,
        value_changed: None,
        character_data_changed: None,
        query,
        ledger: projection.ledger(),
    };

    match query {
        Query::All => {
            summary.attribute_changed = Some(projection.attributes_changed(mode, None));
            summary.character_data_changed = Some(projection.character_data_changed(mode));
        }
        Query::Attribute { name, .. } => {
            let mut changed = projection.attributes_changed(mode, Some(core::slice::from_ref(name)));
            summary.value_changed = Some(changed.remove(name.as_str()).unwrap_or_default());
        }
        Query::Element {
            element_attributes: Some(names),
            ..
        } => {
            summary.attribute_changed = Some(projection.attributes_changed(mode, Some(names.as_slice())));
        }
        Query::Element { .. } => {}
        Query::CharacterData => {
            summary.value_changed = Some(projection.character_data_changed(mode));
        }
    }

    log::trace!(
        "summarized {:?}: {} added, {} removed",
        query,
        summary.added.len(),
        summary.removed.len()
    );
    summary
}

impl<'p, N> QuerySummary<'p, N>
where
    N: Copy + Eq + Hash,
{
    /// Returns the query this summary answers.
    #[inline]
    pub fn query(&self) -> &'p Query {
        self.query
    }

    /// Returns true if nothing changed for the query.
    pub fn is_empty(&self) -> bool {
        fn empty<N>(nodes: &Option<Vec<N>>) -> bool {
            nodes.as_ref().map_or(true, Vec::is_empty)
        }

        self.added.is_empty()
            && self.removed.is_empty()
            && empty(&self.reparented)
            && empty(&self.reordered)
            && empty(&self.value_changed)
            && empty(&self.character_data_changed)
            && self
                .attribute_changed
                .as_ref()
                .map_or(true, BTreeMap::is_empty)
    }

    /// Returns the value attribute `name` of `node` had at batch start.
    ///
    /// Available to queries reporting `attribute_changed`.
    pub fn old_attribute(&self, node: N, name: &str) -> Result<Option<&'p str>> {
        if self.attribute_changed.is_none() {
            return Err(Error::usage("old attribute values are not available for this query"));
        }
        self.ledger.old_attribute(node, name)
    }

    /// Returns the old value behind `value_changed`: the watched attribute for
    /// an attribute query, the text for a character data query.
    pub fn old_value(&self, node: N) -> Result<Option<&'p str>> {
        match self.query {
            Query::Attribute { name, .. } => self.ledger.old_attribute(node, name),
            Query::CharacterData => self.ledger.old_character_data(node),
            _ => Err(Error::usage("old values are only available for attribute and character data queries")),
        }
    }

    /// Returns the text `node` had at batch start.
    ///
    /// Available to `All` and character data queries.
    pub fn old_character_data(&self, node: N) -> Result<Option<&'p str>> {
        match self.query {
            Query::All | Query::CharacterData => self.ledger.old_character_data(node),
            _ => Err(Error::usage("old character data is not available for this query")),
        }
    }
}
