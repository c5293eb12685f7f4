//! Per-batch ledger of pending changes.
//!
//! The ledger folds a batch of mutation records into one `PendingChange` per
//! touched node. Structural facts keep the *first* old parent seen in the batch
//! and the *latest* added flag; attribute and text facts keep the *first* old
//! value seen, which is the value at the start of the batch.

use alloc::string::String;
use alloc::vec::Vec;
use canopy_core::{Error, MutationRecord, Result};
use core::hash::Hash;
use hashbrown::HashMap;

use crate::node_map::NodeMap;

/// Facts accumulated about one node during a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingChange<N> {
    /// The node appeared in a child-list record as removed or added.
    pub child_list: bool,
    /// Parent the node was removed from by the first removal in the batch.
    /// `None` if the first structural event was an addition.
    pub old_parent: Option<N>,
    /// The latest structural event was an addition with no earlier removal fact.
    pub added: bool,
    /// The node had attribute records.
    pub attributes: bool,
    /// First-seen old value per attribute name.
    attribute_old_values: HashMap<String, Option<String>>,
    /// Attribute names in first-seen order.
    attribute_names: Vec<String>,
    /// The node had character data records.
    pub character_data: bool,
    /// First-seen old text payload.
    character_data_old_value: Option<String>,
}

impl<N> Default for PendingChange<N> {
    fn default() -> Self {
        Self {
            child_list: false,
            old_parent: None,
            added: false,
            attributes: false,
            attribute_old_values: HashMap::new(),
            attribute_names: Vec::new(),
            character_data: false,
            character_data_old_value: None,
        }
    }
}

impl<N> PendingChange<N> {
    /// Returns the recorded old value of an attribute, if the name was recorded.
    ///
    /// The outer `Option` tells whether the attribute changed in the batch; the
    /// inner one is the old value itself (`None` if it was absent).
    pub fn old_attribute(&self, name: &str) -> Option<Option<&str>> {
        self.attribute_old_values.get(name).map(|v| v.as_deref())
    }

    /// Returns the names of changed attributes in first-seen order.
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Returns the old text payload, if text changed in the batch.
    pub fn old_character_data(&self) -> Option<Option<&str>> {
        self.character_data
            .then_some(self.character_data_old_value.as_deref())
    }

    fn record_attribute(&mut self, name: &str, old_value: Option<&str>) {
        self.attributes = true;
        if !self.attribute_old_values.contains_key(name) {
            self.attribute_old_values
                .insert(String::from(name), old_value.map(String::from));
            self.attribute_names.push(String::from(name));
        }
    }

    fn record_character_data(&mut self, old_value: Option<&str>) {
        if self.character_data {
            return;
        }
        self.character_data = true;
        self.character_data_old_value = old_value.map(String::from);
    }
}

/// The pending changes of one batch, keyed by node identity.
#[derive(Clone, Debug)]
pub struct Ledger<N> {
    changes: NodeMap<N, PendingChange<N>>,
    child_list_changes: bool,
    attribute_changes: bool,
    character_data_changes: bool,
}

impl<N> Default for Ledger<N>
where
    N: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Ledger<N>
where
    N: Copy + Eq + Hash,
{
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            changes: NodeMap::new(),
            child_list_changes: false,
            attribute_changes: false,
            character_data_changes: false,
        }
    }

    /// Classifies a batch of records, in emission order, into a fresh ledger.
    pub fn classify(records: &[MutationRecord<N>]) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.apply(record);
        }
        ledger
    }

    /// Folds one record into the ledger.
    pub fn apply(&mut self, record: &MutationRecord<N>) {
        match record {
            MutationRecord::ChildList {
                target,
                removed,
                added,
                ..
            } => {
                self.child_list_changes = true;
                for &node in removed {
                    let change = self.structural_change(node);
                    if change.added || change.old_parent.is_some() {
                        change.added = false;
                    } else {
                        change.old_parent = Some(*target);
                    }
                }
                for &node in added {
                    self.structural_change(node).added = true;
                }
            }
            MutationRecord::Attributes {
                target,
                name,
                old_value,
            } => {
                self.attribute_changes = true;
                self.change(*target)
                    .record_attribute(name, old_value.as_deref());
            }
            MutationRecord::CharacterData { target, old_value } => {
                self.character_data_changes = true;
                self.change(*target)
                    .record_character_data(old_value.as_deref());
            }
        }
    }

    fn change(&mut self, node: N) -> &mut PendingChange<N> {
        self.changes.get_or_insert_with(node, PendingChange::default)
    }

    fn structural_change(&mut self, node: N) -> &mut PendingChange<N> {
        let change = self.change(node);
        if !change.child_list {
            change.child_list = true;
            change.old_parent = None;
        }
        change
    }

    /// Returns the pending change of `node`.
    #[inline]
    pub fn get(&self, node: N) -> Option<&PendingChange<N>> {
        self.changes.get(node)
    }

    /// Returns true if `node` appeared in a child-list record.
    #[inline]
    pub fn has_structural_change(&self, node: N) -> bool {
        self.changes.get(node).is_some_and(|c| c.child_list)
    }

    /// Returns touched nodes in first-touch order.
    pub fn nodes(&self) -> Vec<N> {
        self.changes.keys()
    }

    /// Iterates over touched nodes and their changes in first-touch order.
    pub fn iter(&self) -> impl Iterator<Item = (N, &PendingChange<N>)> + '_ {
        self.changes.iter()
    }

    /// Returns the number of touched nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if no node was touched.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns true if the batch had child-list records.
    #[inline]
    pub fn has_child_list_changes(&self) -> bool {
        self.child_list_changes
    }

    /// Returns true if the batch had attribute records.
    #[inline]
    pub fn has_attribute_changes(&self) -> bool {
        self.attribute_changes
    }

    /// Returns true if the batch had character data records.
    #[inline]
    pub fn has_character_data_changes(&self) -> bool {
        self.character_data_changes
    }

    /// Returns the parent `node` had at the start of the batch.
    ///
    /// `current_parent` is the node's parent in the live tree, used when the
    /// batch holds no structural fact that overrides it.
    pub fn old_parent(&self, node: N, current_parent: Option<N>) -> Option<N> {
        match self.changes.get(node) {
            Some(change) if change.child_list => {
                if change.old_parent.is_some() {
                    change.old_parent
                } else if change.added {
                    None
                } else {
                    current_parent
                }
            }
            _ => current_parent,
        }
    }

    /// Returns the value attribute `name` of `node` had at the start of the batch.
    ///
    /// Fails with a usage error if the node had no attribute changes or the name
    /// was not among them.
    pub fn old_attribute(&self, node: N, name: &str) -> Result<Option<&str>> {
        let change = self
            .changes
            .get(node)
            .filter(|c| c.attributes)
            .ok_or_else(|| Error::usage("old attribute requested on a node without attribute changes"))?;
        change
            .old_attribute(name)
            .ok_or_else(|| Error::usage(alloc::format!("old attribute requested for unchanged attribute {:?}", name)))
    }

    /// Returns the text payload `node` had at the start of the batch.
    ///
    /// Fails with a usage error if the node had no character data changes.
    pub fn old_character_data(&self, node: N) -> Result<Option<&str>> {
        self.changes
            .get(node)
            .and_then(|c| c.old_character_data())
            .ok_or_else(|| Error::usage("old character data requested on a node without text changes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    type Record = MutationRecord<u32>;

    fn attr(target: u32, name: &str, old: Option<&str>) -> Record {
        Record::Attributes {
            target,
            name: name.into(),
            old_value: old.map(String::from),
        }
    }

    #[test]
    fn test_first_removal_fixes_old_parent() {
        let ledger = Ledger::classify(&[
            Record::removal(1, 10, None, None),
            Record::insertion(2, 10, None, None),
            Record::removal(2, 10, None, None),
        ]);
        let change = ledger.get(10).unwrap();
        assert!(change.child_list);
        assert_eq!(change.old_parent, Some(1));
        assert!(!change.added);
        assert_eq!(ledger.old_parent(10, None), Some(1));
    }

    #[test]
    fn test_added_first_has_no_old_parent() {
        let ledger = Ledger::classify(&[Record::insertion(1, 10, None, None)]);
        let change = ledger.get(10).unwrap();
        assert!(change.added);
        assert_eq!(change.old_parent, None);
        assert_eq!(ledger.old_parent(10, Some(1)), None);
    }

    #[test]
    fn test_removed_then_readded_keeps_old_parent() {
        let ledger = Ledger::classify(&[
            Record::removal(1, 10, None, None),
            Record::insertion(3, 10, None, None),
        ]);
        let change = ledger.get(10).unwrap();
        assert!(change.added);
        assert_eq!(ledger.old_parent(10, Some(3)), Some(1));
    }

    #[test]
    fn test_added_then_removed_falls_back_to_current_parent() {
        let ledger = Ledger::classify(&[
            Record::insertion(1, 10, None, None),
            Record::removal(1, 10, None, None),
        ]);
        let change = ledger.get(10).unwrap();
        assert!(!change.added);
        assert_eq!(change.old_parent, None);
        assert_eq!(ledger.old_parent(10, None), None);
    }

    #[test]
    fn test_untouched_node_uses_current_parent() {
        let ledger = Ledger::classify(&[attr(5, "id", None)]);
        assert_eq!(ledger.old_parent(5, Some(4)), Some(4));
        assert_eq!(ledger.old_parent(6, Some(4)), Some(4));
        assert!(!ledger.has_structural_change(5));
    }

    #[test]
    fn test_attribute_first_write_wins() {
        let ledger = Ledger::classify(&[
            attr(5, "class", Some("a")),
            attr(5, "id", None),
            attr(5, "class", Some("b")),
        ]);
        assert!(ledger.has_attribute_changes());
        assert!(!ledger.has_child_list_changes());
        assert_eq!(ledger.old_attribute(5, "class").unwrap(), Some("a"));
        assert_eq!(ledger.old_attribute(5, "id").unwrap(), None);
        assert_eq!(ledger.get(5).unwrap().attribute_names(), ["class", "id"]);
    }

    #[test]
    fn test_character_data_first_write_wins() {
        let ledger = Ledger::classify(&[
            Record::CharacterData { target: 7, old_value: Some("a".into()) },
            Record::CharacterData { target: 7, old_value: Some("b".into()) },
        ]);
        assert!(ledger.has_character_data_changes());
        assert_eq!(ledger.old_character_data(7).unwrap(), Some("a"));
    }

    #[test]
    fn test_old_value_usage_errors() {
        let ledger = Ledger::classify(&[
            attr(5, "class", Some("a")),
            Record::insertion(1, 6, None, None),
        ]);
        assert!(ledger.old_attribute(5, "id").unwrap_err().is_usage());
        assert!(ledger.old_attribute(6, "class").unwrap_err().is_usage());
        assert!(ledger.old_attribute(99, "class").unwrap_err().is_usage());
        assert!(ledger.old_character_data(5).unwrap_err().is_usage());
    }

    #[test]
    fn test_nodes_in_first_touch_order() {
        let ledger = Ledger::classify(&[
            attr(9, "id", None),
            Record::ChildList {
                target: 1,
                removed: vec![4, 3],
                added: vec![2],
                previous_sibling: None,
                next_sibling: None,
            },
        ]);
        assert_eq!(ledger.nodes(), vec![9, 4, 3, 2]);
        assert_eq!(ledger.len(), 4);
    }
}
