//! Identity-keyed maps with insertion-order enumeration.
//!
//! A `NodeMap` is the ledger primitive of the engine: it stores per-node facts
//! beside the tree instead of inside it. The first `set` of a node assigns it a
//! slot; the slot index is the node's stable tag for the lifetime of the map and
//! fixes its position in `keys()`.

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashMap;

/// A map from node handles to values, enumerated in insertion order.
#[derive(Clone, Debug)]
pub struct NodeMap<K, V> {
    /// Node -> slot index into `entries`
    slots: HashMap<K, usize>,
    /// Slots in insertion order; deleted slots are left empty
    entries: Vec<Option<(K, V)>>,
    /// Number of occupied slots
    len: usize,
}

/// An identity-keyed set enumerated in insertion order.
pub type NodeSet<K> = NodeMap<K, ()>;

impl<K, V> Default for NodeMap<K, V>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeMap<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            entries: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of tracked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no node is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `node` is tracked.
    #[inline]
    pub fn has(&self, node: K) -> bool {
        self.slots.contains_key(&node)
    }

    /// Returns the value tracked for `node`.
    pub fn get(&self, node: K) -> Option<&V> {
        let slot = *self.slots.get(&node)?;
        self.entries[slot].as_ref().map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value tracked for `node`.
    pub fn get_mut(&mut self, node: K) -> Option<&mut V> {
        let slot = *self.slots.get(&node)?;
        self.entries[slot].as_mut().map(|(_, v)| v)
    }

    /// Sets the value for `node`, keeping its position if already tracked.
    pub fn set(&mut self, node: K, value: V) {
        match self.slots.get(&node) {
            Some(&slot) => self.entries[slot] = Some((node, value)),
            None => {
                self.slots.insert(node, self.entries.len());
                self.entries.push(Some((node, value)));
                self.len += 1;
            }
        }
    }

    /// Returns the value for `node`, inserting one built by `make` if absent.
    pub fn get_or_insert_with<F>(&mut self, node: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let slot = match self.slots.get(&node) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.slots.insert(node, slot);
                self.entries.push(Some((node, make())));
                self.len += 1;
                slot
            }
        };
        match &mut self.entries[slot] {
            Some((_, value)) => value,
            None => unreachable!("slot of a tracked node is occupied"),
        }
    }

    /// Stops tracking `node`, returning its value.
    ///
    /// Setting the node again later appends it at the end of the order.
    pub fn delete(&mut self, node: K) -> Option<V> {
        let slot = self.slots.remove(&node)?;
        self.len -= 1;
        self.entries[slot].take().map(|(_, v)| v)
    }

    /// Returns tracked nodes in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Iterates over tracked entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(k, v)| (*k, v)))
    }

}

impl<K> NodeMap<K, ()>
where
    K: Copy + Eq + Hash,
{
    /// Adds `node` to the set.
    #[inline]
    pub fn insert(&mut self, node: K) {
        self.set(node, ());
    }
}
