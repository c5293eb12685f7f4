//! Mutation records delivered by a change-notification source.

use alloc::string::String;
use alloc::vec::Vec;

/// The category of a mutation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// A single low-level change notification about the tree.
///
/// Records are immutable and ordered: a batch is delivered in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord<N> {
    /// Children were removed from and/or added to `target`.
    ChildList {
        target: N,
        /// Removed nodes, in their old document order.
        removed: Vec<N>,
        /// Added nodes, in their new document order.
        added: Vec<N>,
        /// Sibling preceding the first removed/added node.
        previous_sibling: Option<N>,
        /// Sibling following the last removed/added node.
        next_sibling: Option<N>,
    },
    /// An attribute of `target` changed.
    Attributes {
        target: N,
        name: String,
        /// Value before the change; `None` if the attribute was absent or old
        /// values were not requested.
        old_value: Option<String>,
    },
    /// The text payload of `target` changed.
    CharacterData { target: N, old_value: Option<String> },
}

impl<N: Copy> MutationRecord<N> {
    /// Creates a record for a single removal.
    pub fn removal(target: N, node: N, previous_sibling: Option<N>, next_sibling: Option<N>) -> Self {
        MutationRecord::ChildList {
            target,
            removed: alloc::vec![node],
            added: Vec::new(),
            previous_sibling,
            next_sibling,
        }
    }

    /// Creates a record for a single insertion.
    pub fn insertion(target: N, node: N, previous_sibling: Option<N>, next_sibling: Option<N>) -> Self {
        MutationRecord::ChildList {
            target,
            removed: Vec::new(),
            added: alloc::vec![node],
            previous_sibling,
            next_sibling,
        }
    }

    /// Returns the node the record is about.
    #[inline]
    pub fn target(&self) -> N {
        match self {
            MutationRecord::ChildList { target, .. }
            | MutationRecord::Attributes { target, .. }
            | MutationRecord::CharacterData { target, .. } => *target,
        }
    }

    /// Returns the category of the record.
    #[inline]
    pub fn kind(&self) -> RecordKind {
        match self {
            MutationRecord::ChildList { .. } => RecordKind::ChildList,
            MutationRecord::Attributes { .. } => RecordKind::Attributes,
            MutationRecord::CharacterData { .. } => RecordKind::CharacterData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_target_and_kind() {
        let record: MutationRecord<u32> = MutationRecord::insertion(1, 2, None, Some(3));
        assert_eq!(record.target(), 1);
        assert_eq!(record.kind(), RecordKind::ChildList);

        let record: MutationRecord<u32> = MutationRecord::Attributes {
            target: 7,
            name: "class".into(),
            old_value: Some("x".into()),
        };
        assert_eq!(record.target(), 7);
        assert_eq!(record.kind(), RecordKind::Attributes);
    }

    #[test]
    fn test_removal_shape() {
        match MutationRecord::removal(1u32, 5, Some(4), None) {
            MutationRecord::ChildList {
                removed,
                added,
                previous_sibling,
                next_sibling,
                ..
            } => {
                assert_eq!(removed, alloc::vec![5]);
                assert!(added.is_empty());
                assert_eq!(previous_sibling, Some(4));
                assert_eq!(next_sibling, None);
            }
            _ => panic!("Wrong record kind"),
        }
    }
}
