//! Watch-set configuration for a change-notification source.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::record::{MutationRecord, RecordKind};

/// Which change categories and attribute names a notification source reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserverOptions {
    /// Report child insertions and removals.
    pub child_list: bool,
    /// Report changes anywhere below the observed root, not only on it.
    pub subtree: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Keep the previous value in attribute records.
    pub attribute_old_value: bool,
    /// Restrict attribute reports to these names. `None` watches every name.
    pub attribute_filter: Option<Vec<String>>,
    /// Report text payload changes.
    pub character_data: bool,
    /// Keep the previous payload in character data records.
    pub character_data_old_value: bool,
}

impl ObserverOptions {
    /// Creates options watching structure only.
    pub fn child_list() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Self::default()
        }
    }

    /// Creates options watching every category with old values retained.
    pub fn everything() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: true,
            attribute_old_value: true,
            attribute_filter: None,
            character_data: true,
            character_data_old_value: true,
        }
    }

    /// Watches the given attribute names in addition to those already watched.
    ///
    /// Passing `None` switches to watching every attribute; once every attribute is
    /// watched, further names are absorbed.
    pub fn watch_attributes<'a, I>(&mut self, names: Option<I>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let already_all = self.attributes && self.attribute_filter.is_none();
        self.attributes = true;
        self.attribute_old_value = true;
        if already_all {
            return;
        }

        let Some(names) = names else {
            self.attribute_filter = None;
            return;
        };

        let filter = self.attribute_filter.get_or_insert_with(Vec::new);
        for name in names {
            if !filter.iter().any(|n| n == name) {
                filter.push(name.to_string());
            }
        }
        filter.sort();
    }

    /// Watches text payload changes with old values retained.
    pub fn watch_character_data(&mut self) {
        self.character_data = true;
        self.character_data_old_value = true;
    }

    /// Returns true if a record of this category and attribute name is reported.
    pub fn accepts(&self, kind: RecordKind, attribute: Option<&str>) -> bool {
        match kind {
            RecordKind::ChildList => self.child_list,
            RecordKind::CharacterData => self.character_data,
            RecordKind::Attributes => {
                if !self.attributes {
                    return false;
                }
                match (&self.attribute_filter, attribute) {
                    (None, _) => true,
                    (Some(filter), Some(name)) => filter.iter().any(|n| n == name),
                    (Some(_), None) => false,
                }
            }
        }
    }

    /// Returns true if `record` would be reported under these options.
    pub fn accepts_record<N: Copy>(&self, record: &MutationRecord<N>) -> bool {
        match record {
            MutationRecord::Attributes { name, .. } => {
                self.accepts(RecordKind::Attributes, Some(name.as_str()))
            }
            other => self.accepts(other.kind(), None),
        }
    }
}
