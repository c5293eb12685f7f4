//! Query declarations.
//!
//! A query names the nodes a subscriber cares about. Constructors validate their
//! input up front, so a `Query` value is always well-formed.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use canopy_core::pattern::is_valid_attribute_name;
use canopy_core::{parse_element_filter, Error, FilterPattern, Result};
use canopy_projection::MatchMode;

/// A validated query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Every node under the root, with reordering, attribute and text changes.
    All,
    /// Containers carrying one attribute, and changes to its value.
    Attribute {
        /// Trimmed attribute name.
        name: String,
        /// The compiled `*[name]` filter.
        filter: Vec<FilterPattern>,
    },
    /// Containers matching an element filter.
    Element {
        /// The filter text as declared.
        pattern: String,
        /// The compiled filter.
        filter: Vec<FilterPattern>,
        /// Attributes whose changes are reported for matching containers.
        element_attributes: Option<Vec<String>>,
    },
    /// Text and comment nodes, and changes to their payload.
    CharacterData,
}

impl Query {
    /// Creates the `{all}` query.
    pub fn all() -> Self {
        Query::All
    }

    /// Creates the `{characterData}` query.
    pub fn character_data() -> Self {
        Query::CharacterData
    }

    /// Creates a single-attribute query.
    pub fn attribute(name: &str) -> Result<Self> {
        let name = validate_attribute(name)?;
        let filter = alloc::vec![FilterPattern::any_with_attribute(&name)];
        Ok(Query::Attribute { name, filter })
    }

    /// Creates an element query from filter text.
    pub fn element(pattern: &str) -> Result<Self> {
        Ok(Query::Element {
            pattern: pattern.to_string(),
            filter: parse_element_filter(pattern)?,
            element_attributes: None,
        })
    }

    /// Creates an element query that also reports changes to the listed
    /// attributes. `attributes` is a whitespace-separated list of names.
    pub fn element_with_attributes(pattern: &str, attributes: &str) -> Result<Self> {
        let filter = parse_element_filter(pattern)?;
        let element_attributes = validate_element_attributes(attributes)?;
        Ok(Query::Element {
            pattern: pattern.to_string(),
            filter,
            element_attributes: Some(element_attributes),
        })
    }

    /// Returns true for the `{all}` query.
    #[inline]
    pub fn is_all(&self) -> bool {
        matches!(self, Query::All)
    }

    /// Returns the compiled filter, empty for queries without one.
    pub fn filter(&self) -> &[FilterPattern] {
        match self {
            Query::Attribute { filter, .. } | Query::Element { filter, .. } => filter,
            Query::All | Query::CharacterData => &[],
        }
    }

    /// Returns how the projection decides whether a node matches this query.
    pub fn match_mode(&self) -> MatchMode<'_> {
        match self {
            Query::All => MatchMode::Everything,
            Query::CharacterData => MatchMode::CharacterData,
            Query::Attribute { filter, .. } | Query::Element { filter, .. } => MatchMode::Patterns(filter),
        }
    }

    /// Returns the attribute names the element filter constrains, in first-seen order.
    pub fn filter_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for pattern in self.filter() {
            if let Some(name) = pattern.attr_name() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Trims and checks an attribute name.
pub fn validate_attribute(name: &str) -> Result<String> {
    let name = name.trim();
    if !is_valid_attribute_name(name) {
        return Err(Error::invalid_query(alloc::format!("invalid attribute name {:?}", name)));
    }
    Ok(name.to_string())
}

/// Splits a whitespace-separated attribute list, validating and
/// deduplicating names while keeping first occurrences in order.
pub fn validate_element_attributes(attributes: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for raw in attributes.split_whitespace() {
        let name = validate_attribute(raw)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        return Err(Error::invalid_query("element attributes must name at least one attribute"));
    }
    Ok(names)
}

/// Concatenates the filters of every query, in declaration order.
pub fn merged_patterns(queries: &[Query]) -> Vec<FilterPattern> {
    queries.iter().flat_map(|q| q.filter().iter().cloned()).collect()
}

/// Returns true if any query needs reorder detection.
pub fn tracks_reordering(queries: &[Query]) -> bool {
    queries.iter().any(Query::is_all)
}
