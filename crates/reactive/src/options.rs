//! Derives the change categories a record source must report for a set of queries.

use alloc::string::String;
use canopy_core::ObserverOptions;

use crate::query::Query;

/// Returns the narrowest observer options that still feed every query.
///
/// Child-list changes over the whole subtree are always watched. Attributes are
/// watched with old values, either all of them (an `All` query) or the union of
/// names the queries mention: the attribute of attribute queries, `class` for
/// filters with class clauses, attribute clauses, and declared element
/// attributes. Text is watched with old values for `All` and character data
/// queries.
pub fn observer_options(queries: &[Query]) -> ObserverOptions {
    let mut options = ObserverOptions::child_list();

    for query in queries {
        match query {
            Query::CharacterData => options.watch_character_data(),
            Query::All => {
                options.watch_attributes(None::<[&str; 0]>);
                options.watch_character_data();
            }
            Query::Attribute { name, .. } => options.watch_attributes(Some([name.as_str()])),
            Query::Element {
                filter,
                element_attributes,
                ..
            } => {
                if filter.iter().any(|pattern| pattern.class_name().is_some()) {
                    options.watch_attributes(Some(["class"]));
                }
                let mut names = query.filter_attributes();
                if let Some(extra) = element_attributes {
                    names.extend(extra.iter().map(String::as_str));
                }
                if !names.is_empty() {
                    options.watch_attributes(Some(names));
                }
            }
        }
    }

    log::debug!("derived observer options {:?} for {} queries", options, queries.len());
    options
}
