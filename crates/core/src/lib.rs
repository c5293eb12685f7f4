//! Canopy Core - Tree access, mutation records and filter patterns.
//!
//! This crate provides the boundary types shared by the projection engine and
//! its hosts:
//!
//! - `Tree`: Read-only access to a live hierarchical tree, keyed by node identity
//! - `MutationRecord`: Low-level child-list, attribute and character-data notifications
//! - `ObserverOptions`: Which change categories and attribute names a source reports
//! - `pattern`: The element filter grammar and its compiled `FilterPattern`s
//! - `Document`: An arena tree that records its own mutations
//! - `Error`: Error types for Canopy operations
//!
//! # Example
//!
//! ```rust
//! use canopy_core::{Document, MutationRecord, ObserverOptions};
//! use canopy_core::pattern::parse_element_filter;
//!
//! let patterns = parse_element_filter("li.done").unwrap();
//! assert_eq!(patterns[0].name(), "LI.done");
//!
//! let mut doc = Document::new();
//! doc.observe(ObserverOptions::child_list());
//! let li = doc.create_element("li");
//! doc.append_child(doc.root(), li).unwrap();
//!
//! let records = doc.take_records();
//! assert_eq!(records, vec![MutationRecord::insertion(doc.root(), li, None, None)]);
//! ```

#![no_std]

extern crate alloc;

mod document;
mod error;
mod options;
pub mod pattern;
mod record;
mod tree;

pub use document::{Document, NodeId};
pub use error::{Error, Result};
pub use options::ObserverOptions;
pub use pattern::{parse_element_filter, FilterPattern};
pub use record::{MutationRecord, RecordKind};
pub use tree::{Children, NodeKind, Tree};
