//! Canopy Reactive - Query-scoped summaries of tree mutations.
//!
//! This crate turns projected batches of mutation records into per-query
//! summaries and hands them to subscribers. Subscribers declare what they
//! care about with queries and receive, per batch, only the net changes
//! relevant to each query.
//!
//! # Core Concepts
//!
//! - `Query`: A validated query (`All`, `Attribute`, `Element`, `CharacterData`)
//! - `QuerySummary`: What changed for one query over one batch
//! - `observer_options`: The change categories a record source must report
//! - `MutationSummary`: Binds a root and queries to subscribers
//! - `SubscriptionManager`: Manages the callbacks of one observer
//!
//! # Example
//!
//! ```rust
//! use canopy_core::{Document, ObserverOptions};
//! use canopy_projection::{project, ProjectionOptions};
//! use canopy_reactive::{summarize, Query};
//!
//! let mut doc = Document::new();
//! let div = doc.create_element("div");
//! doc.append_child(doc.root(), div).unwrap();
//! doc.set_attribute(div, "class", "x").unwrap();
//!
//! doc.observe(ObserverOptions::everything());
//! doc.set_attribute(div, "class", "y").unwrap();
//! let records = doc.take_records();
//!
//! let query = Query::element(".y").unwrap();
//! let projection = project(&doc, doc.root(), &records, query.filter(), ProjectionOptions::new());
//! let summary = summarize(&projection, &query);
//! assert_eq!(summary.added, vec![div]);
//! ```

#![no_std]

extern crate alloc;

pub mod observer;
pub mod options;
pub mod query;
pub mod subscription;
pub mod summary;

pub use observer::{MutationSummary, MutationSummaryBuilder};
pub use options::observer_options;
pub use query::{merged_patterns, tracks_reordering, Query};
pub use subscription::{Subscription, SubscriptionId, SubscriptionManager, SummaryCallback};
pub use summary::{summarize, QuerySummary};

// Re-export commonly used types from dependencies
pub use canopy_core::{Error, Result, Tree};
pub use canopy_projection::{project, MutationProjection, ProjectionOptions};
