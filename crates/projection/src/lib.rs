//! Canopy Projection - Projects batches of tree mutations onto the observed region.
//!
//! Given a tree, a root and the mutation records of one batch, this crate
//! answers which nodes entered or left the subtree under the root, which of
//! them started or stopped matching an element filter, which ones moved, and
//! which attribute and text values really changed. Intermediate states are
//! folded away: only differences between the start and the end of the batch
//! are reported.
//!
//! # Components
//!
//! - `NodeMap` / `NodeSet`: Identity-keyed storage enumerated in insertion order
//! - `Ledger`: The batch folded into one `PendingChange` per touched node
//! - `Reachability`: Was / is a node inside the observed subtree
//! - `Matchability`: Did / does a node satisfy a query's filter
//! - `MovementDetector`: Same-parent reorder detection
//! - `MutationProjection`: The driver combining the above
//!
//! # Example
//!
//! ```rust
//! use canopy_core::{Document, ObserverOptions};
//! use canopy_projection::{project, MatchMode, ProjectionOptions};
//!
//! let mut doc = Document::new();
//! doc.observe(ObserverOptions::everything());
//! let li = doc.create_element("li");
//! doc.append_child(doc.root(), li).unwrap();
//!
//! let records = doc.take_records();
//! let projection = project(&doc, doc.root(), &records, &[], ProjectionOptions::new());
//! assert_eq!(projection.changed(MatchMode::Everything, false).added, vec![li]);
//! ```

#![no_std]

extern crate alloc;

pub mod change;
pub mod ledger;
pub mod matchability;
pub mod movement;
pub mod node_map;
pub mod projection;
pub mod reachability;

pub use change::{ChangeState, Movement};
pub use ledger::{Ledger, PendingChange};
pub use matchability::{MatchMode, Matchability};
pub use movement::{ChildListChange, MovementDetector};
pub use node_map::{NodeMap, NodeSet};
pub use projection::{project, ChangedNodes, MutationProjection, ProjectionOptions};
pub use reachability::Reachability;
