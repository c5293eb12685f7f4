//! Property-based tests for canopy-projection using proptest.
//!
//! Random mutation batches are applied to a `Document`; the projection for the
//! whole subtree is compared against a naive diff of snapshots taken before and
//! after the batch.

use canopy_core::{Document, NodeId, ObserverOptions, Tree};
use canopy_projection::{project, MatchMode, ProjectionOptions};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const ELEMENTS: usize = 8;
const TEXTS: usize = 3;
const ATTRIBUTES: [&str; 3] = ["class", "id", "rel"];
const VALUES: [&str; 3] = ["x", "y", "z"];

#[derive(Clone, Debug)]
enum Op {
    Append { parent: usize, child: usize },
    InsertBefore { parent: usize, child: usize, reference: usize },
    Detach { node: usize },
    SetAttribute { node: usize, name: usize, value: usize },
    RemoveAttribute { node: usize, name: usize },
    SetText { node: usize, value: usize },
}

fn op() -> impl Strategy<Value = Op> {
    let nodes = ELEMENTS + TEXTS;
    prop_oneof![
        3 => (0..=ELEMENTS, 0..nodes).prop_map(|(parent, child)| Op::Append { parent, child }),
        2 => (0..=ELEMENTS, 0..nodes, 0..nodes)
            .prop_map(|(parent, child, reference)| Op::InsertBefore { parent, child, reference }),
        2 => (0..nodes).prop_map(|node| Op::Detach { node }),
        2 => (0..ELEMENTS, 0..ATTRIBUTES.len(), 0..VALUES.len())
            .prop_map(|(node, name, value)| Op::SetAttribute { node, name, value }),
        1 => (0..ELEMENTS, 0..ATTRIBUTES.len()).prop_map(|(node, name)| Op::RemoveAttribute { node, name }),
        1 => (0..TEXTS, 0..VALUES.len()).prop_map(|(node, value)| Op::SetText { node, value }),
    ]
}

struct Fixture {
    doc: Document,
    /// Elements first, then text nodes.
    nodes: Vec<NodeId>,
}

impl Fixture {
    fn new() -> Self {
        let mut doc = Document::new();
        let mut nodes = Vec::new();
        for i in 0..ELEMENTS {
            nodes.push(doc.create_element(if i % 2 == 0 { "div" } else { "span" }));
        }
        for _ in 0..TEXTS {
            nodes.push(doc.create_text("x"));
        }
        Self { doc, nodes }
    }

    /// Index `ELEMENTS` as a parent stands for the root.
    fn parent(&self, index: usize) -> NodeId {
        if index == ELEMENTS {
            self.doc.root()
        } else {
            self.nodes[index]
        }
    }

    fn apply(&mut self, op: &Op) {
        // Hierarchy errors leave the document untouched; they are part of the input space.
        let _ = match *op {
            Op::Append { parent, child } => {
                let parent = self.parent(parent);
                self.doc.append_child(parent, self.nodes[child])
            }
            Op::InsertBefore { parent, child, reference } => {
                let parent = self.parent(parent);
                self.doc.insert_before(parent, self.nodes[child], Some(self.nodes[reference]))
            }
            Op::Detach { node } => self.doc.detach(self.nodes[node]),
            Op::SetAttribute { node, name, value } => {
                self.doc.set_attribute(self.nodes[node], ATTRIBUTES[name], VALUES[value])
            }
            Op::RemoveAttribute { node, name } => self.doc.remove_attribute(self.nodes[node], ATTRIBUTES[name]),
            Op::SetText { node, value } => self.doc.set_text(self.nodes[ELEMENTS + node], VALUES[value]),
        };
    }

    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for node in self.doc.descendants() {
            if node == self.doc.root() {
                continue;
            }
            snapshot.parents.insert(node, self.doc.parent(node));
            for name in ATTRIBUTES {
                if let Some(value) = self.doc.attribute(node, name) {
                    snapshot.attributes.insert((node, name), value.to_string());
                }
            }
            if let Some(text) = self.doc.text(node) {
                snapshot.texts.insert(node, text.to_string());
            }
        }
        snapshot
    }
}

#[derive(Default)]
struct Snapshot {
    parents: BTreeMap<NodeId, Option<NodeId>>,
    attributes: BTreeMap<(NodeId, &'static str), String>,
    texts: BTreeMap<NodeId, String>,
}

impl Snapshot {
    fn nodes(&self) -> BTreeSet<NodeId> {
        self.parents.keys().copied().collect()
    }
}

fn as_set(nodes: &[NodeId]) -> BTreeSet<NodeId> {
    nodes.iter().copied().collect()
}

fn run(setup: &[Op], batch: &[Op]) -> (Fixture, Snapshot, Snapshot, Vec<canopy_core::MutationRecord<NodeId>>) {
    let mut fixture = Fixture::new();
    for op in setup {
        fixture.apply(op);
    }
    let before = fixture.snapshot();
    fixture.doc.observe(ObserverOptions::everything());
    for op in batch {
        fixture.apply(op);
    }
    let records = fixture.doc.take_records();
    let after = fixture.snapshot();
    (fixture, before, after, records)
}

proptest! {
    /// Added and removed nodes are exactly the set difference of the subtree snapshots.
    #[test]
    fn added_removed_match_snapshot_diff(
        setup in prop::collection::vec(op(), 0..30),
        batch in prop::collection::vec(op(), 0..30),
    ) {
        let (fixture, before, after, records) = run(&setup, &batch);
        let projection = project(&fixture.doc, fixture.doc.root(), &records, &[], ProjectionOptions::new());
        let changed = projection.changed(MatchMode::Everything, true);

        let expected_added: BTreeSet<_> = after.nodes().difference(&before.nodes()).copied().collect();
        let expected_removed: BTreeSet<_> = before.nodes().difference(&after.nodes()).copied().collect();

        prop_assert_eq!(changed.added.len(), as_set(&changed.added).len(), "duplicate added nodes");
        prop_assert_eq!(changed.removed.len(), as_set(&changed.removed).len(), "duplicate removed nodes");
        prop_assert_eq!(as_set(&changed.added), expected_added);
        prop_assert_eq!(as_set(&changed.removed), expected_removed);
    }

    /// A node is reparented exactly when it stayed in the subtree under a different parent.
    #[test]
    fn reparented_matches_parent_diff(
        setup in prop::collection::vec(op(), 0..30),
        batch in prop::collection::vec(op(), 0..30),
    ) {
        let (fixture, before, after, records) = run(&setup, &batch);
        let projection = project(&fixture.doc, fixture.doc.root(), &records, &[], ProjectionOptions::new());
        let changed = projection.changed(MatchMode::Everything, true);

        let expected: BTreeSet<_> = before
            .parents
            .iter()
            .filter(|(node, parent)| after.parents.get(*node).is_some_and(|now| now != *parent))
            .map(|(node, _)| *node)
            .collect();
        prop_assert_eq!(as_set(&changed.reparented), expected);
    }

    /// Reordered nodes kept their parent and both endpoints.
    #[test]
    fn reordered_nodes_kept_their_parent(
        setup in prop::collection::vec(op(), 0..30),
        batch in prop::collection::vec(op(), 0..30),
    ) {
        let (fixture, before, after, records) = run(&setup, &batch);
        let options = ProjectionOptions::new().with_track_reordering(true);
        let projection = project(&fixture.doc, fixture.doc.root(), &records, &[], options);
        let changed = projection.changed(MatchMode::Everything, true);

        for node in &changed.reordered {
            prop_assert!(before.parents.contains_key(node) && after.parents.contains_key(node));
            prop_assert_eq!(before.parents[node], after.parents[node]);
        }
        prop_assert!(as_set(&changed.reordered).is_disjoint(&as_set(&changed.reparented)));
    }

    /// Attribute changes are reported exactly for values that differ between endpoints.
    #[test]
    fn attribute_changes_match_value_diff(
        setup in prop::collection::vec(op(), 0..30),
        batch in prop::collection::vec(op(), 0..30),
    ) {
        let (fixture, before, after, records) = run(&setup, &batch);
        let projection = project(&fixture.doc, fixture.doc.root(), &records, &[], ProjectionOptions::new());
        let reported = projection.attributes_changed(MatchMode::Everything, None);

        let stayed: BTreeSet<_> = before.nodes().intersection(&after.nodes()).copied().collect();
        for name in ATTRIBUTES {
            let expected: BTreeSet<_> = stayed
                .iter()
                .filter(|&&node| before.attributes.get(&(node, name)) != after.attributes.get(&(node, name)))
                .copied()
                .collect();
            let actual = reported.get(name).map(|nodes| as_set(nodes)).unwrap_or_default();
            prop_assert_eq!(actual, expected, "attribute {}", name);
        }
    }

    /// Text changes are reported exactly for payloads that differ between endpoints.
    #[test]
    fn character_data_changes_match_text_diff(
        setup in prop::collection::vec(op(), 0..30),
        batch in prop::collection::vec(op(), 0..30),
    ) {
        let (fixture, before, after, records) = run(&setup, &batch);
        let projection = project(&fixture.doc, fixture.doc.root(), &records, &[], ProjectionOptions::new());
        let reported = as_set(&projection.character_data_changed(MatchMode::CharacterData));

        let expected: BTreeSet<_> = before
            .texts
            .iter()
            .filter(|(node, text)| after.texts.get(*node).is_some_and(|now| now != *text))
            .map(|(node, _)| *node)
            .collect();
        prop_assert_eq!(reported, expected);
    }
}
