//! Summary observer.
//!
//! `MutationSummary` binds a root and a list of queries to a set of
//! subscribers. Each delivered batch of mutation records is projected once,
//! summarized per query in declaration order, and handed to every active
//! subscriber as one slice of summaries.
//!
//! Callbacks run while the tree is borrowed immutably, so they cannot mutate
//! the tree they are told about; changes they cause elsewhere land in the next
//! batch.

use crate::options::observer_options;
use crate::query::{merged_patterns, tracks_reordering, Query};
use crate::subscription::{SubscriptionId, SubscriptionManager};
use crate::summary::{summarize, QuerySummary};
use alloc::vec::Vec;
use canopy_core::{Document, Error, FilterPattern, MutationRecord, NodeId, ObserverOptions, Result, Tree};
use canopy_projection::{project, MutationProjection, ProjectionOptions};

/// A root and its queries, with the subscribers that receive their summaries.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use canopy_core::Document;
/// use canopy_reactive::{MutationSummary, Query};
///
/// let mut doc = Document::new();
/// let mut observer = MutationSummary::builder()
///     .root(doc.root())
///     .query(Query::element("li").unwrap())
///     .build()
///     .unwrap();
///
/// let added = Rc::new(RefCell::new(0));
/// let counter = added.clone();
/// observer.subscribe(move |summaries| *counter.borrow_mut() += summaries[0].added.len());
///
/// observer.connect(&mut doc);
/// let li = doc.create_element("li");
/// doc.append_child(doc.root(), li).unwrap();
///
/// assert!(observer.process(&mut doc));
/// assert_eq!(*added.borrow(), 1);
/// ```
pub struct MutationSummary<N> {
    root: N,
    queries: Vec<Query>,
    /// Union of every query's filter, in declaration order
    patterns: Vec<FilterPattern>,
    projection_options: ProjectionOptions,
    observer_options: ObserverOptions,
    subscriptions: SubscriptionManager<N>,
}

/// Builder for [`MutationSummary`].
pub struct MutationSummaryBuilder<N> {
    root: Option<N>,
    queries: Vec<Query>,
}

impl<N> Default for MutationSummaryBuilder<N> {
    fn default() -> Self {
        Self {
            root: None,
            queries: Vec::new(),
        }
    }
}

impl<N> MutationSummaryBuilder<N>
where
    N: Copy + Eq + core::hash::Hash + core::fmt::Debug,
{
    /// Sets the observed root.
    pub fn root(mut self, root: N) -> Self {
        self.root = Some(root);
        self
    }

    /// Appends a query.
    pub fn query(mut self, query: Query) -> Self {
        self.queries.push(query);
        self
    }

    /// Appends several queries.
    pub fn queries<I>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = Query>,
    {
        self.queries.extend(queries);
        self
    }

    /// Builds the observer.
    ///
    /// Fails if no root was set or no query was declared.
    pub fn build(self) -> Result<MutationSummary<N>> {
        let root = self
            .root
            .ok_or_else(|| Error::invalid_query("a root node is required"))?;
        if self.queries.is_empty() {
            return Err(Error::invalid_query("at least one query is required"));
        }

        let patterns = merged_patterns(&self.queries);
        let projection_options = ProjectionOptions::new().with_track_reordering(tracks_reordering(&self.queries));
        let observer_options = observer_options(&self.queries);
        log::debug!(
            "observing {:?} with {} queries and {} patterns",
            root,
            self.queries.len(),
            patterns.len()
        );

        Ok(MutationSummary {
            root,
            queries: self.queries,
            patterns,
            projection_options,
            observer_options,
            subscriptions: SubscriptionManager::new(),
        })
    }
}

impl<N> MutationSummary<N>
where
    N: Copy + Eq + core::hash::Hash + core::fmt::Debug,
{
    /// Starts building an observer.
    pub fn builder() -> MutationSummaryBuilder<N> {
        MutationSummaryBuilder::default()
    }

    /// Returns the observed root.
    #[inline]
    pub fn root(&self) -> N {
        self.root
    }

    /// Returns the declared queries.
    #[inline]
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Returns the change categories a record source must report.
    #[inline]
    pub fn observer_options(&self) -> &ObserverOptions {
        &self.observer_options
    }

    /// Returns the engine switches derived from the queries.
    #[inline]
    pub fn projection_options(&self) -> ProjectionOptions {
        self.projection_options
    }

    /// Subscribes to batch summaries.
    ///
    /// The callback receives one summary per query, in declaration order.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&[QuerySummary<'_, N>]) + 'static,
    {
        self.subscriptions.subscribe(callback)
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Pauses or resumes a subscription.
    pub fn set_active(&mut self, id: SubscriptionId, active: bool) -> bool {
        self.subscriptions.set_active(id, active)
    }

    /// Returns the number of subscriptions.
    #[inline]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Projects a batch with the merged patterns and derived switches.
    pub fn project<'a, T>(&'a self, tree: &'a T, records: &'a [MutationRecord<N>]) -> MutationProjection<'a, T>
    where
        T: Tree<Node = N>,
    {
        project(tree, self.root, records, &self.patterns, self.projection_options)
    }

    /// Summarizes every query against a projection, in declaration order.
    pub fn summarize<'p, T>(&'p self, projection: &'p MutationProjection<'_, T>) -> Vec<QuerySummary<'p, N>>
    where
        T: Tree<Node = N>,
    {
        self.queries
            .iter()
            .map(|query| summarize(projection, query))
            .collect()
    }

    /// Projects and summarizes a batch, then notifies every active subscriber.
    ///
    /// Returns false without doing any work if the batch is empty or nobody
    /// is listening.
    pub fn deliver<T>(&self, tree: &T, records: &[MutationRecord<N>]) -> bool
    where
        T: Tree<Node = N>,
    {
        if records.is_empty() {
            log::trace!("empty batch, nothing to deliver");
            return false;
        }
        if !self.subscriptions.has_active() {
            log::trace!("no active subscribers, dropping {} records", records.len());
            return false;
        }

        let projection = self.project(tree, records);
        let summaries = self.summarize(&projection);
        self.subscriptions.notify_all(&summaries);
        log::debug!(
            "delivered {} summaries for {} records to {} subscribers",
            summaries.len(),
            records.len(),
            self.subscriptions.len()
        );
        true
    }
}

impl MutationSummary<NodeId> {
    /// Starts recording mutations on `doc` with the derived options.
    pub fn connect(&self, doc: &mut Document) {
        doc.observe(self.observer_options.clone());
    }

    /// Stops recording mutations on `doc`, discarding pending records.
    pub fn disconnect(&self, doc: &mut Document) {
        doc.disconnect();
    }

    /// Drains the records pending on `doc` and delivers them.
    pub fn process(&self, doc: &mut Document) -> bool {
        let records = doc.take_records();
        self.deliver(&*doc, &records)
    }
}
