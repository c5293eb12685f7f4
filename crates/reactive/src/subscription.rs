//! Subscription management for summary observers.
//!
//! This module provides subscription IDs and a manager for tracking the
//! callbacks that receive the summaries of each delivered batch.

use crate::summary::QuerySummary;
use alloc::boxed::Box;
use alloc::vec::Vec;
use hashbrown::HashMap;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for summary notifications.
///
/// The summaries borrow the batch's projection and are only valid for the
/// duration of the call.
pub type SummaryCallback<N> = Box<dyn Fn(&[QuerySummary<'_, N>])>;

/// A subscription to batch summaries.
pub struct Subscription<N> {
    /// Unique identifier
    id: SubscriptionId,
    /// Callback to invoke on delivery
    callback: SummaryCallback<N>,
    /// Whether this subscription is active
    active: bool,
}

impl<N> Subscription<N> {
    /// Creates a new subscription.
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&[QuerySummary<'_, N>]) + 'static,
    {
        Self {
            id,
            callback: Box::new(callback),
            active: true,
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this subscription is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pauses or resumes delivery to this subscription.
    #[inline]
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Hands the summaries of one batch to the callback.
    pub fn notify(&self, summaries: &[QuerySummary<'_, N>]) {
        if self.active {
            (self.callback)(summaries);
        }
    }
}

/// Manages the subscriptions of one observer.
pub struct SubscriptionManager<N> {
    /// Subscriptions by ID
    subscriptions: HashMap<SubscriptionId, Subscription<N>>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl<N> Default for SubscriptionManager<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> SubscriptionManager<N> {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to summaries with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&[QuerySummary<'_, N>]) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let subscription = Subscription::new(id, callback);
        self.subscriptions.insert(id, subscription);

        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Pauses or resumes a subscription without removing it.
    ///
    /// Returns true if the subscription exists.
    pub fn set_active(&mut self, id: SubscriptionId, active: bool) -> bool {
        match self.subscriptions.get_mut(&id) {
            Some(sub) => {
                sub.set_active(active);
                true
            }
            None => false,
        }
    }

    /// Notifies a specific subscription.
    pub fn notify(&self, id: SubscriptionId, summaries: &[QuerySummary<'_, N>]) {
        if let Some(sub) = self.subscriptions.get(&id) {
            sub.notify(summaries);
        }
    }

    /// Notifies every active subscription, oldest first.
    pub fn notify_all(&self, summaries: &[QuerySummary<'_, N>]) {
        for id in self.subscription_ids() {
            self.notify(id, summaries);
        }
    }

    /// Returns the number of subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns true if at least one subscription would be notified.
    pub fn has_active(&self) -> bool {
        self.subscriptions.values().any(Subscription::is_active)
    }

    /// Returns all subscription IDs in ascending order.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<SubscriptionId> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Clears all subscriptions.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
