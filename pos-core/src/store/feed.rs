//! Snapshot feed plumbing
//!
//! Every delivery carries the complete collection. Subscribers each own a
//! single-consumer channel; a closed receiver is pruned on the next publish.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::error::StoreError;

/// One delivery on a live feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent<T> {
    /// Complete current listing of the collection
    Snapshot(Vec<T>),
    /// Transport failure; the subscription stays alive
    Error(StoreError),
}

/// Receiving half of a feed subscription
pub type FeedReceiver<T> = mpsc::UnboundedReceiver<FeedEvent<T>>;

/// Fan-out of snapshots to every live subscriber
///
/// While held, publishes are recorded as pending instead of sent. The store
/// re-publishes its current listing on [`FeedHub::release`], which is how the
/// delay between a write and its echo is made observable.
#[derive(Debug)]
pub struct FeedHub<T> {
    subscribers: DashMap<u64, mpsc::UnboundedSender<FeedEvent<T>>>,
    next_id: AtomicU64,
    held: AtomicBool,
    pending: AtomicBool,
}

impl<T: Clone> FeedHub<T> {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            held: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// Register a subscriber and hand it `current` immediately
    pub fn subscribe(&self, current: Vec<T>) -> FeedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is still in hand, send cannot fail
        let _ = tx.send(FeedEvent::Snapshot(current));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, tx);
        rx
    }

    /// Deliver a snapshot to all subscribers (or defer it while held)
    pub fn publish(&self, snapshot: Vec<T>) {
        if self.held.load(Ordering::SeqCst) {
            self.pending.store(true, Ordering::SeqCst);
            return;
        }
        self.broadcast(FeedEvent::Snapshot(snapshot));
    }

    /// Deliver a transport error to all subscribers
    pub fn publish_error(&self, error: StoreError) {
        self.broadcast(FeedEvent::Error(error));
    }

    /// Defer snapshot deliveries until [`FeedHub::release`]
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Stop deferring; returns whether a publish was deferred meanwhile
    pub fn release(&self) -> bool {
        self.held.store(false, Ordering::SeqCst);
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn broadcast(&self, event: FeedEvent<T>) {
        self.subscribers.retain(|id, tx| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                tracing::debug!(subscriber = id, "Pruning closed feed subscriber");
            }
            alive
        });
    }
}

impl<T: Clone> Default for FeedHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_current_snapshot() {
        let hub: FeedHub<u32> = FeedHub::new();
        let mut rx = hub.subscribe(vec![1, 2]);
        assert_eq!(rx.recv().await, Some(FeedEvent::Snapshot(vec![1, 2])));
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub: FeedHub<u32> = FeedHub::new();
        let mut a = hub.subscribe(vec![]);
        let mut b = hub.subscribe(vec![]);
        a.recv().await;
        b.recv().await;

        hub.publish(vec![7]);
        assert_eq!(a.recv().await, Some(FeedEvent::Snapshot(vec![7])));
        assert_eq!(b.recv().await, Some(FeedEvent::Snapshot(vec![7])));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let hub: FeedHub<u32> = FeedHub::new();
        let rx = hub.subscribe(vec![]);
        assert_eq!(hub.subscriber_count(), 1);
        drop(rx);
        hub.publish(vec![1]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_hold_defers_snapshots_but_not_errors() {
        let hub: FeedHub<u32> = FeedHub::new();
        let mut rx = hub.subscribe(vec![]);
        rx.recv().await;

        hub.hold();
        hub.publish(vec![1]);
        hub.publish_error(StoreError::unavailable("blip"));
        assert_eq!(
            rx.recv().await,
            Some(FeedEvent::Error(StoreError::unavailable("blip")))
        );
        assert!(rx.try_recv().is_err());

        assert!(hub.release());
        assert!(!hub.release());
    }
}
