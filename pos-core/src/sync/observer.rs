use std::fmt;

use crate::store::StoreError;

/// Which live feed an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Tables,
    Sales,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Tables => write!(f, "tables"),
            FeedKind::Sales => write!(f, "sales"),
        }
    }
}

/// Receives transport problems from live feeds.
///
/// Errors never end a subscription; they only mean the local copy may be
/// stale until the next snapshot arrives.
pub trait FeedObserver: Send + Sync {
    fn on_error(&self, feed: FeedKind, error: &StoreError);

    /// The remote side closed the feed
    fn on_closed(&self, feed: FeedKind) {
        tracing::info!(feed = %feed, "Feed closed by store");
    }
}

/// Default observer: log and carry on
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl FeedObserver for LoggingObserver {
    fn on_error(&self, feed: FeedKind, error: &StoreError) {
        tracing::warn!(feed = %feed, error = %error, "Feed delivery failed, keeping last snapshot");
    }
}
