use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::observer::FeedKind;

/// Handle to a running feed listener
///
/// Dropping the handle cancels the listener; [`Subscription::unsubscribe`]
/// additionally waits until it has stopped, after which no further delivery
/// can touch local state.
#[derive(Debug)]
pub struct Subscription {
    feed: FeedKind,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(feed: FeedKind, token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            feed,
            token,
            handle: Some(handle),
        }
    }

    pub fn feed(&self) -> FeedKind {
        self.feed
    }

    /// Listener still running
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the listener and wait for it to exit
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::error!(feed = %self.feed, error = %e, "Feed listener ended abnormally");
        }
        tracing::debug!(feed = %self.feed, "Unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
