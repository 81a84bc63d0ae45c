//! Sync Reconciler
//!
//! Bridges the two push-based remote feeds (tables, sales) into one local,
//! consistent read model.
//!
//! # Merge law
//!
//! ```text
//! FeedEvent::Snapshot(list) ──▶ replace whole local collection
//!                                (tables re-sorted by table_id)
//! FeedEvent::Error(e)       ──▶ observer.on_error, keep last snapshot
//! ```
//!
//! Local writes are never applied optimistically: the read model changes only
//! when the store echoes a new snapshot.

pub mod observer;
pub mod reconciler;
pub mod subscription;

pub use observer::{FeedKind, FeedObserver, LoggingObserver};
pub use reconciler::SyncReconciler;
pub use subscription::Subscription;
