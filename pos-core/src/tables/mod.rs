//! Table Registry
//!
//! Read side comes from the [`SyncReconciler`](crate::sync::SyncReconciler);
//! writes (initialization, Save) go straight to the table store and become
//! visible once the feed echoes them.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{InitOutcome, TableRegistry};
