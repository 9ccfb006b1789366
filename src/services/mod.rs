//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion: the store through [`crate::infra::StoreGateway`]
//! and the directory through [`crate::infra::Directory`].

mod group_sync;
mod reconciler;

pub use group_sync::{GroupSync, SyncFailure, SyncOptions, SyncReport, SyncService};
pub use reconciler::{ReconcileService, Reconciler};
