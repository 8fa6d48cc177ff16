//! Resource model and reconciliation engine
//!
//! A resource is described declaratively (kind + name + desired spec) and
//! driven to that state against an external system through the
//! [`ResourceProvider`] seam. All durable state lives in the external system;
//! the engine holds nothing between invocations.

pub mod error;
pub mod reconcile;
pub mod resource;

pub use error::{ErrorKind, ProviderError, ReconcileError};
pub use reconcile::{
    AppliedChange, ReconcileAction, ReconcileReport, Reconciler, ResourceProvider,
    DEFAULT_SETTLE_DELAY,
};
pub use resource::{ResourceDescriptor, ResourceKind, ResourceState};
