// Reconciliation engine
//
// Drives one resource at a time from its probed state to the desired state.
// Policy is unconditional tear-down-and-recreate for existing resources: the
// engine never diffs a live spec against the desired one. A fixed settle
// delay between delete and create absorbs external propagation latency; it is
// a pragmatic heuristic, not a guarantee.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ReconcileError};
use crate::resource::{ResourceDescriptor, ResourceKind, ResourceState};

/// Settle delay applied between deleting an existing resource and recreating
/// it, matching the propagation pause the deployment scripts always used.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Seam to the external system. One implementation per backend; every call
/// maps to at most a handful of remote operations.
///
/// `probe` is read-only and must report "not found" as an absent
/// [`ResourceState`], never as an error. `delete_dependents` removes attached
/// sub-resources (policies, instance profiles, images) in a fixed order so the
/// parent can be deleted afterwards.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn probe(&self, descriptor: &ResourceDescriptor) -> Result<ResourceState, ProviderError>;

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError>;

    async fn delete_dependents(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), ProviderError>;

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError>;
}

/// What a successful reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The resource was absent and has been created.
    Created,
    /// The resource existed and went through the full delete-then-create cycle.
    Recreated,
    /// Reserved for a spec-diffing policy; the current unconditional-replace
    /// policy never produces it.
    Unchanged,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileAction::Created => write!(f, "created"),
            ReconcileAction::Recreated => write!(f, "recreated"),
            ReconcileAction::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// One successfully reconciled resource within a batch.
#[derive(Debug, Clone)]
pub struct AppliedChange {
    pub kind: ResourceKind,
    pub name: String,
    pub action: ReconcileAction,
}

/// Outcome of reconciling a batch of descriptors in caller order.
///
/// Processing stops at the first failure; `applied` holds everything that
/// converged before it. Resources after the failure were not touched.
#[derive(Debug)]
pub struct ReconcileReport {
    pub applied: Vec<AppliedChange>,
    pub failure: Option<ReconcileError>,
}

impl ReconcileReport {
    pub fn is_converged(&self) -> bool {
        self.failure.is_none()
    }
}

/// Sequential reconciler over a [`ResourceProvider`].
///
/// Holds no state of its own beyond the provider handle and the settle delay;
/// all durable state lives in the external system.
pub struct Reconciler<P> {
    provider: P,
    settle_delay: Duration,
}

impl<P: ResourceProvider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self::with_settle_delay(provider, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(provider: P, settle_delay: Duration) -> Self {
        Self {
            provider,
            settle_delay,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ensure exactly one resource with the descriptor's name exists in the
    /// desired configuration.
    ///
    /// Absent resources are created. Present resources are torn down
    /// (dependents first, then the parent), the settle delay elapses, and the
    /// resource is created fresh. Any failing step aborts the remaining steps
    /// for this resource; a crash mid-sequence is converged by re-running.
    pub async fn reconcile(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ReconcileAction, ReconcileError> {
        descriptor.validate()?;

        let state = self
            .provider
            .probe(descriptor)
            .await
            .map_err(|source| ReconcileError::Probe {
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                source,
            })?;

        if !state.exists {
            debug!(kind = %descriptor.kind, name = %descriptor.name, "absent, creating");
            self.create(descriptor).await?;
            info!(kind = %descriptor.kind, name = %descriptor.name, "created");
            return Ok(ReconcileAction::Created);
        }

        // No in-place diffing: an existing resource is replaced wholesale,
        // whatever its live spec says.
        warn!(
            kind = %descriptor.kind,
            name = %descriptor.name,
            "already exists, deleting and recreating"
        );

        self.provider
            .delete_dependents(descriptor)
            .await
            .map_err(|source| ReconcileError::Delete {
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                source,
            })?;

        self.provider
            .delete(descriptor)
            .await
            .map_err(|source| ReconcileError::Delete {
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                source,
            })?;

        if !self.settle_delay.is_zero() {
            debug!(
                kind = %descriptor.kind,
                name = %descriptor.name,
                delay_secs = self.settle_delay.as_secs(),
                "waiting for deletion to settle"
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        self.create(descriptor).await?;
        info!(kind = %descriptor.kind, name = %descriptor.name, "recreated");
        Ok(ReconcileAction::Recreated)
    }

    /// Reconcile a batch strictly in the order given, stopping at the first
    /// failure. Dependency ordering is the caller's job: leaf resources
    /// first, dependents after. No ordering is inferred here.
    pub async fn reconcile_all(&self, descriptors: &[ResourceDescriptor]) -> ReconcileReport {
        let mut applied = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match self.reconcile(descriptor).await {
                Ok(action) => applied.push(AppliedChange {
                    kind: descriptor.kind,
                    name: descriptor.name.clone(),
                    action,
                }),
                Err(err) => {
                    return ReconcileReport {
                        applied,
                        failure: Some(err),
                    };
                }
            }
        }
        ReconcileReport {
            applied,
            failure: None,
        }
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ReconcileError> {
        self.provider
            .create(descriptor)
            .await
            .map_err(|source| ReconcileError::Create {
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scripted provider: records the call sequence and fails on demand.
    #[derive(Default)]
    struct ScriptedProvider {
        existing: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
        fail_probe: bool,
        fail_create: bool,
        fail_delete_dependents: bool,
        fail_delete: bool,
    }

    impl ScriptedProvider {
        fn with_existing(names: &[&str]) -> Self {
            Self {
                existing: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, op: &str, descriptor: &ResourceDescriptor) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{op}:{}", descriptor.name));
        }
    }

    #[async_trait]
    impl ResourceProvider for ScriptedProvider {
        async fn probe(
            &self,
            descriptor: &ResourceDescriptor,
        ) -> Result<ResourceState, ProviderError> {
            self.record("probe", descriptor);
            if self.fail_probe {
                return Err(ProviderError::new("authentication failure"));
            }
            let exists = self.existing.lock().unwrap().contains(&descriptor.name);
            Ok(if exists {
                ResourceState::present(None)
            } else {
                ResourceState::absent()
            })
        }

        async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
            self.record("create", descriptor);
            if self.fail_create {
                return Err(ProviderError::new("create rejected"));
            }
            self.existing
                .lock()
                .unwrap()
                .insert(descriptor.name.clone());
            Ok(())
        }

        async fn delete_dependents(
            &self,
            descriptor: &ResourceDescriptor,
        ) -> Result<(), ProviderError> {
            self.record("delete_dependents", descriptor);
            if self.fail_delete_dependents {
                return Err(ProviderError::new("dependent still in use"));
            }
            Ok(())
        }

        async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
            self.record("delete", descriptor);
            if self.fail_delete {
                return Err(ProviderError::new("delete rejected"));
            }
            self.existing.lock().unwrap().remove(&descriptor.name);
            Ok(())
        }
    }

    fn function_descriptor(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Function, name, json!({"runtime": "provided"}))
    }

    #[tokio::test]
    async fn absent_resource_is_created() {
        let reconciler =
            Reconciler::with_settle_delay(ScriptedProvider::default(), Duration::ZERO);
        let action = reconciler
            .reconcile(&function_descriptor("f1"))
            .await
            .unwrap();
        assert_eq!(action, ReconcileAction::Created);
        assert_eq!(reconciler.provider().calls(), vec!["probe:f1", "create:f1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn present_resource_goes_through_full_cycle() {
        let provider = ScriptedProvider::with_existing(&["f1"]);
        let reconciler = Reconciler::new(provider);
        let action = reconciler
            .reconcile(&function_descriptor("f1"))
            .await
            .unwrap();
        assert_eq!(action, ReconcileAction::Recreated);
        assert_eq!(
            reconciler.provider().calls(),
            vec!["probe:f1", "delete_dependents:f1", "delete:f1", "create:f1"]
        );
    }

    #[tokio::test]
    async fn dependent_failure_leaves_parent_untouched() {
        let provider = ScriptedProvider {
            fail_delete_dependents: true,
            ..ScriptedProvider::with_existing(&["r1"])
        };
        let reconciler = Reconciler::with_settle_delay(provider, Duration::ZERO);
        let desc = ResourceDescriptor::new(ResourceKind::Role, "r1", json!({}));
        let err = reconciler.reconcile(&desc).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Delete);
        // Parent delete and create must never have been attempted.
        assert_eq!(
            reconciler.provider().calls(),
            vec!["probe:r1", "delete_dependents:r1"]
        );
    }

    #[tokio::test]
    async fn probe_failure_issues_no_mutations() {
        let provider = ScriptedProvider {
            fail_probe: true,
            ..Default::default()
        };
        let reconciler = Reconciler::with_settle_delay(provider, Duration::ZERO);
        let err = reconciler
            .reconcile(&function_descriptor("f1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Probe);
        assert_eq!(reconciler.provider().calls(), vec!["probe:f1"]);
    }

    #[tokio::test]
    async fn create_failure_is_reported_as_create_kind() {
        let provider = ScriptedProvider {
            fail_create: true,
            ..Default::default()
        };
        let reconciler = Reconciler::with_settle_delay(provider, Duration::ZERO);
        let err = reconciler
            .reconcile(&function_descriptor("f1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Create);
    }

    #[tokio::test]
    async fn invalid_descriptor_fails_before_any_call() {
        let reconciler =
            Reconciler::with_settle_delay(ScriptedProvider::default(), Duration::ZERO);
        let desc = ResourceDescriptor::new(ResourceKind::Role, "", json!({}));
        let err = reconciler.reconcile(&desc).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(reconciler.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() {
        let provider = ScriptedProvider {
            fail_create: true,
            ..Default::default()
        };
        let reconciler = Reconciler::with_settle_delay(provider, Duration::ZERO);
        let descriptors = vec![function_descriptor("f1"), function_descriptor("f2")];
        let report = reconciler.reconcile_all(&descriptors).await;
        assert!(!report.is_converged());
        assert!(report.applied.is_empty());
        // f2 was never reached.
        assert_eq!(reconciler.provider().calls(), vec!["probe:f1", "create:f1"]);
    }

    #[tokio::test]
    async fn batch_preserves_caller_order() {
        let reconciler =
            Reconciler::with_settle_delay(ScriptedProvider::default(), Duration::ZERO);
        let descriptors = vec![
            ResourceDescriptor::new(ResourceKind::Role, "role", json!({})),
            function_descriptor("fn"),
            ResourceDescriptor::new(ResourceKind::GatewayTarget, "target", json!({})),
        ];
        let report = reconciler.reconcile_all(&descriptors).await;
        assert!(report.is_converged());
        let names: Vec<_> = report.applied.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["role", "fn", "target"]);
    }
}
