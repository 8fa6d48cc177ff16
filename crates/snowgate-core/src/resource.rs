// Declarative resource descriptions and probed live state

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReconcileError;

/// The kinds of external resources the engine knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Role,
    Function,
    Repository,
    GatewayTarget,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Role => write!(f, "role"),
            ResourceKind::Function => write!(f, "function"),
            ResourceKind::Repository => write!(f, "repository"),
            ResourceKind::GatewayTarget => write!(f, "gateway-target"),
        }
    }
}

/// Declarative description of one named external resource.
///
/// The name is the unique key within kind + account + region and stays stable
/// across reconciliation attempts. The desired spec is an opaque configuration
/// blob specific to the kind, fully determined before reconciliation begins.
/// Descriptors are built fresh per invocation, used once, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    pub desired_spec: Value,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>, desired_spec: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            desired_spec,
        }
    }

    /// Pre-flight check: a descriptor with no name or no spec cannot be
    /// reconciled and must be rejected before any network call.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.name.trim().is_empty() {
            return Err(ReconcileError::Validation {
                reason: format!("{} descriptor has an empty name", self.kind),
            });
        }
        if self.desired_spec.is_null() {
            return Err(ReconcileError::Validation {
                reason: format!("{} `{}` has no desired spec", self.kind, self.name),
            });
        }
        Ok(())
    }
}

/// Live state of a resource as reported by a read-only probe.
///
/// Never cached: the external system is the sole source of truth, so the
/// engine re-probes before every decision.
#[derive(Debug, Clone, Default)]
pub struct ResourceState {
    pub exists: bool,
    pub spec: Option<Value>,
}

impl ResourceState {
    pub fn absent() -> Self {
        Self {
            exists: false,
            spec: None,
        }
    }

    pub fn present(spec: Option<Value>) -> Self {
        Self { exists: true, spec }
    }
}
