//! AWS resource provider
//!
//! Implements the reconciliation engine's provider seam for the four resource
//! kinds: IAM roles, Lambda functions, ECR repositories (aws-sdk clients) and
//! AgentCore Gateway targets (SigV4-signed REST against the control plane).
//! Adapters stay thin: AWS semantics belong to AWS, not to this crate.

pub mod gateway;
pub mod provider;
pub mod sign;
pub mod spec;

mod function;
mod iam;
mod repository;

pub use gateway::{Gateway, GatewayControlClient, GatewayTarget};
pub use provider::AwsProvider;
pub use sign::SignedClient;
pub use spec::{FunctionSpec, GatewayTargetSpec, PackageSpec, RepositorySpec, RoleSpec};

use snowgate_core::ProviderError;

/// Wrap an SDK/transport failure into the provider error the engine reports.
pub(crate) fn external_err(
    action: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> ProviderError {
    ProviderError::with_source(format!("{action} failed"), err)
}
