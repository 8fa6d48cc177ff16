// ResourceProvider over AWS
//
// Dispatches each engine call to the kind's adapter. Probes map the service's
// "not found" into an absent state; every other service error surfaces as a
// provider failure for the engine to classify.

use async_trait::async_trait;
use serde_json::json;
use snowgate_core::{ProviderError, ResourceDescriptor, ResourceKind, ResourceState};

use crate::gateway::GatewayControlClient;
use crate::spec::{FunctionSpec, GatewayTargetSpec, RepositorySpec, RoleSpec};
use crate::{function, iam, repository};

pub struct AwsProvider {
    iam: aws_sdk_iam::Client,
    lambda: aws_sdk_lambda::Client,
    ecr: aws_sdk_ecr::Client,
    gateway: GatewayControlClient,
}

impl AwsProvider {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
            ecr: aws_sdk_ecr::Client::new(config),
            gateway: GatewayControlClient::new(config.clone()),
        }
    }

    pub fn gateway(&self) -> &GatewayControlClient {
        &self.gateway
    }

    async fn probe_target(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ResourceState, ProviderError> {
        let spec = GatewayTargetSpec::from_spec(&descriptor.desired_spec)?;
        let target = self
            .gateway
            .find_target(&spec.gateway_id, &descriptor.name)
            .await
            .map_err(|err| ProviderError::with_source("listing gateway targets", err))?;
        Ok(match target {
            Some(target) => ResourceState::present(Some(json!({ "targetId": target.target_id }))),
            None => ResourceState::absent(),
        })
    }

    async fn delete_target(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        let spec = GatewayTargetSpec::from_spec(&descriptor.desired_spec)?;
        let target = self
            .gateway
            .find_target(&spec.gateway_id, &descriptor.name)
            .await
            .map_err(|err| ProviderError::with_source("listing gateway targets", err))?
            .ok_or_else(|| {
                ProviderError::new(format!(
                    "gateway target `{}` not found on gateway `{}`",
                    descriptor.name, spec.gateway_id
                ))
            })?;
        self.gateway
            .delete_target(&spec.gateway_id, &target.target_id)
            .await
            .map_err(|err| ProviderError::with_source("deleting gateway target", err))
    }
}

#[async_trait]
impl snowgate_core::ResourceProvider for AwsProvider {
    async fn probe(&self, descriptor: &ResourceDescriptor) -> Result<ResourceState, ProviderError> {
        match descriptor.kind {
            ResourceKind::Role => iam::probe(&self.iam, &descriptor.name).await,
            ResourceKind::Function => function::probe(&self.lambda, &descriptor.name).await,
            ResourceKind::Repository => repository::probe(&self.ecr, &descriptor.name).await,
            ResourceKind::GatewayTarget => self.probe_target(descriptor).await,
        }
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        match descriptor.kind {
            ResourceKind::Role => {
                let spec = RoleSpec::from_spec(&descriptor.desired_spec)?;
                iam::create(&self.iam, &descriptor.name, &spec).await
            }
            ResourceKind::Function => {
                let spec = FunctionSpec::from_spec(&descriptor.desired_spec)?;
                function::create(&self.lambda, &descriptor.name, &spec).await
            }
            ResourceKind::Repository => {
                let spec = RepositorySpec::from_spec(&descriptor.desired_spec)?;
                repository::create(&self.ecr, &descriptor.name, &spec).await
            }
            ResourceKind::GatewayTarget => {
                let spec = GatewayTargetSpec::from_spec(&descriptor.desired_spec)?;
                self.gateway
                    .create_target(&descriptor.name, &spec)
                    .await
                    .map(|_| ())
                    .map_err(|err| ProviderError::with_source("creating gateway target", err))
            }
        }
    }

    async fn delete_dependents(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), ProviderError> {
        match descriptor.kind {
            ResourceKind::Role => iam::delete_dependents(&self.iam, &descriptor.name).await,
            ResourceKind::Repository => {
                repository::delete_dependents(&self.ecr, &descriptor.name).await
            }
            // Functions and gateway targets have no dependent sub-resources.
            ResourceKind::Function | ResourceKind::GatewayTarget => Ok(()),
        }
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        match descriptor.kind {
            ResourceKind::Role => iam::delete(&self.iam, &descriptor.name).await,
            ResourceKind::Function => function::delete(&self.lambda, &descriptor.name).await,
            ResourceKind::Repository => repository::delete(&self.ecr, &descriptor.name).await,
            ResourceKind::GatewayTarget => self.delete_target(descriptor).await,
        }
    }
}
