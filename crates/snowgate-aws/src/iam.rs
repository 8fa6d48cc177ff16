// IAM role operations
//
// Dependent order on teardown is fixed: inline policies, then managed policy
// attachments, then instance-profile memberships, then the role itself.

use aws_sdk_iam::Client;
use serde_json::json;
use snowgate_core::{ProviderError, ResourceState};
use tracing::debug;

use crate::external_err;
use crate::spec::RoleSpec;

pub(crate) async fn probe(iam: &Client, name: &str) -> Result<ResourceState, ProviderError> {
    match iam.get_role().role_name(name).send().await {
        Ok(output) => {
            let spec = output.role().map(|role| {
                json!({
                    "arn": role.arn(),
                    "path": role.path(),
                })
            });
            Ok(ResourceState::present(spec))
        }
        Err(err)
            if err
                .as_service_error()
                .map(|e| e.is_no_such_entity_exception())
                .unwrap_or(false) =>
        {
            Ok(ResourceState::absent())
        }
        Err(err) => Err(external_err("describing role", err)),
    }
}

pub(crate) async fn create(iam: &Client, name: &str, spec: &RoleSpec) -> Result<(), ProviderError> {
    let trust_policy = serde_json::to_string(&spec.assume_role_policy)
        .map_err(|err| ProviderError::with_source("serializing trust policy", err))?;

    let mut request = iam
        .create_role()
        .role_name(name)
        .assume_role_policy_document(trust_policy);
    if let Some(description) = spec.description.as_deref() {
        request = request.description(description);
    }
    request
        .send()
        .await
        .map_err(|err| external_err("creating role", err))?;

    for (policy_name, document) in &spec.inline_policies {
        let document = serde_json::to_string(document)
            .map_err(|err| ProviderError::with_source("serializing inline policy", err))?;
        iam.put_role_policy()
            .role_name(name)
            .policy_name(policy_name.as_str())
            .policy_document(document)
            .send()
            .await
            .map_err(|err| external_err("attaching inline policy", err))?;
    }

    for policy_arn in &spec.attached_policy_arns {
        iam.attach_role_policy()
            .role_name(name)
            .policy_arn(policy_arn.as_str())
            .send()
            .await
            .map_err(|err| external_err("attaching managed policy", err))?;
    }

    Ok(())
}

pub(crate) async fn delete_dependents(iam: &Client, name: &str) -> Result<(), ProviderError> {
    let inline = iam
        .list_role_policies()
        .role_name(name)
        .send()
        .await
        .map_err(|err| external_err("listing inline policies", err))?;
    for policy_name in inline.policy_names() {
        debug!(role = name, policy = %policy_name, "deleting inline policy");
        iam.delete_role_policy()
            .role_name(name)
            .policy_name(policy_name.as_str())
            .send()
            .await
            .map_err(|err| external_err("deleting inline policy", err))?;
    }

    let attached = iam
        .list_attached_role_policies()
        .role_name(name)
        .send()
        .await
        .map_err(|err| external_err("listing attached policies", err))?;
    for policy in attached.attached_policies() {
        if let Some(policy_arn) = policy.policy_arn() {
            debug!(role = name, policy = policy_arn, "detaching managed policy");
            iam.detach_role_policy()
                .role_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|err| external_err("detaching managed policy", err))?;
        }
    }

    let profiles = iam
        .list_instance_profiles_for_role()
        .role_name(name)
        .send()
        .await
        .map_err(|err| external_err("listing instance profiles", err))?;
    for profile in profiles.instance_profiles() {
        debug!(
            role = name,
            profile = %profile.instance_profile_name(),
            "removing role from instance profile"
        );
        iam.remove_role_from_instance_profile()
            .instance_profile_name(profile.instance_profile_name())
            .role_name(name)
            .send()
            .await
            .map_err(|err| external_err("removing role from instance profile", err))?;
    }

    Ok(())
}

pub(crate) async fn delete(iam: &Client, name: &str) -> Result<(), ProviderError> {
    iam.delete_role()
        .role_name(name)
        .send()
        .await
        .map_err(|err| external_err("deleting role", err))?;
    Ok(())
}
