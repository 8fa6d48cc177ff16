// Deployment pipeline
//
// Reconciles resources one at a time in dependency order: execution role,
// repository (image packaging only), function, gateway role, then - after
// the gateway itself is ensured create-or-reuse - the gateway target.
// Ordering lives here, with the caller; the engine never infers it.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use serde_json::json;
use snowgate_aws::spec::TOOL_NAME;
use snowgate_aws::{AwsProvider, FunctionSpec, GatewayTargetSpec, PackageSpec, RepositorySpec, RoleSpec};
use snowgate_config::{DeployConfig, PackageKind};
use snowgate_core::{Reconciler, ResourceDescriptor};
use tracing::info;

pub async fn run(config: DeployConfig) -> Result<()> {
    // Pre-flight: nothing touches the network until this passes.
    config.validate()?;

    let region = config.aws.region.clone();
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.clone()))
        .load()
        .await;

    let settle_delay = Duration::from_secs(config.reconcile.settle_delay_secs);
    let reconciler = Reconciler::with_settle_delay(AwsProvider::new(&sdk_config), settle_delay);

    let descriptors = plan(&config)?;
    let report = reconciler.reconcile_all(&descriptors).await;
    for change in &report.applied {
        info!(kind = %change.kind, name = %change.name, action = %change.action, "reconciled");
    }
    if let Some(failure) = report.failure {
        return Err(failure).context("deployment did not converge");
    }

    // New roles propagate asynchronously; give IAM a beat before anything
    // assumes them.
    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    // The gateway outlives deployments (clients hold its URL), so it is
    // ensured create-or-reuse instead of replaced.
    let gateway_role_arn = role_arn(&config, &config.gateway.role_name);
    let gateway = reconciler
        .provider()
        .gateway()
        .ensure_gateway(&config.gateway.name, &gateway_role_arn)
        .await?;

    let target_spec = GatewayTargetSpec {
        gateway_id: gateway.gateway_id.clone(),
        lambda_arn: lambda_arn(&config),
        description: None,
    };
    let target_descriptor = target_spec.into_descriptor(config.gateway.target_name.clone())?;
    let action = reconciler.reconcile(&target_descriptor).await?;
    info!(name = %config.gateway.target_name, %action, "gateway target reconciled");

    info!("deployment summary");
    info!("  function:    {}", lambda_arn(&config));
    info!("  gateway id:  {}", gateway.gateway_id);
    info!("  gateway url: {}", gateway.mcp_url(&region));
    info!(
        "  tool:        {}___{}",
        config.gateway.target_name, TOOL_NAME
    );
    Ok(())
}

/// Descriptors for everything that precedes the gateway, in reconciliation
/// order. The gateway target is planned separately once the gateway id is
/// known.
pub fn plan(config: &DeployConfig) -> Result<Vec<ResourceDescriptor>> {
    let mut descriptors = Vec::new();

    descriptors.push(
        execution_role_spec(config).into_descriptor(config.function.role_name.clone())?,
    );

    if config.function.package == PackageKind::Image {
        descriptors
            .push(RepositorySpec::default().into_descriptor(config.repository.name.clone())?);
    }

    descriptors.push(function_spec(config)?.into_descriptor(config.function.name.clone())?);

    descriptors
        .push(gateway_role_spec(config).into_descriptor(config.gateway.role_name.clone())?);

    Ok(descriptors)
}

fn role_arn(config: &DeployConfig, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{role_name}", config.aws.account_id)
}

fn lambda_arn(config: &DeployConfig) -> String {
    format!(
        "arn:aws:lambda:{}:{}:function:{}",
        config.aws.region, config.aws.account_id, config.function.name
    )
}

/// Execution role the function runs under: Lambda trust, basic execution
/// logs, and read access to the Snowflake secret.
fn execution_role_spec(config: &DeployConfig) -> RoleSpec {
    RoleSpec {
        assume_role_policy: json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" },
                "Action": "sts:AssumeRole"
            }]
        }),
        description: Some(format!(
            "Execution role for the {} Snowflake query function",
            config.function.name
        )),
        inline_policies: BTreeMap::from([(
            "SnowflakeSecretAccess".to_string(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": "secretsmanager:GetSecretValue",
                    "Resource": "*"
                }]
            }),
        )]),
        attached_policy_arns: vec![
            "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole".to_string(),
        ],
    }
}

/// Role the gateway assumes to invoke the function, scoped to this account.
fn gateway_role_spec(config: &DeployConfig) -> RoleSpec {
    let account_id = &config.aws.account_id;
    let region = &config.aws.region;
    RoleSpec {
        assume_role_policy: json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "AssumeRolePolicy",
                "Effect": "Allow",
                "Principal": { "Service": "bedrock-agentcore.amazonaws.com" },
                "Action": "sts:AssumeRole",
                "Condition": {
                    "StringEquals": { "aws:SourceAccount": account_id },
                    "ArnLike": {
                        "aws:SourceArn": format!("arn:aws:bedrock-agentcore:{region}:{account_id}:*")
                    }
                }
            }]
        }),
        description: Some(format!("Gateway role for {}", config.gateway.name)),
        inline_policies: BTreeMap::from([(
            "AgentCorePolicy".to_string(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "VisualEditor0",
                    "Effect": "Allow",
                    "Action": [
                        "bedrock-agentcore:*",
                        "bedrock:*",
                        "agent-credential-provider:*",
                        "iam:PassRole",
                        "secretsmanager:GetSecretValue",
                        "lambda:InvokeFunction"
                    ],
                    "Resource": "*"
                }]
            }),
        )]),
        attached_policy_arns: Vec::new(),
    }
}

fn function_spec(config: &DeployConfig) -> Result<FunctionSpec> {
    let package = match config.function.package {
        PackageKind::Zip => PackageSpec::Zip {
            path: config
                .function
                .zip_path
                .clone()
                .context("function.zip_path is required for zip packaging")?,
        },
        PackageKind::Image => PackageSpec::Image {
            image_uri: config.image_uri(),
        },
    };

    Ok(FunctionSpec {
        role_arn: role_arn(config, &config.function.role_name),
        runtime: config.function.runtime.clone(),
        handler: config.function.handler.clone(),
        package,
        description: Some("Forwards SQL to Snowflake for the AgentCore gateway".to_string()),
        environment: BTreeMap::from([(
            "SNOWFLAKE_SECRET_NAME".to_string(),
            config.function.secret_name.clone(),
        )]),
        timeout_secs: 30,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowgate_core::ResourceKind;

    fn config() -> DeployConfig {
        let mut config = DeployConfig::default();
        config.aws.account_id = "123456789012".to_string();
        config.function.zip_path = Some("build/bootstrap.zip".to_string());
        config
    }

    #[test]
    fn plan_orders_roles_before_function() {
        let descriptors = plan(&config()).unwrap();
        let kinds: Vec<_> = descriptors.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![ResourceKind::Role, ResourceKind::Function, ResourceKind::Role]
        );
        assert_eq!(descriptors[0].name, "snowgate-lambda-role");
        assert_eq!(descriptors[1].name, "snowgate-query");
    }

    #[test]
    fn image_packaging_adds_repository_before_function() {
        let mut config = config();
        config.function.package = PackageKind::Image;
        let descriptors = plan(&config).unwrap();
        let kinds: Vec<_> = descriptors.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Role,
                ResourceKind::Repository,
                ResourceKind::Function,
                ResourceKind::Role
            ]
        );
    }

    #[test]
    fn function_descriptor_carries_secret_env() {
        let descriptors = plan(&config()).unwrap();
        let function = &descriptors[1];
        assert_eq!(
            function.desired_spec["environment"]["SNOWFLAKE_SECRET_NAME"],
            "snowflake/demo_user"
        );
        assert_eq!(
            function.desired_spec["role_arn"],
            "arn:aws:iam::123456789012:role/snowgate-lambda-role"
        );
    }

    #[test]
    fn gateway_role_trust_is_scoped_to_account() {
        let descriptors = plan(&config()).unwrap();
        let gateway_role = &descriptors[2];
        let condition = &gateway_role.desired_spec["assume_role_policy"]["Statement"][0]["Condition"];
        assert_eq!(condition["StringEquals"]["aws:SourceAccount"], "123456789012");
    }
}
