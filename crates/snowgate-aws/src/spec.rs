// Desired-spec types for each resource kind
//
// These serialize into the opaque blob a ResourceDescriptor carries, so the
// engine stays ignorant of AWS shapes while the provider gets typed access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use snowgate_core::{ProviderError, ResourceDescriptor, ResourceKind};

/// Tool every gateway target exposes; the gateway prefixes it with the
/// target name when advertising it (`<target>___execute_snowflake_query`).
pub const TOOL_NAME: &str = "execute_snowflake_query";

const TOOL_DESCRIPTION: &str =
    "Execute a SQL query on Snowflake database. Default query: SELECT current_version()";

/// IAM role: trust policy plus its dependent attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub assume_role_policy: Value,
    #[serde(default)]
    pub description: Option<String>,
    /// Inline policy name -> policy document.
    #[serde(default)]
    pub inline_policies: BTreeMap<String, Value>,
    /// Managed policy ARNs to attach after creation.
    #[serde(default)]
    pub attached_policy_arns: Vec<String>,
}

/// How the Lambda code artifact is delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageSpec {
    Zip { path: String },
    Image { image_uri: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub role_arn: String,
    pub runtime: String,
    pub handler: String,
    pub package: PackageSpec,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: i32,
}

fn default_timeout_secs() -> i32 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySpec {
    #[serde(default)]
    pub scan_on_push: bool,
}

/// AgentCore Gateway target wiring a Lambda behind the MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTargetSpec {
    pub gateway_id: String,
    pub lambda_arn: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl GatewayTargetSpec {
    /// MCP Lambda target configuration, as the control plane expects it.
    pub fn target_configuration(&self) -> Value {
        json!({
            "mcp": {
                "lambda": {
                    "lambdaArn": self.lambda_arn,
                    "toolSchema": {
                        "inlinePayload": [
                            {
                                "name": TOOL_NAME,
                                "description": TOOL_DESCRIPTION,
                                "inputSchema": {
                                    "type": "object",
                                    "properties": {
                                        "sql": {
                                            "type": "string",
                                            "description": "SQL query to execute on Snowflake"
                                        }
                                    },
                                    "required": ["sql"]
                                }
                            }
                        ]
                    }
                }
            }
        })
    }

    /// The gateway invokes the Lambda with its own IAM role; no static keys.
    pub fn credential_provider_configurations(&self) -> Value {
        json!([{ "credentialProviderType": "GATEWAY_IAM_ROLE" }])
    }
}

macro_rules! descriptor_impls {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            pub fn into_descriptor(
                self,
                name: impl Into<String>,
            ) -> Result<ResourceDescriptor, ProviderError> {
                let spec = serde_json::to_value(&self).map_err(|err| {
                    ProviderError::with_source("serializing desired spec", err)
                })?;
                Ok(ResourceDescriptor::new($kind, name, spec))
            }

            pub fn from_spec(spec: &Value) -> Result<Self, ProviderError> {
                serde_json::from_value(spec.clone()).map_err(|err| {
                    ProviderError::with_source(
                        format!("desired spec is not a valid {} spec", $kind),
                        err,
                    )
                })
            }
        }
    };
}

descriptor_impls!(RoleSpec, ResourceKind::Role);
descriptor_impls!(FunctionSpec, ResourceKind::Function);
descriptor_impls!(RepositorySpec, ResourceKind::Repository);
descriptor_impls!(GatewayTargetSpec, ResourceKind::GatewayTarget);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_spec_round_trips_through_descriptor() {
        let spec = RoleSpec {
            assume_role_policy: json!({"Version": "2012-10-17"}),
            description: Some("gateway role".into()),
            inline_policies: BTreeMap::from([("AgentCorePolicy".into(), json!({"Statement": []}))]),
            attached_policy_arns: vec![
                "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole".into(),
            ],
        };
        let descriptor = spec.clone().into_descriptor("snowgate-lambda-role").unwrap();
        assert_eq!(descriptor.kind, ResourceKind::Role);

        let parsed = RoleSpec::from_spec(&descriptor.desired_spec).unwrap();
        assert_eq!(parsed.attached_policy_arns, spec.attached_policy_arns);
        assert!(parsed.inline_policies.contains_key("AgentCorePolicy"));
    }

    #[test]
    fn malformed_spec_blob_is_rejected() {
        assert!(FunctionSpec::from_spec(&json!({"runtime": 7})).is_err());
    }

    #[test]
    fn target_configuration_matches_gateway_contract() {
        let spec = GatewayTargetSpec {
            gateway_id: "gw-123".into(),
            lambda_arn: "arn:aws:lambda:us-east-1:123456789012:function:snowgate-query".into(),
            description: None,
        };
        let config = spec.target_configuration();
        assert_eq!(
            config["mcp"]["lambda"]["lambdaArn"],
            "arn:aws:lambda:us-east-1:123456789012:function:snowgate-query"
        );
        let tool = &config["mcp"]["lambda"]["toolSchema"]["inlinePayload"][0];
        assert_eq!(tool["name"], "execute_snowflake_query");
        assert_eq!(tool["inputSchema"]["required"][0], "sql");
    }

    #[test]
    fn gateway_credentials_use_iam_role() {
        let spec = GatewayTargetSpec {
            gateway_id: "gw".into(),
            lambda_arn: "arn".into(),
            description: None,
        };
        assert_eq!(
            spec.credential_provider_configurations()[0]["credentialProviderType"],
            "GATEWAY_IAM_ROLE"
        );
    }

    #[test]
    fn function_spec_defaults_timeout() {
        let spec = FunctionSpec::from_spec(&json!({
            "role_arn": "arn",
            "runtime": "provided.al2023",
            "handler": "bootstrap",
            "package": {"zip": {"path": "build/bootstrap.zip"}}
        }))
        .unwrap();
        assert_eq!(spec.timeout_secs, 30);
        assert!(matches!(spec.package, PackageSpec::Zip { .. }));
    }
}
