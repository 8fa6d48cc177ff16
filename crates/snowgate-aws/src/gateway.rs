// AgentCore Gateway control plane
//
// Gateways and their targets are managed over SigV4-signed REST. The gateway
// itself is ensured create-or-reuse (it is never torn down); targets are the
// reconciled resource and get the full replace cycle.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::sign::SignedClient;
use crate::spec::GatewayTargetSpec;

/// Signing name shared by the control plane and the MCP data plane.
pub const SERVICE_NAME: &str = "bedrock-agentcore";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub gateway_id: String,
    #[serde(default)]
    pub gateway_url: Option<String>,
    pub name: String,
}

impl Gateway {
    /// MCP endpoint for the gateway, derived when the control plane did not
    /// return one.
    pub fn mcp_url(&self, region: &str) -> String {
        self.gateway_url.clone().unwrap_or_else(|| {
            format!(
                "https://{}.gateway.bedrock-agentcore.{region}.amazonaws.com/mcp",
                self.gateway_id
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTarget {
    pub target_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ItemPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

pub struct GatewayControlClient {
    signed: SignedClient,
    endpoint: String,
}

impl GatewayControlClient {
    pub fn new(config: aws_config::SdkConfig) -> Self {
        let signed = SignedClient::new(config, SERVICE_NAME);
        let endpoint = format!(
            "https://bedrock-agentcore-control.{}.amazonaws.com",
            signed.region()
        );
        Self { signed, endpoint }
    }

    pub fn region(&self) -> &str {
        self.signed.region()
    }

    pub async fn list_gateways(&self) -> Result<Vec<Gateway>> {
        let body = self.signed.get(&format!("{}/gateways/", self.endpoint)).await?;
        let page: ItemPage<Gateway> = serde_json::from_value(body)?;
        Ok(page.items)
    }

    pub async fn find_gateway(&self, name: &str) -> Result<Option<Gateway>> {
        Ok(self
            .list_gateways()
            .await?
            .into_iter()
            .find(|gw| gw.name == name))
    }

    async fn create_gateway(&self, name: &str, role_arn: &str) -> Result<Gateway> {
        let body = json!({
            "name": name,
            "roleArn": role_arn,
            "protocolType": "MCP",
            "authorizerType": "AWS_IAM",
            "description": format!("AgentCore Gateway for {name} with AWS_IAM authentication"),
        });
        let response = self
            .signed
            .post(&format!("{}/gateways/", self.endpoint), &body)
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Create the gateway, or reuse the existing one with the same name.
    /// Unlike targets, the gateway is never deleted and recreated: clients
    /// hold its URL.
    pub async fn ensure_gateway(&self, name: &str, role_arn: &str) -> Result<Gateway> {
        match self.create_gateway(name, role_arn).await {
            Ok(gateway) => {
                info!(gateway_id = %gateway.gateway_id, "gateway created");
                Ok(gateway)
            }
            Err(err) if err.to_string().to_lowercase().contains("already exists") => {
                let gateway = self
                    .find_gateway(name)
                    .await?
                    .ok_or_else(|| anyhow!("gateway `{name}` reported as existing but not listed"))?;
                info!(gateway_id = %gateway.gateway_id, "reusing existing gateway");
                Ok(gateway)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list_targets(&self, gateway_id: &str) -> Result<Vec<GatewayTarget>> {
        let body = self
            .signed
            .get(&format!("{}/gateways/{gateway_id}/targets/", self.endpoint))
            .await?;
        let page: ItemPage<GatewayTarget> = serde_json::from_value(body)?;
        Ok(page.items)
    }

    pub async fn find_target(
        &self,
        gateway_id: &str,
        name: &str,
    ) -> Result<Option<GatewayTarget>> {
        Ok(self
            .list_targets(gateway_id)
            .await?
            .into_iter()
            .find(|target| target.name == name))
    }

    pub async fn create_target(&self, name: &str, spec: &GatewayTargetSpec) -> Result<GatewayTarget> {
        let body = json!({
            "name": name,
            "description": spec.description.clone().unwrap_or_else(|| {
                "Snowflake Lambda target - default payload: {\"sql\": \"SELECT current_version()\"}".to_string()
            }),
            "targetConfiguration": spec.target_configuration(),
            "credentialProviderConfigurations": spec.credential_provider_configurations(),
        });
        let response = self
            .signed
            .post(
                &format!("{}/gateways/{}/targets/", self.endpoint, spec.gateway_id),
                &body,
            )
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn delete_target(&self, gateway_id: &str, target_id: &str) -> Result<()> {
        self.signed
            .delete(&format!(
                "{}/gateways/{gateway_id}/targets/{target_id}/",
                self.endpoint
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_url_is_derived_from_gateway_id() {
        let gateway = Gateway {
            gateway_id: "snowgate-gateway-3krg53ika3".into(),
            gateway_url: None,
            name: "snowgate-gateway".into(),
        };
        assert_eq!(
            gateway.mcp_url("us-east-1"),
            "https://snowgate-gateway-3krg53ika3.gateway.bedrock-agentcore.us-east-1.amazonaws.com/mcp"
        );
    }

    #[test]
    fn control_plane_url_is_preferred_when_present() {
        let gateway = Gateway {
            gateway_id: "gw".into(),
            gateway_url: Some("https://example.test/mcp".into()),
            name: "gw".into(),
        };
        assert_eq!(gateway.mcp_url("eu-west-1"), "https://example.test/mcp");
    }

    #[test]
    fn target_pages_tolerate_missing_items() {
        let page: ItemPage<GatewayTarget> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());

        let page: ItemPage<GatewayTarget> = serde_json::from_str(
            r#"{"items": [{"targetId": "t-1", "name": "snowflake-lambda"}]}"#,
        )
        .unwrap();
        assert_eq!(page.items[0].target_id, "t-1");
    }
}
