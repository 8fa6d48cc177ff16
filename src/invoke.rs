// Exercising the deployed stack
//
// The gateway speaks MCP over SigV4-signed HTTP; tool names are prefixed by
// the gateway with the target name. `direct_query` bypasses the gateway and
// hits the Lambda itself, which is the first thing to check when the gateway
// path fails.

use anyhow::{Context, Result};
use aws_sdk_lambda::primitives::Blob;
use serde_json::{json, Value};
use snowgate_aws::gateway::SERVICE_NAME;
use snowgate_aws::spec::TOOL_NAME;
use snowgate_aws::SignedClient;
use tracing::info;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// External name of the target's tool as the gateway advertises it.
pub fn tool_name(target_name: &str) -> String {
    format!("{target_name}___{TOOL_NAME}")
}

/// MCP client for one gateway endpoint, signing every call.
pub struct McpClient {
    signed: SignedClient,
    gateway_url: String,
}

impl McpClient {
    pub fn new(sdk_config: aws_config::SdkConfig, gateway_url: String) -> Self {
        Self {
            signed: SignedClient::new(sdk_config, SERVICE_NAME),
            gateway_url,
        }
    }

    pub fn gateway_url_for(gateway_id: &str, region: &str) -> String {
        format!("https://{gateway_id}.gateway.bedrock-agentcore.{region}.amazonaws.com/mcp")
    }

    pub async fn initialize(&self) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "snowgate",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            },
            "id": 0
        });
        self.signed.post(&self.gateway_url, &request).await
    }

    pub async fn list_tools(&self) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/list",
            "params": {},
            "id": "list-tools"
        });
        self.signed.post(&self.gateway_url, &request).await
    }

    pub async fn call_tool(&self, target_name: &str, sql: &str) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": tool_name(target_name),
                "arguments": { "sql": sql }
            },
            "id": 1
        });
        self.signed.post(&self.gateway_url, &request).await
    }
}

/// Full gateway round-trip: session, tool listing, then the query itself.
pub async fn invoke_gateway(
    sdk_config: aws_config::SdkConfig,
    gateway_id: &str,
    target_name: &str,
    sql: &str,
) -> Result<()> {
    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "us-east-1".to_string());
    let gateway_url = McpClient::gateway_url_for(gateway_id, &region);
    info!(url = %gateway_url, tool = %tool_name(target_name), "invoking gateway");

    let client = McpClient::new(sdk_config, gateway_url);

    let init = client.initialize().await.context("MCP initialize failed")?;
    info!("session initialized");
    println!("{}", serde_json::to_string_pretty(&init)?);

    let tools = client.list_tools().await.context("tools/list failed")?;
    println!("{}", serde_json::to_string_pretty(&tools)?);

    let result = client
        .call_tool(target_name, sql)
        .await
        .context("tools/call failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Invoke the Lambda directly with the raw `{sql}` contract.
pub async fn direct_query(
    sdk_config: aws_config::SdkConfig,
    function_name: &str,
    sql: &str,
) -> Result<Value> {
    let client = aws_sdk_lambda::Client::new(&sdk_config);
    let payload = serde_json::to_vec(&json!({ "sql": sql }))?;

    let output = client
        .invoke()
        .function_name(function_name)
        .payload(Blob::new(payload))
        .send()
        .await
        .with_context(|| format!("invoking function `{function_name}`"))?;

    let bytes = output
        .payload()
        .map(|blob| blob.as_ref().to_vec())
        .unwrap_or_default();
    serde_json::from_slice(&bytes).context("function returned a non-JSON payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_is_prefixed_with_target() {
        assert_eq!(
            tool_name("snowflake-lambda"),
            "snowflake-lambda___execute_snowflake_query"
        );
    }

    #[test]
    fn gateway_url_matches_endpoint_scheme() {
        assert_eq!(
            McpClient::gateway_url_for("snowgate-gateway-3krg53ika3", "us-east-1"),
            "https://snowgate-gateway-3krg53ika3.gateway.bedrock-agentcore.us-east-1.amazonaws.com/mcp"
        );
    }
}
