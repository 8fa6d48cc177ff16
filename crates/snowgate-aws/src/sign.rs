// SigV4-signed JSON requests
//
// Used for the AgentCore control plane and for invoking the gateway's MCP
// endpoint: both authenticate with request signing rather than static keys.
// Credentials come from the ambient AWS credential chain (IAM role,
// environment, shared config) already resolved into the SdkConfig.

use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use serde_json::Value;

const FALLBACK_REGION: &str = "us-east-1";

/// HTTP client that signs every request with SigV4 for one service name.
pub struct SignedClient {
    http: reqwest::Client,
    config: aws_config::SdkConfig,
    service: &'static str,
}

impl SignedClient {
    pub fn new(config: aws_config::SdkConfig, service: &'static str) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            service,
        }
    }

    pub fn region(&self) -> &str {
        self.config
            .region()
            .map(|r| r.as_ref())
            .unwrap_or(FALLBACK_REGION)
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.send_json(http::Method::GET, url, None).await
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        self.send_json(http::Method::POST, url, Some(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.send_json(http::Method::DELETE, url, None).await
    }

    async fn resolve_identity(&self) -> Result<Identity> {
        let provider = self
            .config
            .credentials_provider()
            .ok_or_else(|| anyhow!("no AWS credentials provider configured"))?;
        let credentials = provider
            .provide_credentials()
            .await
            .context("failed to resolve AWS credentials")?;
        Ok(credentials.into())
    }

    /// Sign and send one JSON request, returning the parsed response body.
    /// Non-2xx responses become errors carrying the status and body text.
    async fn send_json(
        &self,
        method: http::Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let body_bytes = match body {
            Some(value) => serde_json::to_vec(value).context("serializing request body")?,
            None => Vec::new(),
        };

        let identity = self.resolve_identity().await?;
        let signing_params: aws_sigv4::http_request::SigningParams = v4::SigningParams::builder()
            .identity(&identity)
            .region(self.region())
            .name(self.service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .context("building signing parameters")?
            .into();

        let headers: Vec<(&str, &str)> = if body.is_some() {
            vec![("content-type", "application/json")]
        } else {
            Vec::new()
        };
        let signable = SignableRequest::new(
            method.as_str(),
            url,
            headers.iter().copied(),
            SignableBody::Bytes(&body_bytes),
        )
        .context("request is not signable")?;

        let (instructions, _signature) = sign(signable, &signing_params)
            .context("signing request")?
            .into_parts();

        let mut builder = http::Request::builder().method(method).uri(url);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let mut request = builder
            .body(body_bytes)
            .context("building signed request")?;
        instructions.apply_to_request_http1x(&mut request);

        let request = reqwest::Request::try_from(request).context("converting signed request")?;
        let response = self.http.execute(request).await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("{} returned {status}: {text}", self.service));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .with_context(|| format!("{} returned non-JSON body", self.service))
    }
}
