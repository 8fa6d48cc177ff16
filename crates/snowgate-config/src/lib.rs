// snowgate-config - Deployment configuration for the reconciliation pipeline
//
// Configuration is layered, highest priority last:
// 1. Built-in defaults (lowest)
// 2. Config file (SNOWGATE_CONFIG path, or ./snowgate.toml)
// 3. SNOWGATE_* environment variables
// 4. CLI flag overrides, applied by the caller
//
// Validation is a separate, explicit step the caller runs before building any
// cloud client. Global ambient state (profiles, exit codes) has no place
// here: everything the pipeline needs is carried in this struct.

use serde::Deserialize;
use thiserror::Error;

mod sources;
mod validation;

pub use sources::{EnvSource, StdEnvSource, ENV_PREFIX};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The AWS account id must be exactly twelve decimal digits.
    #[error("account id must be a 12-digit number, got `{0}`")]
    InvalidAccountId(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything the deploy pipeline needs, resolved before any cloud call.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeployConfig {
    #[serde(default)]
    pub aws: AwsSettings,

    #[serde(default)]
    pub function: FunctionSettings,

    #[serde(default)]
    pub repository: RepositorySettings,

    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsSettings {
    /// Mandatory; no default. Validated as a 12-digit numeric string.
    #[serde(default)]
    pub account_id: String,

    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            region: default_region(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// How the Lambda function artifact is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Zip,
    Image,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionSettings {
    #[serde(default = "default_function_name")]
    pub name: String,

    #[serde(default = "default_role_name")]
    pub role_name: String,

    #[serde(default = "default_runtime")]
    pub runtime: String,

    #[serde(default = "default_handler")]
    pub handler: String,

    #[serde(default = "default_package")]
    pub package: PackageKind,

    /// Path to the deployment ZIP; required when package = "zip".
    #[serde(default)]
    pub zip_path: Option<String>,

    /// Secrets Manager entry holding the Snowflake credentials; injected into
    /// the function environment at deploy time.
    #[serde(default = "default_secret_name")]
    pub secret_name: String,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            name: default_function_name(),
            role_name: default_role_name(),
            runtime: default_runtime(),
            handler: default_handler(),
            package: default_package(),
            zip_path: None,
            secret_name: default_secret_name(),
        }
    }
}

fn default_function_name() -> String {
    "snowgate-query".to_string()
}

fn default_role_name() -> String {
    "snowgate-lambda-role".to_string()
}

fn default_runtime() -> String {
    "provided.al2023".to_string()
}

fn default_handler() -> String {
    "bootstrap".to_string()
}

fn default_package() -> PackageKind {
    PackageKind::Zip
}

fn default_secret_name() -> String {
    "snowflake/demo_user".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySettings {
    #[serde(default = "default_repository_name")]
    pub name: String,

    #[serde(default = "default_image_tag")]
    pub image_tag: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            name: default_repository_name(),
            image_tag: default_image_tag(),
        }
    }
}

fn default_repository_name() -> String {
    "snowgate".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_gateway_name")]
    pub name: String,

    #[serde(default = "default_target_name")]
    pub target_name: String,

    #[serde(default = "default_gateway_role_name")]
    pub role_name: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            name: default_gateway_name(),
            target_name: default_target_name(),
            role_name: default_gateway_role_name(),
        }
    }
}

fn default_gateway_name() -> String {
    "snowgate-gateway".to_string()
}

fn default_target_name() -> String {
    "snowflake-lambda".to_string()
}

fn default_gateway_role_name() -> String {
    "snowgate-gateway-role".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileSettings {
    /// Seconds to wait between deleting an existing resource and recreating
    /// it; absorbs external propagation latency.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
        }
    }
}

fn default_settle_delay_secs() -> u64 {
    10
}

impl DeployConfig {
    /// Load from default file locations and the environment. Does NOT
    /// validate: callers apply their own overrides first, then run
    /// [`DeployConfig::validate`] before touching the network.
    pub fn load() -> Result<Self, ConfigError> {
        sources::load_config(&StdEnvSource)
    }

    /// Load from an explicit file path, then apply environment overrides.
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        sources::load_from_path(path, &StdEnvSource)
    }

    /// Pre-flight validation. Must pass before any cloud client is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }

    /// ECR image URI for the configured repository and tag.
    pub fn image_uri(&self) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com/{}:{}",
            self.aws.account_id, self.aws.region, self.repository.name, self.repository.image_tag
        )
    }
}
