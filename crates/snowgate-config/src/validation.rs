// Pre-flight configuration validation
//
// Runs before any cloud client is built; a failure here means no network
// call has been made.

use tracing::warn;

use crate::{ConfigError, DeployConfig, PackageKind};

pub(crate) fn validate_config(config: &DeployConfig) -> Result<(), ConfigError> {
    validate_account_id(&config.aws.account_id)?;

    if config.aws.region.is_empty() {
        return Err(ConfigError::Invalid("aws.region must not be empty".into()));
    }

    validate_resource_name("function.name", &config.function.name)?;
    validate_resource_name("function.role_name", &config.function.role_name)?;
    validate_resource_name("gateway.name", &config.gateway.name)?;
    validate_resource_name("gateway.target_name", &config.gateway.target_name)?;
    validate_resource_name("gateway.role_name", &config.gateway.role_name)?;

    if config.function.secret_name.is_empty() {
        return Err(ConfigError::Invalid(
            "function.secret_name must not be empty".into(),
        ));
    }

    match config.function.package {
        PackageKind::Zip => {
            if config
                .function
                .zip_path
                .as_deref()
                .map_or(true, |p| p.is_empty())
            {
                return Err(ConfigError::Invalid(
                    "function.zip_path is required for zip packaging".into(),
                ));
            }
        }
        PackageKind::Image => {
            validate_repository_name(&config.repository.name)?;
            if config.repository.image_tag.is_empty() {
                return Err(ConfigError::Invalid(
                    "repository.image_tag must not be empty".into(),
                ));
            }
        }
    }

    if config.reconcile.settle_delay_secs > 60 {
        warn!(
            settle_delay_secs = config.reconcile.settle_delay_secs,
            "settle delay is unusually long; deploys will be slow"
        );
    }

    Ok(())
}

/// AWS account ids are exactly twelve decimal digits; anything else aborts
/// before a single cloud call.
pub fn validate_account_id(account_id: &str) -> Result<(), ConfigError> {
    if account_id.len() != 12 || !account_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidAccountId(account_id.to_string()));
    }
    Ok(())
}

fn validate_resource_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if name.len() > 64 {
        return Err(ConfigError::Invalid(format!(
            "{field} must be at most 64 characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Invalid(format!(
            "{field} may contain only letters, numbers, hyphens, and underscores"
        )));
    }
    Ok(())
}

// ECR repository names are stricter: lowercase only.
fn validate_repository_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Invalid(
            "repository.name must not be empty".into(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '/')
    {
        return Err(ConfigError::Invalid(
            "repository.name may contain only lowercase letters, numbers, hyphens, underscores, and slashes"
                .into(),
        ));
    }
    Ok(())
}
