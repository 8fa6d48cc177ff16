// Configuration source loading
//
// Priority order, later wins:
// 1. Built-in defaults
// 2. Config file (SNOWGATE_CONFIG path, or ./snowgate.toml if present)
// 3. SNOWGATE_* environment variables

use std::env;
use std::path::Path;

use crate::{ConfigError, DeployConfig, PackageKind};

pub const ENV_PREFIX: &str = "SNOWGATE_";

const DEFAULT_CONFIG_FILE: &str = "./snowgate.toml";

/// Environment access seam so override handling is testable without
/// mutating process state.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `SNOWGATE_<key>` from the process environment.
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{ENV_PREFIX}{key}")).ok()
    }
}

pub(crate) fn load_config(env_source: &impl EnvSource) -> Result<DeployConfig, ConfigError> {
    let mut config = match env_source.get("CONFIG") {
        Some(path) => read_file(&path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => read_file(DEFAULT_CONFIG_FILE)?,
        None => DeployConfig::default(),
    };
    apply_env_overrides(&mut config, env_source);
    Ok(config)
}

pub(crate) fn load_from_path(
    path: &str,
    env_source: &impl EnvSource,
) -> Result<DeployConfig, ConfigError> {
    let mut config = read_file(path)?;
    apply_env_overrides(&mut config, env_source);
    Ok(config)
}

fn read_file(path: &str) -> Result<DeployConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

fn apply_env_overrides(config: &mut DeployConfig, env: &impl EnvSource) {
    let set = |key: &str, slot: &mut String| {
        if let Some(value) = env.get(key) {
            *slot = value;
        }
    };

    set("ACCOUNT_ID", &mut config.aws.account_id);
    set("REGION", &mut config.aws.region);
    set("FUNCTION_NAME", &mut config.function.name);
    set("ROLE_NAME", &mut config.function.role_name);
    set("RUNTIME", &mut config.function.runtime);
    set("HANDLER", &mut config.function.handler);
    set("SECRET_NAME", &mut config.function.secret_name);
    set("REPOSITORY", &mut config.repository.name);
    set("IMAGE_TAG", &mut config.repository.image_tag);
    set("GATEWAY_NAME", &mut config.gateway.name);
    set("TARGET_NAME", &mut config.gateway.target_name);
    set("GATEWAY_ROLE_NAME", &mut config.gateway.role_name);

    if let Some(path) = env.get("ZIP_PATH") {
        config.function.zip_path = Some(path);
    }

    if let Some(package) = env.get("PACKAGE") {
        match package.to_lowercase().as_str() {
            "zip" => config.function.package = PackageKind::Zip,
            "image" => config.function.package = PackageKind::Image,
            other => tracing::warn!(value = other, "ignoring unknown SNOWGATE_PACKAGE"),
        }
    }

    if let Some(raw) = env.get("SETTLE_DELAY_SECS") {
        match raw.parse::<u64>() {
            Ok(secs) => config.reconcile.settle_delay_secs = secs,
            Err(_) => tracing::warn!(value = raw, "ignoring non-numeric SNOWGATE_SETTLE_DELAY_SECS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn env_overrides_take_priority_over_defaults() {
        let env = MapEnv(HashMap::from([
            ("ACCOUNT_ID", "123456789012"),
            ("REGION", "us-west-2"),
            ("PACKAGE", "image"),
            ("SETTLE_DELAY_SECS", "30"),
        ]));
        let mut config = DeployConfig::default();
        apply_env_overrides(&mut config, &env);
        assert_eq!(config.aws.account_id, "123456789012");
        assert_eq!(config.aws.region, "us-west-2");
        assert_eq!(config.function.package, PackageKind::Image);
        assert_eq!(config.reconcile.settle_delay_secs, 30);
    }

    #[test]
    fn malformed_numeric_override_is_ignored() {
        let env = MapEnv(HashMap::from([("SETTLE_DELAY_SECS", "soon")]));
        let mut config = DeployConfig::default();
        apply_env_overrides(&mut config, &env);
        assert_eq!(config.reconcile.settle_delay_secs, 10);
    }

    #[test]
    fn absent_env_leaves_config_untouched() {
        let env = MapEnv(HashMap::new());
        let mut config = DeployConfig::default();
        config.aws.account_id = "999999999999".to_string();
        apply_env_overrides(&mut config, &env);
        assert_eq!(config.aws.account_id, "999999999999");
        assert!(config.function.zip_path.is_none());
    }
}
