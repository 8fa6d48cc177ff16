use std::path::PathBuf;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use snowgate_config::DeployConfig;

/// Deploy and exercise the Snowflake query gateway
#[derive(Parser)]
#[command(name = "snowgate")]
#[command(version)]
#[command(about = "Deploy and exercise the Snowflake query gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile role, function, gateway, and gateway target
    Deploy {
        /// AWS account id (12 digits); mandatory unless set in config or env
        #[arg(long)]
        account_id: Option<String>,

        /// AWS region
        #[arg(long)]
        region: Option<String>,

        /// Lambda function name
        #[arg(long)]
        function_name: Option<String>,

        /// Execution role name
        #[arg(long)]
        role_name: Option<String>,

        /// ECR repository name (image packaging)
        #[arg(long)]
        repository: Option<String>,

        /// Image tag (image packaging)
        #[arg(long)]
        image_tag: Option<String>,

        /// Path to the deployment ZIP (zip packaging)
        #[arg(long)]
        zip_path: Option<String>,
    },
    /// Call the gateway tool over signed MCP requests
    Invoke {
        /// Gateway id, e.g. snowgate-gateway-3krg53ika3
        #[arg(long)]
        gateway_id: String,

        /// SQL statement to run
        #[arg(long, default_value = "SELECT current_version()")]
        sql: String,

        /// Gateway target name the tool is prefixed with
        #[arg(long)]
        target_name: Option<String>,

        /// AWS region
        #[arg(long)]
        region: Option<String>,
    },
    /// Invoke the Lambda directly, bypassing the gateway
    Query {
        /// Lambda function name
        #[arg(long)]
        function_name: Option<String>,

        /// SQL statement to run
        #[arg(long, default_value = "SELECT current_version()")]
        sql: String,

        /// AWS region
        #[arg(long)]
        region: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    snowgate::init::init_tracing(&cli.log_level);

    let config = load_config(&cli)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(run_command(cli, config))
}

fn load_config(cli: &Cli) -> Result<DeployConfig> {
    let config = match &cli.config {
        Some(path) => DeployConfig::load_from_path(&path.to_string_lossy())
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DeployConfig::load().context("Failed to load configuration")?,
    };
    Ok(config)
}

async fn run_command(cli: Cli, mut config: DeployConfig) -> Result<()> {
    match cli.command {
        Commands::Deploy {
            account_id,
            region,
            function_name,
            role_name,
            repository,
            image_tag,
            zip_path,
        } => {
            // CLI flags are the highest-priority layer.
            apply_override(&mut config.aws.account_id, account_id);
            apply_override(&mut config.aws.region, region);
            apply_override(&mut config.function.name, function_name);
            apply_override(&mut config.function.role_name, role_name);
            apply_override(&mut config.repository.name, repository);
            apply_override(&mut config.repository.image_tag, image_tag);
            if zip_path.is_some() {
                config.function.zip_path = zip_path;
            }

            snowgate::deploy::run(config).await
        }
        Commands::Invoke {
            gateway_id,
            sql,
            target_name,
            region,
        } => {
            apply_override(&mut config.aws.region, region);
            let target_name = target_name.unwrap_or_else(|| config.gateway.target_name.clone());
            let sdk_config = sdk_config(&config.aws.region).await;
            snowgate::invoke::invoke_gateway(sdk_config, &gateway_id, &target_name, &sql).await
        }
        Commands::Query {
            function_name,
            sql,
            region,
        } => {
            apply_override(&mut config.aws.region, region);
            let function_name = function_name.unwrap_or_else(|| config.function.name.clone());
            let sdk_config = sdk_config(&config.aws.region).await;
            let response =
                snowgate::invoke::direct_query(sdk_config, &function_name, &sql).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

fn apply_override(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

async fn sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}
