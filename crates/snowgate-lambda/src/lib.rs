// AWS Lambda runtime adapter
//
// Resolves the named secret and opens the Snowflake client once at cold
// start; every invocation then runs one statement through the executor seam.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use snowgate_snowflake::{SnowflakeClient, SqlExecutor};
use tracing::info;

mod handler;
mod secrets;

pub use handler::{QueryRequest, QueryResponse, DEFAULT_QUERY};

use handler::handle_query;

const DEFAULT_SECRET_NAME: &str = "snowflake/demo_user";

pub(crate) struct LambdaState {
    pub executor: Arc<dyn SqlExecutor>,
    pub read_only: bool,
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    tracing_subscriber::fmt().with_ansi(false).init();

    let secret_name = std::env::var("SNOWFLAKE_SECRET_NAME")
        .unwrap_or_else(|_| DEFAULT_SECRET_NAME.to_string());
    let read_only = std::env::var("SNOWGATE_READONLY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    info!(secret = %secret_name, read_only, "resolving Snowflake credentials");
    let credentials = secrets::fetch_credentials(&secret_name).await?;
    let executor = Arc::new(SnowflakeClient::new(credentials)?);

    let state = Arc::new(LambdaState {
        executor,
        read_only,
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<QueryRequest>| {
        let state = state.clone();
        async move { handle_query(event, state).await }
    }))
    .await
}
