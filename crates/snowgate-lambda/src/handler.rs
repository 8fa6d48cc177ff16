// Query event handling
//
// Contract: input `{"sql": "..."}`; output `{"query": "...", "rows": [[...]]}`.
// A missing or blank statement falls back to the version probe.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use snowgate_snowflake::{guard, Rows};
use tracing::info;

use crate::LambdaState;

pub const DEFAULT_QUERY: &str = "SELECT current_version()";

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub sql: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub rows: Rows,
}

pub(crate) async fn handle_query(
    event: LambdaEvent<QueryRequest>,
    state: Arc<LambdaState>,
) -> Result<QueryResponse, Error> {
    let (request, _context) = event.into_parts();

    let query = request
        .sql
        .filter(|sql| !sql.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());

    if state.read_only {
        guard::check_statement(&query)?;
    }

    let rows = state.executor.execute(&query).await?;
    info!(rows = rows.len(), "query executed");

    Ok(QueryResponse { query, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lambda_runtime::Context;
    use serde_json::json;
    use snowgate_snowflake::{SnowflakeError, SqlExecutor};

    struct CannedExecutor;

    #[async_trait]
    impl SqlExecutor for CannedExecutor {
        async fn execute(&self, sql: &str) -> Result<Rows, SnowflakeError> {
            Ok(vec![vec![json!(sql.to_string())]])
        }
    }

    fn state(read_only: bool) -> Arc<LambdaState> {
        Arc::new(LambdaState {
            executor: Arc::new(CannedExecutor),
            read_only,
        })
    }

    fn event(request: QueryRequest) -> LambdaEvent<QueryRequest> {
        LambdaEvent::new(request, Context::default())
    }

    #[tokio::test]
    async fn response_echoes_the_executed_query() {
        let response = handle_query(
            event(QueryRequest {
                sql: Some("SELECT current_user()".into()),
            }),
            state(false),
        )
        .await
        .unwrap();
        assert_eq!(response.query, "SELECT current_user()");
        assert_eq!(response.rows, vec![vec![json!("SELECT current_user()")]]);
    }

    #[tokio::test]
    async fn missing_sql_falls_back_to_default_query() {
        let response = handle_query(event(QueryRequest::default()), state(false))
            .await
            .unwrap();
        assert_eq!(response.query, DEFAULT_QUERY);
    }

    #[tokio::test]
    async fn blank_sql_falls_back_to_default_query() {
        let response = handle_query(
            event(QueryRequest {
                sql: Some("   ".into()),
            }),
            state(false),
        )
        .await
        .unwrap();
        assert_eq!(response.query, DEFAULT_QUERY);
    }

    #[tokio::test]
    async fn read_only_mode_rejects_destructive_statements() {
        let result = handle_query(
            event(QueryRequest {
                sql: Some("DROP TABLE orders".into()),
            }),
            state(true),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn request_deserializes_from_raw_event() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"sql": "SELECT 1"}"#).unwrap();
        assert_eq!(request.sql.as_deref(), Some("SELECT 1"));

        let request: QueryRequest = serde_json::from_str("{}").unwrap();
        assert!(request.sql.is_none());
    }

    #[test]
    fn response_serializes_with_contract_fields() {
        let response = QueryResponse {
            query: "SELECT 1".into(),
            rows: vec![vec![json!(1)]],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"query": "SELECT 1", "rows": [[1]]}));
    }
}
