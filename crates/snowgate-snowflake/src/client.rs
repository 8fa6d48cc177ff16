// Thin client over the Snowflake session endpoints
//
// One session per execute call: login-request for a session token, then
// query-request with the statement. Warehouse, database, and schema come from
// the credential set and are pinned at login.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Rows, SnowflakeCredentials, SnowflakeError, SqlExecutor};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";

pub struct SnowflakeClient {
    http: reqwest::Client,
    credentials: SnowflakeCredentials,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    login_name: &'a str,
    password: &'a str,
    account_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct LoginPayload {
    token: String,
}

#[derive(Deserialize)]
struct QueryPayload {
    #[serde(default)]
    rowset: Rows,
}

impl SnowflakeClient {
    pub fn new(credentials: SnowflakeCredentials) -> Result<Self, SnowflakeError> {
        credentials.validate()?;
        Ok(Self {
            http: reqwest::Client::new(),
            credentials,
        })
    }

    async fn login(&self) -> Result<String, SnowflakeError> {
        let url = format!("{}{}", self.credentials.base_url(), LOGIN_PATH);
        let body = LoginRequest {
            data: LoginData {
                login_name: &self.credentials.user,
                password: &self.credentials.password,
                account_name: &self.credentials.account,
            },
        };

        let response: ApiResponse<LoginPayload> = self
            .http
            .post(&url)
            .query(&[
                ("warehouse", self.credentials.warehouse.as_str()),
                ("databaseName", self.credentials.database.as_str()),
                ("schemaName", self.credentials.schema.as_str()),
            ])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(SnowflakeError::Login(
                response.message.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        response
            .data
            .map(|payload| payload.token)
            .ok_or_else(|| SnowflakeError::Malformed("login response carried no token".into()))
    }
}

#[async_trait]
impl SqlExecutor for SnowflakeClient {
    async fn execute(&self, sql: &str) -> Result<Rows, SnowflakeError> {
        let token = self.login().await?;
        debug!(account = %self.credentials.account, "session opened");

        let url = format!("{}{}", self.credentials.base_url(), QUERY_PATH);
        let request_id = uuid::Uuid::new_v4().to_string();

        let response: ApiResponse<QueryPayload> = self
            .http
            .post(&url)
            .query(&[("requestId", request_id.as_str())])
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Snowflake Token=\"{token}\""),
            )
            .json(&QueryRequest { sql_text: sql })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(SnowflakeError::Query(
                response.message.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(response.data.map(|payload| payload.rowset).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_body_uses_connector_field_names() {
        let body = LoginRequest {
            data: LoginData {
                login_name: "demo",
                password: "pw",
                account_name: "xy12345",
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({"data": {"LOGIN_NAME": "demo", "PASSWORD": "pw", "ACCOUNT_NAME": "xy12345"}})
        );
    }

    #[test]
    fn query_body_uses_sql_text() {
        let value = serde_json::to_value(QueryRequest {
            sql_text: "SELECT 1",
        })
        .unwrap();
        assert_eq!(value, json!({"sqlText": "SELECT 1"}));
    }

    #[test]
    fn rowset_parses_into_rows() {
        let raw = r#"{"success": true, "message": null, "data": {"rowset": [["9.2.1"], [42]]}}"#;
        let response: ApiResponse<QueryPayload> = serde_json::from_str(raw).unwrap();
        assert!(response.success);
        let rows = response.data.unwrap().rowset;
        assert_eq!(rows, vec![vec![json!("9.2.1")], vec![json!(42)]]);
    }

    #[test]
    fn failed_response_carries_message() {
        let raw = r#"{"success": false, "message": "Incorrect username or password", "data": null}"#;
        let response: ApiResponse<LoginPayload> = serde_json::from_str(raw).unwrap();
        assert!(!response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("Incorrect username or password")
        );
    }
}
