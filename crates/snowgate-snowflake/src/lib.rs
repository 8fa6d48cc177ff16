//! Snowflake credentials and SQL execution
//!
//! The connector wire protocol is not re-modeled here: [`SnowflakeClient`] is
//! a thin client over the session login and query endpoints, and everything
//! that consumes query results goes through the [`SqlExecutor`] seam so tests
//! and other backends can stand in for the real warehouse.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod client;
pub mod guard;

pub use client::SnowflakeClient;

/// Result rows exactly as the warehouse returns them: a list of rows, each a
/// list of column values.
pub type Rows = Vec<Vec<serde_json::Value>>;

#[derive(Debug, Error)]
pub enum SnowflakeError {
    #[error("missing credential field `{0}`")]
    MissingField(&'static str),

    #[error("login failed: {0}")]
    Login(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A statement the read-only guard refuses to forward.
    #[error("statement rejected: contains destructive keyword {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The named secret's shape: all six fields are required to open a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeCredentials {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl SnowflakeCredentials {
    /// Every connection parameter must be present and non-empty.
    pub fn validate(&self) -> Result<(), SnowflakeError> {
        let fields = [
            ("user", &self.user),
            ("password", &self.password),
            ("account", &self.account),
            ("warehouse", &self.warehouse),
            ("database", &self.database),
            ("schema", &self.schema),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(SnowflakeError::MissingField(name));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.snowflakecomputing.com", self.account)
    }
}

/// Seam between the query handler and the warehouse.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Rows, SnowflakeError>;
}
