//! snowgate - deploy and exercise the Snowflake query gateway
//!
//! `deploy` drives the reconciliation pipeline (role, function, repository
//! when image-packaged, gateway target); `invoke` and `query` exercise the
//! deployed stack through the gateway's MCP endpoint and the Lambda directly.

pub mod deploy;
pub mod init;
pub mod invoke;
