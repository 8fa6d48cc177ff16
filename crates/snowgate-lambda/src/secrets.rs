// Snowflake credential resolution from Secrets Manager
//
// The secret is a JSON object with user/password/account/warehouse/database/
// schema; it is fetched once at cold start and validated before any session
// is opened.

use aws_config::BehaviorVersion;
use lambda_runtime::Error;
use snowgate_snowflake::SnowflakeCredentials;

pub(crate) async fn fetch_credentials(secret_name: &str) -> Result<SnowflakeCredentials, Error> {
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = aws_sdk_secretsmanager::Client::new(&config);

    let output = client
        .get_secret_value()
        .secret_id(secret_name)
        .send()
        .await?;
    let raw = output
        .secret_string()
        .ok_or("secret has no string payload")?;

    let credentials: SnowflakeCredentials = serde_json::from_str(raw)?;
    credentials.validate()?;
    Ok(credentials)
}
