// AWS Lambda binary entry point
//
// Build with: cargo build -p snowgate-lambda
//
// The lambda_runtime crate provides the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    snowgate_lambda::run().await
}
