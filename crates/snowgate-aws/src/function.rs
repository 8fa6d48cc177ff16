// Lambda function operations

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, PackageType, Runtime};
use aws_sdk_lambda::Client;
use serde_json::json;
use snowgate_core::{ProviderError, ResourceState};

use crate::external_err;
use crate::spec::{FunctionSpec, PackageSpec};

pub(crate) async fn probe(lambda: &Client, name: &str) -> Result<ResourceState, ProviderError> {
    match lambda.get_function().function_name(name).send().await {
        Ok(output) => {
            let spec = output.configuration().map(|config| {
                json!({
                    "arn": config.function_arn(),
                    "runtime": config.runtime().map(|r| r.as_str()),
                    "handler": config.handler(),
                })
            });
            Ok(ResourceState::present(spec))
        }
        Err(err)
            if err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false) =>
        {
            Ok(ResourceState::absent())
        }
        Err(err) => Err(external_err("describing function", err)),
    }
}

pub(crate) async fn create(
    lambda: &Client,
    name: &str,
    spec: &FunctionSpec,
) -> Result<(), ProviderError> {
    let mut request = lambda
        .create_function()
        .function_name(name)
        .role(spec.role_arn.as_str())
        .timeout(spec.timeout_secs);

    if let Some(description) = spec.description.as_deref() {
        request = request.description(description);
    }

    request = match &spec.package {
        PackageSpec::Zip { path } => {
            let bytes = std::fs::read(path).map_err(|err| {
                ProviderError::with_source(format!("reading deployment package `{path}`"), err)
            })?;
            request
                .package_type(PackageType::Zip)
                .runtime(Runtime::from(spec.runtime.as_str()))
                .handler(spec.handler.as_str())
                .code(FunctionCode::builder().zip_file(Blob::new(bytes)).build())
        }
        PackageSpec::Image { image_uri } => request
            .package_type(PackageType::Image)
            .code(FunctionCode::builder().image_uri(image_uri.as_str()).build()),
    };

    if !spec.environment.is_empty() {
        let variables = spec
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        request = request.environment(
            Environment::builder()
                .set_variables(Some(variables))
                .build(),
        );
    }

    request
        .send()
        .await
        .map_err(|err| external_err("creating function", err))?;
    Ok(())
}

// Functions carry no dependent sub-resources; teardown is the function alone.
pub(crate) async fn delete(lambda: &Client, name: &str) -> Result<(), ProviderError> {
    lambda
        .delete_function()
        .function_name(name)
        .send()
        .await
        .map_err(|err| external_err("deleting function", err))?;
    Ok(())
}
