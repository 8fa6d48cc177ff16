// ECR repository operations
//
// Images are the repository's dependents and are batch-deleted before the
// repository itself, so the delete never needs force semantics.

use aws_sdk_ecr::types::ImageScanningConfiguration;
use aws_sdk_ecr::Client;
use serde_json::json;
use snowgate_core::{ProviderError, ResourceState};
use tracing::debug;

use crate::external_err;
use crate::spec::RepositorySpec;

pub(crate) async fn probe(ecr: &Client, name: &str) -> Result<ResourceState, ProviderError> {
    match ecr
        .describe_repositories()
        .repository_names(name)
        .send()
        .await
    {
        Ok(output) => {
            let spec = output.repositories().first().map(|repo| {
                json!({
                    "arn": repo.repository_arn(),
                    "uri": repo.repository_uri(),
                })
            });
            Ok(ResourceState::present(spec))
        }
        Err(err)
            if err
                .as_service_error()
                .map(|e| e.is_repository_not_found_exception())
                .unwrap_or(false) =>
        {
            Ok(ResourceState::absent())
        }
        Err(err) => Err(external_err("describing repository", err)),
    }
}

pub(crate) async fn create(
    ecr: &Client,
    name: &str,
    spec: &RepositorySpec,
) -> Result<(), ProviderError> {
    ecr.create_repository()
        .repository_name(name)
        .image_scanning_configuration(
            ImageScanningConfiguration::builder()
                .scan_on_push(spec.scan_on_push)
                .build(),
        )
        .send()
        .await
        .map_err(|err| external_err("creating repository", err))?;
    Ok(())
}

pub(crate) async fn delete_dependents(ecr: &Client, name: &str) -> Result<(), ProviderError> {
    let images = ecr
        .list_images()
        .repository_name(name)
        .send()
        .await
        .map_err(|err| external_err("listing images", err))?;

    let image_ids = images.image_ids();
    if image_ids.is_empty() {
        return Ok(());
    }

    debug!(repository = name, count = image_ids.len(), "deleting images");
    ecr.batch_delete_image()
        .repository_name(name)
        .set_image_ids(Some(image_ids.to_vec()))
        .send()
        .await
        .map_err(|err| external_err("deleting images", err))?;
    Ok(())
}

pub(crate) async fn delete(ecr: &Client, name: &str) -> Result<(), ProviderError> {
    ecr.delete_repository()
        .repository_name(name)
        .send()
        .await
        .map_err(|err| external_err("deleting repository", err))?;
    Ok(())
}
