use crate::config::RegistrarConfig;
use crate::services::registry::CloudFormationRegistry;
use crate::services::storage::S3ArtifactStore;
use aws_config::SdkConfig;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

/// Resolve credentials and region from the named profile.
pub async fn setup_sdk_config(config: &RegistrarConfig) -> SdkConfig {
    info!(
        "🔑 AWS profile '{}' in region {}",
        config.profile, config.region
    );

    aws_config::from_env()
        .profile_name(&config.profile)
        .region(Region::new(config.region.clone()))
        .load()
        .await
}

pub fn setup_store(sdk_config: &SdkConfig, config: &RegistrarConfig) -> Arc<S3ArtifactStore> {
    let mut s3_config = aws_sdk_s3::config::Builder::from(sdk_config);

    if let Some(endpoint_url) = &config.s3_endpoint {
        info!("☁️  S3 endpoint override: {} (Bucket: {})", endpoint_url, config.bucket);
        s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
    } else {
        info!("☁️  S3 Bucket: {}", config.bucket);
    }

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config.build());
    Arc::new(S3ArtifactStore::new(
        s3_client,
        config.bucket.clone(),
        config.chunk_size,
    ))
}

pub fn setup_registry(sdk_config: &SdkConfig) -> Arc<CloudFormationRegistry> {
    let cfn_client = aws_sdk_cloudformation::Client::new(sdk_config);
    Arc::new(CloudFormationRegistry::new(cfn_client))
}
