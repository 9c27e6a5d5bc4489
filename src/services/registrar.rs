use crate::config::RegistrarConfig;
use crate::error::{RegistrarError, Result};
use crate::models::{
    RegistrationOutcome, RegistrationProgress, RegistrationStatus, RegistrationToken,
    TypeRegistrationRequest,
};
use crate::services::registry::TypeRegistry;
use crate::services::storage::ArtifactStore;
use crate::utils::keys::generate_upload_key;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

/// Drives one upload, one registration and the status poll that follows.
pub struct Registrar {
    store: Arc<dyn ArtifactStore>,
    registry: Arc<dyn TypeRegistry>,
    config: RegistrarConfig,
}

impl Registrar {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        registry: Arc<dyn TypeRegistry>,
        config: RegistrarConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub async fn run(&self) -> Result<RegistrationOutcome> {
        let key = generate_upload_key(&self.config.bucket_subdir, &self.config.artifact_path);

        println!("Uploading handler jar with key {}...", key);
        let upload = self
            .store
            .upload_artifact(&self.config.artifact_path, &key)
            .await?;
        let location = self.config.package_location(&upload.key);

        println!("Starting type registration...");
        let request = self.registration_request(location);
        let token = self.registry.register_type(&request).await?;
        println!("Submitted registration and got back token {}", token);

        self.await_registration(&token).await
    }

    pub fn registration_request(&self, schema_handler_package: String) -> TypeRegistrationRequest {
        TypeRegistrationRequest {
            type_name: self.config.type_name.clone(),
            schema_handler_package,
            log_role_arn: self.config.log_role_arn.clone(),
            log_group_name: self.config.log_group_name.clone(),
            execution_role_arn: self.config.execution_role_arn.clone(),
        }
    }

    /// Poll `token` until it leaves `IN_PROGRESS` or the wait budget is spent.
    ///
    /// No wait happens after a terminal status, and none is started that would
    /// push the total past `max_wait`.
    pub async fn await_registration(&self, token: &RegistrationToken) -> Result<RegistrationOutcome> {
        let interval = self.config.poll_interval;
        let budget = self.config.poll_budget();
        let mut waited = Duration::ZERO;

        loop {
            let progress = self.registry.describe_registration(token).await?;

            match progress.status {
                RegistrationStatus::InProgress => {
                    if exceeds_budget(waited, interval, budget) {
                        tracing::warn!(
                            "Registration {} still in progress after {:?}, giving up",
                            token,
                            waited
                        );
                        return Ok(RegistrationOutcome::TimedOut { waited });
                    }
                    println!("Registration still in progress...");
                    sleep(interval).await;
                    waited = waited.saturating_add(interval);
                }
                RegistrationStatus::Complete => return completed(token, progress),
                status => {
                    tracing::warn!(
                        "Registration {} ended with status {}: {}",
                        token,
                        status,
                        progress.description.as_deref().unwrap_or("no description")
                    );
                    return Ok(RegistrationOutcome::Failed {
                        status,
                        description: progress.description,
                    });
                }
            }
        }
    }
}

/// Whether one more `interval` would take the total wait past `budget`.
fn exceeds_budget(waited: Duration, interval: Duration, budget: Option<Duration>) -> bool {
    match budget {
        Some(budget) => waited.saturating_add(interval) > budget,
        None => false,
    }
}

fn completed(token: &RegistrationToken, progress: RegistrationProgress) -> Result<RegistrationOutcome> {
    match (progress.type_arn, progress.type_version_arn) {
        (Some(type_arn), Some(type_version_arn)) => Ok(RegistrationOutcome::Registered {
            type_arn,
            type_version_arn,
        }),
        _ => Err(RegistrarError::MalformedResponse(format!(
            "registration {} is COMPLETE but did not report both type ARNs",
            token
        ))),
    }
}
