use crate::error::{RegistrarError, Result};
use crate::models::{
    RegistrationProgress, RegistrationStatus, RegistrationToken, TypeRegistrationRequest,
};
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::{LoggingConfig, RegistryType};

/// The orchestration service's type registry
#[async_trait]
pub trait TypeRegistry: Send + Sync {
    /// Submit a resource type registration and return its tracking token.
    async fn register_type(&self, request: &TypeRegistrationRequest) -> Result<RegistrationToken>;

    /// Current state of the registration identified by `token`.
    async fn describe_registration(
        &self,
        token: &RegistrationToken,
    ) -> Result<RegistrationProgress>;
}

pub struct CloudFormationRegistry {
    client: Client,
}

impl CloudFormationRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TypeRegistry for CloudFormationRegistry {
    async fn register_type(&self, request: &TypeRegistrationRequest) -> Result<RegistrationToken> {
        let logging_config = LoggingConfig::builder()
            .log_role_arn(&request.log_role_arn)
            .log_group_name(&request.log_group_name)
            .build();

        let response = self
            .client
            .register_type()
            .r#type(RegistryType::Resource)
            .type_name(&request.type_name)
            .schema_handler_package(&request.schema_handler_package)
            .logging_config(logging_config)
            .execution_role_arn(&request.execution_role_arn)
            .send()
            .await
            .map_err(|e| RegistrarError::Submission(DisplayErrorContext(&e).to_string()))?;

        let token = response.registration_token().ok_or_else(|| {
            RegistrarError::MalformedResponse("RegisterType returned no registration token".into())
        })?;

        tracing::info!(
            "Submitted registration of {} from {} (token {})",
            request.type_name,
            request.schema_handler_package,
            token
        );
        Ok(RegistrationToken::new(token))
    }

    async fn describe_registration(
        &self,
        token: &RegistrationToken,
    ) -> Result<RegistrationProgress> {
        let response = self
            .client
            .describe_type_registration()
            .registration_token(token.as_str())
            .send()
            .await
            .map_err(|e| RegistrarError::StatusCheck(DisplayErrorContext(&e).to_string()))?;

        let status = response
            .progress_status()
            .map(|s| RegistrationStatus::from(s.as_str()))
            .ok_or_else(|| {
                RegistrarError::MalformedResponse(format!(
                    "DescribeTypeRegistration for {} returned no progress status",
                    token
                ))
            })?;

        tracing::debug!("Registration {} is {}", token, status);

        Ok(RegistrationProgress {
            status,
            type_arn: response.type_arn().map(str::to_string),
            type_version_arn: response.type_version_arn().map(str::to_string),
            description: response.description().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudformation::config::retry::RetryConfig;
    use aws_sdk_cloudformation::config::{BehaviorVersion, Credentials, Region};
    use aws_sdk_cloudformation::operation::describe_type_registration::DescribeTypeRegistrationOutput;
    use aws_sdk_cloudformation::operation::register_type::RegisterTypeOutput;
    use aws_sdk_cloudformation::types::RegistrationStatus as CfnStatus;
    use aws_smithy_mocks::{RuleMode, mock, mock_client};

    fn offline_client() -> Client {
        let config = aws_sdk_cloudformation::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-2"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url("http://127.0.0.1:1")
            .retry_config(RetryConfig::disabled())
            .build();
        Client::from_conf(config)
    }

    fn request() -> TypeRegistrationRequest {
        TypeRegistrationRequest {
            type_name: "Zugzwang::Cloud::IPv6SubnetConfiguration".to_string(),
            schema_handler_package: "s3://cfn-registry-six/subnet/handler-1.jar".to_string(),
            log_role_arn: "arn:aws:iam::394119796965:role/CloudFormationRegistryLogRole"
                .to_string(),
            log_group_name: "Six".to_string(),
            execution_role_arn: "arn:aws:iam::394119796965:role/ExecutionRole".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unreachable_register_is_a_submission_error() {
        let registry = CloudFormationRegistry::new(offline_client());
        let err = registry.register_type(&request()).await.unwrap_err();
        assert!(matches!(err, RegistrarError::Submission(_)));
    }

    #[tokio::test]
    async fn test_unreachable_describe_is_a_status_check_error() {
        let registry = CloudFormationRegistry::new(offline_client());
        let err = registry
            .describe_registration(&RegistrationToken::new("token-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::StatusCheck(_)));
    }

    #[tokio::test]
    async fn test_register_sends_resource_request_and_returns_token() {
        let rule = mock!(Client::register_type)
            .match_requests(|req| {
                req.r#type() == Some(&RegistryType::Resource)
                    && req.type_name() == Some("Zugzwang::Cloud::IPv6SubnetConfiguration")
                    && req.schema_handler_package()
                        == Some("s3://cfn-registry-six/subnet/handler-1.jar")
                    && req.execution_role_arn()
                        == Some("arn:aws:iam::394119796965:role/ExecutionRole")
                    && req.logging_config()
                        == Some(
                            &LoggingConfig::builder()
                                .log_role_arn(
                                    "arn:aws:iam::394119796965:role/CloudFormationRegistryLogRole",
                                )
                                .log_group_name("Six")
                                .build(),
                        )
            })
            .then_output(|| {
                RegisterTypeOutput::builder()
                    .registration_token("token-1")
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&rule]);

        let token = CloudFormationRegistry::new(client)
            .register_type(&request())
            .await
            .unwrap();
        assert_eq!(token, RegistrationToken::new("token-1"));
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_register_without_token_is_malformed() {
        let rule = mock!(Client::register_type).then_output(|| RegisterTypeOutput::builder().build());
        let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&rule]);

        let err = CloudFormationRegistry::new(client)
            .register_type(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_describe_maps_all_fields() {
        let rule = mock!(Client::describe_type_registration)
            .match_requests(|req| req.registration_token() == Some("token-1"))
            .then_output(|| {
                DescribeTypeRegistrationOutput::builder()
                    .progress_status(CfnStatus::Complete)
                    .type_arn("arn:type")
                    .type_version_arn("arn:type/00000002")
                    .description("Deployment is currently in COMPLETE state")
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&rule]);

        let progress = CloudFormationRegistry::new(client)
            .describe_registration(&RegistrationToken::new("token-1"))
            .await
            .unwrap();
        assert_eq!(progress.status, RegistrationStatus::Complete);
        assert_eq!(progress.type_arn.as_deref(), Some("arn:type"));
        assert_eq!(progress.type_version_arn.as_deref(), Some("arn:type/00000002"));
        assert_eq!(
            progress.description.as_deref(),
            Some("Deployment is currently in COMPLETE state")
        );
    }

    #[tokio::test]
    async fn test_describe_maps_failed_status() {
        let rule = mock!(Client::describe_type_registration).then_output(|| {
            DescribeTypeRegistrationOutput::builder()
                .progress_status(CfnStatus::Failed)
                .description("Handler package could not be read")
                .build()
        });
        let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&rule]);

        let progress = CloudFormationRegistry::new(client)
            .describe_registration(&RegistrationToken::new("token-1"))
            .await
            .unwrap();
        assert_eq!(progress.status, RegistrationStatus::Failed);
        assert!(progress.type_arn.is_none());
    }

    #[tokio::test]
    async fn test_describe_without_status_is_malformed() {
        let rule = mock!(Client::describe_type_registration)
            .then_output(|| DescribeTypeRegistrationOutput::builder().build());
        let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&rule]);

        let err = CloudFormationRegistry::new(client)
            .describe_registration(&RegistrationToken::new("token-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::MalformedResponse(_)));
    }
}
