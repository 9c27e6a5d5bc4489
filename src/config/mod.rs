use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one upload-and-register run
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    /// Local path of the packaged handler artifact
    pub artifact_path: PathBuf,

    /// Destination bucket for the artifact (default: "cfn-registry-six")
    pub bucket: String,

    /// Prefix inside the bucket (default: "subnet")
    pub bucket_subdir: String,

    /// Fully-qualified resource type name
    pub type_name: String,

    /// Role CloudFormation assumes when invoking the handler
    pub execution_role_arn: String,

    /// Role CloudFormation assumes when writing handler logs
    pub log_role_arn: String,

    /// CloudWatch log group for handler logs (default: "Six")
    pub log_group_name: String,

    /// Named credential profile (default: "zugzwang-dev")
    pub profile: String,

    /// AWS region (default: "us-east-2")
    pub region: String,

    /// Optional S3-compatible endpoint, forces path-style addressing when set
    pub s3_endpoint: Option<String>,

    /// Wait between registration status checks (default: 10 s)
    pub poll_interval: Duration,

    /// Upper bound on total time spent waiting; zero means unbounded (default: 0)
    pub max_wait: Duration,

    /// Part size for the artifact upload in bytes (default: 8 MB)
    pub chunk_size: usize,
}

/// S3 rejects multipart parts smaller than this (except the last one)
pub const MIN_CHUNK_SIZE: usize = 5 * 1024 * 1024;

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(
                "./target/zugzwang-cloud-ipv6subnetconfiguration-handler-1.0-SNAPSHOT.jar",
            ),
            bucket: "cfn-registry-six".to_string(),
            bucket_subdir: "subnet".to_string(),
            type_name: "Zugzwang::Cloud::IPv6SubnetConfiguration".to_string(),
            execution_role_arn:
                "arn:aws:iam::394119796965:role/SixSubnetResources-ExecutionRole-R3QTP3MUJRYS"
                    .to_string(),
            log_role_arn: "arn:aws:iam::394119796965:role/CloudFormationRegistryLogRole"
                .to_string(),
            log_group_name: "Six".to_string(),
            profile: "zugzwang-dev".to_string(),
            region: "us-east-2".to_string(),
            s3_endpoint: None,
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::ZERO,
            chunk_size: 8 * 1024 * 1024, // 8 MB
        }
    }
}

impl RegistrarConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source, falling back to defaults
    /// for anything missing or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            artifact_path: lookup("REGISTRAR_ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.artifact_path),

            bucket: lookup("REGISTRAR_BUCKET").unwrap_or(default.bucket),

            bucket_subdir: lookup("REGISTRAR_BUCKET_SUBDIR").unwrap_or(default.bucket_subdir),

            type_name: lookup("REGISTRAR_TYPE_NAME").unwrap_or(default.type_name),

            execution_role_arn: lookup("REGISTRAR_EXECUTION_ROLE_ARN")
                .unwrap_or(default.execution_role_arn),

            log_role_arn: lookup("REGISTRAR_LOG_ROLE_ARN").unwrap_or(default.log_role_arn),

            log_group_name: lookup("REGISTRAR_LOG_GROUP").unwrap_or(default.log_group_name),

            profile: lookup("AWS_PROFILE").unwrap_or(default.profile),

            region: lookup("AWS_REGION").unwrap_or(default.region),

            s3_endpoint: lookup("REGISTRAR_S3_ENDPOINT").filter(|v| !v.trim().is_empty()),

            poll_interval: lookup("REGISTRAR_POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.poll_interval),

            max_wait: lookup("REGISTRAR_MAX_WAIT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.max_wait),

            chunk_size: lookup("REGISTRAR_CHUNK_SIZE")
                .and_then(|v| v.parse().ok())
                .map(|size: usize| size.max(MIN_CHUNK_SIZE))
                .unwrap_or(default.chunk_size),
        }
    }

    /// `s3://bucket/key` as CloudFormation expects it in `SchemaHandlerPackage`
    pub fn package_location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// `None` when polling is unbounded
    pub fn poll_budget(&self) -> Option<Duration> {
        if self.max_wait.is_zero() {
            None
        } else {
            Some(self.max_wait)
        }
    }
}
