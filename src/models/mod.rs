use std::fmt;
use std::time::Duration;

/// Opaque handle for one in-flight type registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    InProgress,
    Complete,
    Failed,
    /// Any status value this build does not know about
    Other(String),
}

impl RegistrationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RegistrationStatus::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegistrationStatus::InProgress => "IN_PROGRESS",
            RegistrationStatus::Complete => "COMPLETE",
            RegistrationStatus::Failed => "FAILED",
            RegistrationStatus::Other(s) => s,
        }
    }
}

impl From<&str> for RegistrationStatus {
    fn from(value: &str) -> Self {
        match value {
            "IN_PROGRESS" => RegistrationStatus::InProgress,
            "COMPLETE" => RegistrationStatus::Complete,
            "FAILED" => RegistrationStatus::Failed,
            other => RegistrationStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer from the status endpoint
#[derive(Debug, Clone)]
pub struct RegistrationProgress {
    pub status: RegistrationStatus,
    pub type_arn: Option<String>,
    pub type_version_arn: Option<String>,
    pub description: Option<String>,
}

impl RegistrationProgress {
    pub fn in_progress() -> Self {
        Self {
            status: RegistrationStatus::InProgress,
            type_arn: None,
            type_version_arn: None,
            description: None,
        }
    }

    pub fn complete(type_arn: impl Into<String>, type_version_arn: impl Into<String>) -> Self {
        Self {
            status: RegistrationStatus::Complete,
            type_arn: Some(type_arn.into()),
            type_version_arn: Some(type_version_arn.into()),
            description: None,
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            status: RegistrationStatus::Failed,
            type_arn: None,
            type_version_arn: None,
            description: Some(description.into()),
        }
    }
}

/// Everything `RegisterType` needs for a resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistrationRequest {
    pub type_name: String,
    pub schema_handler_package: String,
    pub log_role_arn: String,
    pub log_group_name: String,
    pub execution_role_arn: String,
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered {
        type_arn: String,
        type_version_arn: String,
    },
    /// Any terminal status other than `COMPLETE`
    Failed {
        status: RegistrationStatus,
        description: Option<String>,
    },
    /// Gave up while the registration was still in progress
    TimedOut { waited: Duration },
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }

    /// Lines printed to stdout once the run is over
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            RegistrationOutcome::Registered {
                type_arn,
                type_version_arn,
            } => vec![
                "Successfully registered type...".to_string(),
                format!("\tType ARN        : {}", type_arn),
                format!("\tType Version ARN: {}", type_version_arn),
            ],
            RegistrationOutcome::Failed { .. } => vec!["Registration failed.".to_string()],
            RegistrationOutcome::TimedOut { waited } => vec![format!(
                "Registration still in progress after {}s; giving up.",
                waited.as_secs()
            )],
        }
    }
}
