use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Artifact error: {0}")]
    Artifact(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Registration submission failed: {0}")]
    Submission(String),

    #[error("Registration status check failed: {0}")]
    StatusCheck(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
