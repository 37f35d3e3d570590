use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosterError {
    #[error("Digit sequence unavailable at {path}: {source}")]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input '{value}': {reason}")]
    InvalidInput { value: String, reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    #[error("Checkpoint required: {url}")]
    CheckpointRequired { url: String },

    #[error("Session error: {message}")]
    SessionError { message: String },

    #[error("User @{username} could not be resolved")]
    UserNotFound { username: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    RemoteResponse { endpoint: String, message: String },

    #[error("Image upload failed with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Publishing failed: {message}")]
    PublishFailed { message: String },

    #[error("Post count did not advance past index {last_index} (now {observed})")]
    StaleCount { last_index: i64, observed: i64 },

    #[error("Rendering error: {message}")]
    RenderError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Resource,
    Input,
    Configuration,
    Network,
    Authentication,
    Remote,
    Storage,
    Rendering,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code used by the binaries.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl PosterError {
    pub fn config(message: impl Into<String>) -> Self {
        PosterError::ConfigError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        PosterError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PosterError::ResourceUnavailable { .. } => ErrorCategory::Resource,
            PosterError::InvalidInput { .. } => ErrorCategory::Input,
            PosterError::ConfigError { .. }
            | PosterError::ConfigValidationError { .. }
            | PosterError::InvalidConfigValueError { .. }
            | PosterError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PosterError::ApiError(_) => ErrorCategory::Network,
            PosterError::LoginFailed { .. }
            | PosterError::CheckpointRequired { .. }
            | PosterError::SessionError { .. } => ErrorCategory::Authentication,
            PosterError::UserNotFound { .. }
            | PosterError::RemoteResponse { .. }
            | PosterError::UploadFailed { .. }
            | PosterError::PublishFailed { .. }
            | PosterError::StaleCount { .. } => ErrorCategory::Remote,
            PosterError::IoError(_) | PosterError::SerializationError(_) => ErrorCategory::Storage,
            PosterError::ImageError(_) | PosterError::RenderError { .. } => {
                ErrorCategory::Rendering
            }
            PosterError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Resource => ErrorSeverity::Critical,
            ErrorCategory::Storage => ErrorSeverity::Critical,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Remote => match self {
                PosterError::UploadFailed { .. } | PosterError::PublishFailed { .. } => {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Input
            | ErrorCategory::Configuration
            | ErrorCategory::Authentication
            | ErrorCategory::Rendering
            | ErrorCategory::Processing => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PosterError::ResourceUnavailable { path, .. } => format!(
                "Make sure the digit file exists at {} and is readable",
                path.display()
            ),
            PosterError::InvalidInput { .. } => "Provide a whole number, e.g. 0, 1 or -1".to_string(),
            PosterError::ApiError(_) => {
                "Check your network connection and try again in a few minutes".to_string()
            }
            PosterError::ConfigError { .. }
            | PosterError::ConfigValidationError { .. }
            | PosterError::InvalidConfigValueError { .. } => {
                "Review pi-poster.toml and the environment variables it references".to_string()
            }
            PosterError::MissingConfigError { field } => {
                format!("Set '{}' in pi-poster.toml or the environment", field)
            }
            PosterError::LoginFailed { .. } => {
                "Refresh the encrypted password from the browser network tab and log in again"
                    .to_string()
            }
            PosterError::CheckpointRequired { .. } => {
                "Complete the verification in a browser, then run the login again".to_string()
            }
            PosterError::SessionError { .. } => {
                "Run the login binary to create a fresh login_details.json".to_string()
            }
            PosterError::UserNotFound { .. } => {
                "Check the username and that the saved session is still valid".to_string()
            }
            PosterError::RemoteResponse { .. } => {
                "The remote API may have changed; check the client profile settings".to_string()
            }
            PosterError::UploadFailed { .. } | PosterError::PublishFailed { .. } => {
                "Retry later; if it persists, log in again to refresh the session".to_string()
            }
            PosterError::StaleCount { .. } => {
                "Verify the last post went live before running again".to_string()
            }
            PosterError::IoError(_) | PosterError::SerializationError(_) => {
                "Check file permissions and free disk space".to_string()
            }
            PosterError::ImageError(_) | PosterError::RenderError { .. } => {
                "Check the render settings (size, quality, output directory)".to_string()
            }
            PosterError::ProcessingError { .. } => "Re-run with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PosterError::ResourceUnavailable { path, .. } => {
                format!("File '{}' not found or unreadable.", path.display())
            }
            PosterError::InvalidInput { value, .. } => {
                format!("'{}' is not a valid integer position.", value)
            }
            PosterError::ApiError(_) => "Could not reach the remote service.".to_string(),
            PosterError::CheckpointRequired { url } => {
                format!("The account requires verification: {}", url)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resource_and_bad_input_exit_differently() {
        let missing = PosterError::ResourceUnavailable {
            path: PathBuf::from("pi.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let bad = PosterError::InvalidInput {
            value: "abc".to_string(),
            reason: "not an integer".to_string(),
        };

        assert_eq!(missing.category(), ErrorCategory::Resource);
        assert_eq!(bad.category(), ErrorCategory::Input);
        assert_ne!(missing.severity().exit_code(), bad.severity().exit_code());
        assert_ne!(missing.severity().exit_code(), 0);
        assert_ne!(bad.severity().exit_code(), 0);
    }

    #[test]
    fn test_user_friendly_message_mentions_path() {
        let err = PosterError::ResourceUnavailable {
            path: PathBuf::from("data/pi.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.user_friendly_message().contains("data/pi.txt"));
        assert!(err.recovery_suggestion().contains("data/pi.txt"));
    }

    #[test]
    fn test_publish_failures_are_retryable() {
        let err = PosterError::UploadFailed {
            status: 500,
            body: "oops".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.severity().exit_code(), 2);
    }
}
