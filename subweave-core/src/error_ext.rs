use crate::error::{ConfigError, CoreError, DatasetError, RedditApiError};
use std::time::Duration;
use tracing::{error, warn};

/// Extension trait for error handling utilities
pub trait ErrorExt {
    /// Log the error with appropriate level and context
    fn log_error(&self, context: &str);

    /// Log the error as a warning with context
    fn log_warn(&self, context: &str);

    /// Check if this error should trigger a retry
    fn is_retryable(&self) -> bool;

    /// Get the suggested retry delay for this error
    fn retry_after(&self) -> Option<Duration>;

    /// Get a user-friendly message for this error
    fn user_friendly_message(&self) -> String;

    /// Get error code for programmatic handling
    fn error_code(&self) -> &'static str;
}

impl ErrorExt for CoreError {
    fn log_error(&self, context: &str) {
        error!("{}: {}", context, self);
    }

    fn log_warn(&self, context: &str) {
        warn!("{}: {}", context, self);
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            CoreError::Network(_) => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Dataset(e) => e.user_friendly_message(),
            CoreError::Io(_) => "A file system error occurred. Check disk space and permissions.".to_string(),
            CoreError::Serialization(_) => "A data formatting error occurred.".to_string(),
            CoreError::Network(_) => "A network error occurred. Check your internet connection.".to_string(),
            CoreError::InvalidInput { message } => format!("Invalid input: {message}"),
            CoreError::Internal { .. } => "An internal error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Dataset(e) => e.error_code(),
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Network(_) => "NETWORK_ERROR",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self, context: &str) {
        error!("{}: {}", context, self);
    }

    fn log_warn(&self, context: &str) {
        warn!("{}: {}", context, self);
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedditApiError::RateLimitExceeded { .. }
                | RedditApiError::RequestTimeout
                | RedditApiError::ServerError { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            RedditApiError::RequestTimeout | RedditApiError::ServerError { .. } => {
                Some(Duration::from_secs(30))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit rejected the application credentials. Check REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => {
                format!("Reddit rate limit reached. Waiting {retry_after} seconds before retrying.")
            }
            RedditApiError::Forbidden { resource } => {
                format!("Access to {resource} is forbidden. The community may be private or quarantined.")
            }
            RedditApiError::NotFound { resource } => {
                format!("{resource} was not found. It may have been deleted or banned.")
            }
            RedditApiError::InvalidToken => {
                "The Reddit session expired. A new token will be requested automatically.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "The Reddit API request timed out. Retrying shortly.".to_string()
            }
            RedditApiError::InvalidResponse { .. } => {
                "Reddit returned an unexpected response format.".to_string()
            }
            RedditApiError::ServerError { status_code } => {
                format!("Reddit is having server issues (HTTP {status_code}). Retrying shortly.")
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED",
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
            RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND",
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN",
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self, context: &str) {
        error!("{}: {}", context, self);
    }

    fn log_warn(&self, context: &str) {
        warn!("{}: {}", context, self);
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariable { var_name } => {
                format!("Missing configuration: set {var_name} in the environment or .env file.")
            }
            ConfigError::FileNotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid configuration value for {field}: {value}")
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration validation failed: {reason}")
            }
            ConfigError::Parse(_) => "The configuration file could not be parsed.".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR",
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }
}

impl ErrorExt for DatasetError {
    fn log_error(&self, context: &str) {
        error!("{}: {}", context, self);
    }

    fn log_warn(&self, context: &str) {
        warn!("{}: {}", context, self);
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatasetError::CreateFailed { path, .. } => {
                format!("Could not create output file {path}. Check the output directory.")
            }
            DatasetError::WriteFailed { dataset, .. } => {
                format!("Could not write to the {dataset} dataset. Check disk space.")
            }
            DatasetError::Csv(_) => "A CSV formatting error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            DatasetError::CreateFailed { .. } => "DATASET_CREATE_FAILED",
            DatasetError::WriteFailed { .. } => "DATASET_WRITE_FAILED",
            DatasetError::Csv(_) => "DATASET_CSV_ERROR",
        }
    }
}

/// Helper for consistent error reporting across the application
pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error!(
                error_code = error.error_code(),
                retryable = error.is_retryable(),
                "{}",
                error.user_friendly_message()
            );
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            warn!(
                error_code = error.error_code(),
                "{}",
                error.user_friendly_message()
            );
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
