use std::time::Duration;
use subweave_core::{
    ConfigError, CoreError, DatasetError, ErrorExt, ErrorReporter, RedditApiError,
};

#[test]
fn test_error_codes() {
    let rate_limited = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(rate_limited.error_code(), "REDDIT_RATE_LIMIT");

    let auth_failed = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_client".to_string(),
    });
    assert_eq!(auth_failed.error_code(), "REDDIT_AUTH_FAILED");

    let not_found = CoreError::RedditApi(RedditApiError::NotFound {
        resource: "/r/doesnotexist/about".to_string(),
    });
    assert_eq!(not_found.error_code(), "REDDIT_NOT_FOUND");

    let missing_var = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_ID".to_string(),
    });
    assert_eq!(missing_var.error_code(), "CONFIG_MISSING_ENV_VAR");

    let invalid_input = CoreError::InvalidInput {
        message: "no valid subreddits".to_string(),
    };
    assert_eq!(invalid_input.error_code(), "INVALID_INPUT");
}

#[test]
fn test_retryable_errors() {
    let retryable = [
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 5 }),
        CoreError::RedditApi(RedditApiError::RequestTimeout),
        CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 }),
    ];
    for error in &retryable {
        assert!(error.is_retryable(), "{error} should be retryable");
    }

    let not_retryable = [
        CoreError::RedditApi(RedditApiError::AuthenticationFailed {
            reason: "bad credentials".to_string(),
        }),
        CoreError::RedditApi(RedditApiError::Forbidden {
            resource: "/r/private".to_string(),
        }),
        CoreError::RedditApi(RedditApiError::NotFound {
            resource: "/r/gone".to_string(),
        }),
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "unexpected body".to_string(),
        }),
        CoreError::Config(ConfigError::ValidationFailed {
            reason: "empty plan".to_string(),
        }),
        CoreError::Internal {
            message: "bug".to_string(),
        },
    ];
    for error in &not_retryable {
        assert!(!error.is_retryable(), "{error} should not be retryable");
    }
}

#[test]
fn test_retry_after() {
    let rate_limited = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 42 });
    assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(42)));

    let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 });
    assert_eq!(server_error.retry_after(), Some(Duration::from_secs(30)));

    let forbidden = CoreError::RedditApi(RedditApiError::Forbidden {
        resource: "/r/private".to_string(),
    });
    assert_eq!(forbidden.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let auth_failed = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_client".to_string(),
    });
    let message = auth_failed.user_friendly_message();
    assert!(message.contains("REDDIT_CLIENT_ID"));

    let missing_var = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_USER_AGENT".to_string(),
    });
    assert!(missing_var
        .user_friendly_message()
        .contains("REDDIT_USER_AGENT"));

    let rate_limited = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 7 });
    assert!(rate_limited.user_friendly_message().contains('7'));
}

#[test]
fn test_dataset_error_surface() {
    let write_failed = CoreError::Dataset(DatasetError::WriteFailed {
        dataset: "posts".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
    });
    assert_eq!(write_failed.error_code(), "DATASET_WRITE_FAILED");
    assert!(!write_failed.is_retryable());
    assert!(write_failed.user_friendly_message().contains("posts"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(false);

    // Reporting must not panic regardless of the error shape.
    reporter.report_error(&CoreError::RedditApi(RedditApiError::InvalidToken));
    reporter.report_warning(&CoreError::Internal {
        message: "suppressed".to_string(),
    });
}

#[test]
fn test_error_conversion_chain() {
    fn load() -> Result<(), CoreError> {
        let config_error = ConfigError::MissingEnvironmentVariable {
            var_name: "REDDIT_CLIENT_SECRET".to_string(),
        };
        Err(config_error)?
    }

    match load() {
        Err(CoreError::Config(ConfigError::MissingEnvironmentVariable { var_name })) => {
            assert_eq!(var_name, "REDDIT_CLIENT_SECRET");
        }
        other => panic!("expected config error, got {other:?}"),
    }
}
