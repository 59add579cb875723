//! Error types for object store operations

use thiserror::Error;

/// Result type alias for object store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the object store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    Sdk(String),

    /// Service error with specific error code
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found or not accessible
    #[error("Bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid store configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Check if the caller's platform could reasonably retry this error
    ///
    /// The router never retries on its own; this only feeds diagnostics.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_) | StoreError::Timeout(_) => true,
            StoreError::Service { code, .. } => is_retryable_code(code),
            StoreError::Sdk(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("connection reset")
                    || lower.contains("connection timed out")
                    || lower.contains("broken pipe")
                    || lower.contains("connection refused")
            }
            _ => false,
        }
    }
}

/// Map an S3 service error code to a store error
pub(crate) fn from_service_code(code: String, message: String) -> StoreError {
    match code.as_str() {
        "AccessDenied" => StoreError::AccessDenied(message),
        "NoSuchBucket" => StoreError::BucketNotFound(message),
        _ => StoreError::Service { code, message },
    }
}

/// Check if an AWS error code is retryable
pub(crate) fn is_retryable_code(code: &str) -> bool {
    matches!(
        code,
        "RequestTimeout" | "ServiceUnavailable" | "InternalError" | "SlowDown"
    )
}

#[cfg(feature = "s3-native")]
impl<E> From<aws_sdk_s3::error::SdkError<E>> for StoreError
where
    E: aws_sdk_s3::error::ProvideErrorMetadata + std::error::Error + 'static,
{
    fn from(error: aws_sdk_s3::error::SdkError<E>) -> Self {
        use aws_sdk_s3::error::SdkError;

        match error {
            SdkError::DispatchFailure(e) => {
                StoreError::Network(format!("Network dispatch failure: {:?}", e))
            }
            SdkError::TimeoutError(e) => StoreError::Timeout(format!("{:?}", e)),
            SdkError::ResponseError(e) => StoreError::Network(format!("Response error: {:?}", e)),
            SdkError::ServiceError(e) => {
                let err = e.err();
                let code = err.code().unwrap_or("Unknown").to_string();
                let message = err.message().unwrap_or_default().to_string();
                from_service_code(code, message)
            }
            other => StoreError::Sdk(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Network("connection lost".to_string()).is_retryable());
        assert!(StoreError::Timeout("30s".to_string()).is_retryable());
        assert!(StoreError::Sdk("Connection refused".to_string()).is_retryable());
        assert!(!StoreError::Sdk("invalid argument".to_string()).is_retryable());
        assert!(!StoreError::AccessDenied("nope".to_string()).is_retryable());
    }

    #[test]
    fn test_service_codes() {
        let slow = StoreError::Service {
            code: "SlowDown".to_string(),
            message: "rate limited".to_string(),
        };
        assert!(slow.is_retryable());

        let missing = StoreError::Service {
            code: "NoSuchKey".to_string(),
            message: "not found".to_string(),
        };
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_service_code_mapping() {
        assert_eq!(
            from_service_code("NoSuchBucket".to_string(), "sorted-numeric".to_string()),
            StoreError::BucketNotFound("sorted-numeric".to_string())
        );
        assert_eq!(
            from_service_code("AccessDenied".to_string(), "denied".to_string()),
            StoreError::AccessDenied("denied".to_string())
        );
        assert_eq!(
            from_service_code("SlowDown".to_string(), "rate limited".to_string()),
            StoreError::Service {
                code: "SlowDown".to_string(),
                message: "rate limited".to_string(),
            }
        );
        assert!(!StoreError::BucketNotFound("b".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display_formats() {
        let err = StoreError::NotFound {
            bucket: "incoming".to_string(),
            key: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Object not found: incoming/42");

        let err = StoreError::Service {
            code: "SlowDown".to_string(),
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "S3 service error (SlowDown): rate limited");
    }
}
