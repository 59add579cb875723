/*!
 * Error types for the file sorter
 */

use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, SorterError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Errors surfaced by a routing invocation
///
/// Record-level variants carry the source bucket and the decoded key so the
/// operator can tell from a single log line which object stopped the batch.
#[derive(Error, Debug)]
pub enum SorterError {
    /// A required destination bucket name is absent or empty
    #[error("Configuration missing: {name} is not set")]
    ConfigurationMissing { name: String },

    /// Configuration source could not be read or parsed
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Notification payload is not a well-formed S3 event
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Object key could not be URL-decoded
    #[error("Failed to decode key {key:?} from bucket {bucket}: {reason}")]
    Decode {
        bucket: String,
        key: String,
        reason: String,
    },

    /// Copy to the destination bucket failed; the source is untouched
    #[error("Failed to copy s3://{bucket}/{key} to s3://{destination}/{key}: {source}")]
    CopyFailed {
        bucket: String,
        key: String,
        destination: String,
        #[source]
        source: StoreError,
    },

    /// Delete from the source bucket failed after a successful copy
    #[error(
        "Failed to delete s3://{bucket}/{key} after copying to s3://{destination}/{key} \
         (object now exists in both buckets): {source}"
    )]
    DeleteFailed {
        bucket: String,
        key: String,
        destination: String,
        #[source]
        source: StoreError,
    },

    /// Anything else raised while processing
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SorterError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // Nothing was attempted
            SorterError::ConfigurationMissing { .. }
            | SorterError::InvalidConfig(_)
            | SorterError::InvalidEvent(_) => EXIT_FATAL,
            // Earlier records may already be relocated
            _ => EXIT_PARTIAL,
        }
    }

    /// Whether the error was raised before any record could be touched
    pub fn is_fatal(&self) -> bool {
        self.exit_code() == EXIT_FATAL
    }

    /// Whether the source object may now also exist at its destination
    pub fn leaves_duplicate(&self) -> bool {
        matches!(self, SorterError::DeleteFailed { .. })
    }

    /// Whether a platform-level retry of the invocation could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SorterError::CopyFailed { source, .. } | SorterError::DeleteFailed { source, .. } => {
                source.is_retryable()
            }
            _ => false,
        }
    }

    /// Source bucket and key of the record that failed, if any
    pub fn record(&self) -> Option<(&str, &str)> {
        match self {
            SorterError::Decode { bucket, key, .. }
            | SorterError::CopyFailed { bucket, key, .. }
            | SorterError::DeleteFailed { bucket, key, .. } => Some((bucket, key)),
            _ => None,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SorterError::ConfigurationMissing { .. } | SorterError::InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            SorterError::InvalidEvent(_) | SorterError::Decode { .. } => ErrorCategory::Validation,
            SorterError::CopyFailed { .. } | SorterError::DeleteFailed { .. } => {
                ErrorCategory::Storage
            }
            SorterError::Unexpected(_) => ErrorCategory::Unknown,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid configuration
    Configuration,
    /// Malformed event or key
    Validation,
    /// Object store copy/delete failures
    Storage,
    /// Uncategorized errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<serde_json::Error> for SorterError {
    fn from(err: serde_json::Error) -> Self {
        SorterError::InvalidEvent(err.to_string())
    }
}

impl From<std::io::Error> for SorterError {
    fn from(err: std::io::Error) -> Self {
        SorterError::Unexpected(format!("I/O error: {}", err))
    }
}
