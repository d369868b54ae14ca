//! Error types for ACL reconciliation.
//!
//! Input errors (malformed desired document, unparseable listing,
//! unsupported rows) abort a run before anything is sent to the cluster.
//! Execution errors are categorized so transient failures can be retried.

use thiserror::Error;

/// Categories of errors for retry logic and user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Desired-state document or listing could not be understood
    Input,
    /// A rule cannot be expressed as an `rpk` invocation
    Unsupported,
    /// Broker unreachable or connection dropped (transient, retryable)
    Network,
    /// SASL credentials rejected or principal not authorized
    Authentication,
    /// `rpk` not found
    RpkNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "Invalid input",
            Self::Unsupported => "Unsupported rule",
            Self::Network => "Broker connectivity issue",
            Self::Authentication => "Authentication failed",
            Self::RpkNotFound => "rpk not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Input => "Fix the reported document or listing line and re-run",
            Self::Unsupported => "Remove the rule manually with rpk or extend the ACL document",
            Self::Network => "Check the broker address and that the cluster is reachable",
            Self::Authentication => "Check the user, password file and SASL mechanism",
            Self::RpkNotFound => "Install rpk or point --rpk at the executable",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while reconciling ACLs.
#[derive(Debug, Error)]
pub enum Error {
    /// Desired-state document has the wrong shape or misses required fields
    #[error("malformed ACL document ({context}): {message}")]
    MalformedInput {
        /// Where in the document the problem is (principal, rule index)
        context: String,
        /// What is wrong
        message: String,
    },

    /// A line of the `rpk acl list` output could not be parsed
    #[error("cannot parse ACL listing line {line_number}: {message}: {line:?}")]
    Parse {
        /// 1-based line number within the raw listing
        line_number: usize,
        /// The offending line, verbatim
        line: String,
        /// What is wrong with it
        message: String,
    },

    /// Rule carries a resource type the command builder does not know
    #[error("unsupported resource type {resource_type} in rule: {rule}")]
    UnsupportedResourceType {
        /// The resource type as reported
        resource_type: String,
        /// The offending rule, rendered
        rule: String,
    },

    /// Rule carries a permission that maps to no principal flag
    #[error("unsupported permission {permission} in rule: {rule}")]
    UnsupportedPermission {
        /// The permission as reported
        permission: String,
        /// The offending rule, rendered
        rule: String,
    },

    /// Broker unreachable
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from `rpk`
        message: String,
    },

    /// Credentials rejected or operation not authorized
    #[error("authentication error: {message}")]
    Authentication {
        /// Detailed error message from `rpk`
        message: String,
    },

    /// `rpk` is not installed or not on PATH
    #[error("rpk not found: {0}")]
    RpkNotFound(String),

    /// An `rpk` invocation failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Shorthand for [`Error::MalformedInput`].
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedInput { .. } | Error::Parse { .. } | Error::Json(_) | Error::Toml(_) => {
                ErrorCategory::Input
            }
            Error::UnsupportedResourceType { .. } | Error::UnsupportedPermission { .. } => {
                ErrorCategory::Unsupported
            }
            Error::Network { .. } => ErrorCategory::Network,
            Error::Authentication { .. } => ErrorCategory::Authentication,
            Error::RpkNotFound(_) => ErrorCategory::RpkNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from the stderr of a failed `rpk` invocation.
    ///
    /// `context` describes what was being attempted (e.g. the rule).
    pub fn from_rpk_output(stderr: &str, context: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("connection refused")
            || stderr_lower.contains("unable to dial")
            || stderr_lower.contains("no such host")
            || stderr_lower.contains("i/o timeout")
            || stderr_lower.contains("context deadline exceeded")
            || stderr_lower.contains("broken pipe")
            || stderr_lower.contains("connection reset")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("sasl")
            || stderr_lower.contains("authentication")
            || stderr_lower.contains("not authorized")
            || stderr_lower.contains("authorization failed")
        {
            return Error::Authentication {
                message: stderr.trim().to_string(),
            };
        }

        Error::CommandFailed {
            message: format!("rpk failed for {context}"),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for ACL operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Authentication.is_retryable());
        assert!(!ErrorCategory::Input.is_retryable());
    }

    #[test]
    fn test_from_rpk_output_network() {
        let err = Error::from_rpk_output(
            "unable to dial: dial tcp 127.0.0.1:9092: connect: connection refused",
            "list",
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_rpk_output_authentication() {
        let err = Error::from_rpk_output(
            "SASL_AUTHENTICATION_FAILED: SASL Authentication failed",
            "list",
        );
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_rpk_output_generic() {
        let err = Error::from_rpk_output("unknown flag: --bogus\n", "create User:alice");
        match err {
            Error::CommandFailed { message, stderr } => {
                assert!(message.contains("User:alice"));
                assert_eq!(stderr, "unknown flag: --bogus");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = Error::Parse {
            line_number: 3,
            line: "User:alice *".to_string(),
            message: "expected 7 or 8 fields, found 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("User:alice *"));
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}
