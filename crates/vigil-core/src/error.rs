//! Error types and result alias for Vigil.
//!
//! This module defines the failure taxonomy shared across all Vigil
//! components. Each variant corresponds to one independent failure source a
//! scenario can record; `Aggregate` is produced only by the verdict reduction
//! and enumerates every contributing cause.

use std::time::Duration;

/// The result type used throughout Vigil.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a scenario.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required secret or configuration value could not be obtained.
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description of the missing precondition.
        message: String,
    },

    /// Staging an input resource or mutating platform configuration failed.
    #[error("setup failed: {message}")]
    Setup {
        /// Description of the setup failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A publisher or prober subprocess failed to launch or run.
    #[error("{role} subprocess failed: {message}")]
    Subprocess {
        /// Which media tool failed.
        role: &'static str,
        /// Description of the subprocess failure.
        message: String,
    },

    /// Subprocess output did not match the expected structured schema.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the parse failure, including raw output context.
        message: String,
    },

    /// A collected result failed a scenario-specific predicate.
    #[error("assertion failed: {message}")]
    Assertion {
        /// Description of the failed predicate.
        message: String,
    },

    /// The shared scope expired before intended completion.
    #[error("deadline exceeded after {budget:?}")]
    DeadlineExceeded {
        /// The wall-clock budget that was exhausted.
        budget: Duration,
    },

    /// The shared scope was cancelled before the work finished.
    #[error("cancelled: {message}")]
    Cancelled {
        /// Description of what was interrupted.
        message: String,
    },

    /// A bounded polling loop exhausted its attempt budget.
    #[error("poll timeout: {message}")]
    PollTimeout {
        /// Description of the resource that never settled.
        message: String,
    },

    /// A control API request failed.
    #[error("api error: {message}")]
    Api {
        /// Description of the request failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Multiple independent failure causes, collected by the verdict
    /// reduction. Every concurrent cause is enumerated, not just the first.
    #[error("{} failure cause(s): {}", causes.len(), causes.join("; "))]
    Aggregate {
        /// Every contributing cause, in slot order.
        causes: Vec<String>,
    },
}

impl Error {
    /// Creates a new precondition error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a new setup error.
    #[must_use]
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new setup error with a source cause.
    #[must_use]
    pub fn setup_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Setup {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new subprocess error for the given media tool role.
    #[must_use]
    pub fn subprocess(role: &'static str, message: impl Into<String>) -> Self {
        Self::Subprocess {
            role,
            message: message.into(),
        }
    }

    /// Creates a new parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a new assertion error.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Creates a new cancellation error.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Creates a new poll timeout error.
    #[must_use]
    pub fn poll_timeout(message: impl Into<String>) -> Self {
        Self::PollTimeout {
            message: message.into(),
        }
    }

    /// Creates a new control API error.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new control API error with a source cause.
    #[must_use]
    pub fn api_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Api {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn subprocess_error_names_role() {
        let err = Error::subprocess("prober", "exit status 1");
        assert!(err.to_string().contains("prober"));
        assert!(err.to_string().contains("exit status 1"));
    }

    #[test]
    fn api_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::api_with_source("request /secret failed", source);
        assert!(err.to_string().contains("request /secret failed"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn aggregate_enumerates_every_cause() {
        let err = Error::Aggregate {
            causes: vec!["low score".into(), "short duration".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 failure cause(s)"));
        assert!(msg.contains("low score"));
        assert!(msg.contains("short duration"));
    }

    #[test]
    fn deadline_error_reports_budget() {
        let err = Error::DeadlineExceeded {
            budget: Duration::from_secs(60),
        };
        assert!(err.to_string().contains("deadline exceeded"));
    }
}
