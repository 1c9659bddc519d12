//! Error types used by the controller and by worker bodies.
//!
//! This module defines two enums:
//!
//! - [`ControlError`]: recoverable outcomes of controller commands.
//! - [`WorkError`]: errors returned by custom worker bodies.
//!
//! Both provide `as_label` (stable snake_case, for logs) and `as_message`.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by controller commands.
///
/// Every variant is scoped to a single command (and usually a single worker
/// name). None of them is fatal to the controller and none of them leaves the
/// registry in a state that affects other workers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// A live worker already owns this name; the existing worker is untouched.
    #[error("worker '{name}' already exists")]
    DuplicateName {
        /// The contested name.
        name: String,
    },

    /// No live worker is registered under this name.
    #[error("worker '{name}' not found")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// A required command field is absent or empty.
    #[error("missing argument: {field}")]
    MissingArgument {
        /// Name of the required field.
        field: &'static str,
    },

    /// A command field is present but cannot be interpreted.
    #[error("invalid {field}: '{value}'")]
    InvalidArgument {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value as received.
        value: String,
    },

    /// The command token is not part of the protocol.
    #[error("unknown command: '{command}'")]
    UnknownCommand {
        /// The offending token.
        command: String,
    },

    /// Cancellation was signalled but the worker did not exit within the grace period.
    ///
    /// The registry entry is left in place; it disappears once the worker exits.
    #[error("worker '{name}' did not stop within {grace:?}")]
    TimedOut {
        /// Worker that is still finishing.
        name: String,
        /// The grace period that elapsed.
        grace: Duration,
    },
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use workerctl::ControlError;
    ///
    /// let err = ControlError::NotFound { name: "w".into() };
    /// assert_eq!(err.as_label(), "not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::DuplicateName { .. } => "duplicate_name",
            ControlError::NotFound { .. } => "not_found",
            ControlError::MissingArgument { .. } => "missing_argument",
            ControlError::InvalidArgument { .. } => "invalid_argument",
            ControlError::UnknownCommand { .. } => "unknown_command",
            ControlError::TimedOut { .. } => "timed_out",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    /// Convenience: the worker name this error refers to, if any.
    pub fn worker(&self) -> Option<&str> {
        match self {
            ControlError::DuplicateName { name }
            | ControlError::NotFound { name }
            | ControlError::TimedOut { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// # Errors produced by custom worker bodies.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkError {
    /// Body failed; the worker completes as `Failed`.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Body observed cancellation and bailed out; the worker completes as `CompletedByStop`.
    #[error("context cancelled")]
    Canceled,
}

impl WorkError {
    /// Builds a [`WorkError::Fail`] from anything printable.
    pub fn fail(error: impl ToString) -> Self {
        WorkError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use workerctl::WorkError;
    ///
    /// assert_eq!(WorkError::Canceled.as_label(), "work_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Canceled => "work_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Canceled => "context cancelled".to_string(),
        }
    }
}
