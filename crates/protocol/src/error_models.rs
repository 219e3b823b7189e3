//! Service error contract.
//!
//! Every remote call either returns its result or a [`ServiceError`]. The
//! split between recoverable and unrecoverable errors decides whether the
//! client can keep the user's input and continue the current process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use ts_rs::TS;

use crate::process_models::ProcessState;

/// Error returned by a remote service call.
#[derive(Error, Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ServiceError {
    /// Validation failures, locked-entity conflicts and similar errors.
    ///
    /// The client resumes the current process either by showing the field
    /// messages or by re-rendering with the replacement state.
    #[error("{message}")]
    Recoverable {
        message: String,
        /// Field name to validation message.
        #[serde(default)]
        field_errors: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replacement: Option<Box<ProcessState>>,
    },

    /// Transport failures and server faults. The process cannot continue.
    #[error("{message}")]
    Unrecoverable {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
}

impl ServiceError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Recoverable {
            message: message.into(),
            field_errors: BTreeMap::new(),
            replacement: None,
        }
    }

    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self::Unrecoverable {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a validation message for `field`.
    ///
    /// Has no effect on unrecoverable errors.
    pub fn with_field_error(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        if let Self::Recoverable { field_errors, .. } = &mut self {
            field_errors.insert(field.into(), text.into());
        }
        self
    }

    /// Attach a replacement state. Has no effect on unrecoverable errors.
    pub fn with_replacement(mut self, state: ProcessState) -> Self {
        if let Self::Recoverable { replacement, .. } = &mut self {
            *replacement = Some(Box::new(state));
        }
        self
    }

    pub fn with_cause(mut self, text: impl Into<String>) -> Self {
        if let Self::Unrecoverable { cause, .. } = &mut self {
            *cause = Some(text.into());
        }
        self
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Recoverable { message, .. } | Self::Unrecoverable { message, .. } => message,
        }
    }
}

/// Result type for remote service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_only_on_recoverable() {
        let err = ServiceError::recoverable("Validation failed")
            .with_field_error("amount", "must be positive");
        match &err {
            ServiceError::Recoverable { field_errors, .. } => {
                assert_eq!(field_errors.get("amount").map(String::as_str), Some("must be positive"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let fatal = ServiceError::unrecoverable("Server fault").with_field_error("amount", "x");
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.to_string(), "Server fault");
    }

    #[test]
    fn test_cause_is_kept_for_unrecoverable() {
        let err = ServiceError::unrecoverable("Transport failure").with_cause("connection reset");
        assert!(matches!(
            err,
            ServiceError::Unrecoverable { cause: Some(ref c), .. } if c == "connection reset"
        ));
    }
}
