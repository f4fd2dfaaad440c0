//! Error taxonomy shared by every crate in the driver.
//!
//! Library crates raise their own `thiserror` enums scoped to their
//! component; each of those implements `Into<DriverError>` so the step
//! runner can fold everything into the `error.type` values from spec §7
//! without every crate depending on every other crate's error type.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Parse,
    Validation,
    Connection,
    Timeout,
    Navigation,
    NavigationAborted,
    PageCrashed,
    ContextDestroyed,
    NotFound,
    Execution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Parse => "PARSE",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Navigation => "NAVIGATION",
            ErrorKind::NavigationAborted => "NAVIGATION_ABORTED",
            ErrorKind::PageCrashed => "PAGE_CRASHED",
            ErrorKind::ContextDestroyed => "CONTEXT_DESTROYED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Execution => "EXECUTION",
        };
        write!(f, "{s}")
    }
}

/// Enriched error carried across crate boundaries, mirroring the teacher's
/// `AdapterError` (`kind` + `hint` + `retriable` + free-form `data`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default)]
    pub retriable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl DriverError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retriable: false,
            data: None,
        }
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DriverError {}
