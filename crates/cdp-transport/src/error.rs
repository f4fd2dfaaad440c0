//! Transport-local error type, folded into `core_types::DriverError` at the
//! crate boundary so downstream callers only ever match on `ErrorKind`.

use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum TransportError {
    #[error("websocket i/o failure: {0}")]
    Io(String),
    #[error("command timed out")]
    Timeout,
    #[error("session {0} is invalid")]
    InvalidSession(String),
    #[error("pending command queue is full")]
    QueueFull,
    #[error("cdp error {code}: {message}")]
    Cdp { code: i64, message: String },
    #[error("internal transport error: {0}")]
    Internal(String),
}

impl From<TransportError> for DriverError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(msg) => DriverError::new(ErrorKind::Connection, msg).retriable(true),
            TransportError::Timeout => DriverError::timeout("command timed out"),
            TransportError::InvalidSession(id) => {
                DriverError::new(ErrorKind::Connection, format!("session {id} invalidated"))
            }
            TransportError::QueueFull => {
                DriverError::new(ErrorKind::Connection, "pending command queue is full")
                    .retriable(true)
            }
            TransportError::Cdp { code, message } => {
                let retriable = code >= 500;
                DriverError::new(ErrorKind::Execution, format!("cdp error {code}: {message}"))
                    .retriable(retriable)
            }
            TransportError::Internal(msg) => DriverError::new(ErrorKind::Execution, msg),
        }
    }
}
