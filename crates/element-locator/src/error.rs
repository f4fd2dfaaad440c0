use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum LocatorError {
    #[error("locator matched no elements: {0}")]
    NoMatch(String),
    #[error("locator matched {count} elements, expected exactly one: {0}", count = .1)]
    Ambiguous(String, usize),
    #[error("invalid locator: {0}")]
    Invalid(String),
    #[error("stale element handle, frame or document changed")]
    Stale,
    #[error("frame not found: {0}")]
    FrameNotFound(String),
    #[error(transparent)]
    Page(#[from] page_controller::PageError),
    #[error(transparent)]
    Transport(#[from] cdp_transport::TransportError),
}

impl From<LocatorError> for DriverError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::NoMatch(what) => DriverError::not_found(format!("no match: {what}")),
            LocatorError::Ambiguous(what, count) => DriverError::new(
                ErrorKind::NotFound,
                format!("ambiguous locator matched {count} elements: {what}"),
            ),
            LocatorError::Invalid(msg) => DriverError::new(ErrorKind::Validation, msg),
            LocatorError::Stale => DriverError::new(ErrorKind::NotFound, "stale element handle"),
            LocatorError::FrameNotFound(f) => DriverError::not_found(format!("frame not found: {f}")),
            LocatorError::Page(p) => p.into(),
            LocatorError::Transport(t) => t.into(),
        }
    }
}
