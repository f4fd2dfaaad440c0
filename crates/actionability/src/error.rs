use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ActionabilityError {
    #[error("timed out after {0:?} waiting for element to become actionable: {1}")]
    Timeout(std::time::Duration, String),
    #[error("element is stale: {0}")]
    Stale(String),
    #[error(transparent)]
    Locator(#[from] element_locator::LocatorError),
    #[error(transparent)]
    Page(#[from] page_controller::PageError),
}

impl From<ActionabilityError> for DriverError {
    fn from(err: ActionabilityError) -> Self {
        match err {
            ActionabilityError::Timeout(_, reason) => {
                DriverError::timeout(format!("not actionable: {reason}")).retriable(true)
            }
            ActionabilityError::Stale(what) => {
                DriverError::new(ErrorKind::NotFound, format!("stale element: {what}"))
            }
            ActionabilityError::Locator(l) => l.into(),
            ActionabilityError::Page(p) => p.into(),
        }
    }
}
