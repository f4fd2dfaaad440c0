use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum PrimitiveError {
    #[error(transparent)]
    Locator(#[from] element_locator::LocatorError),
    #[error(transparent)]
    Actionability(#[from] actionability::ActionabilityError),
    #[error(transparent)]
    Input(#[from] input_emulator::InputError),
    #[error(transparent)]
    Page(#[from] page_controller::PageError),
    #[error("option not found: {0}")]
    OptionNotFound(String),
    #[error("element does not support this action: {0}")]
    Unsupported(String),
    #[error("geometry unavailable for element: {0}")]
    NoGeometry(String),
}

impl From<PrimitiveError> for DriverError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::Locator(l) => l.into(),
            PrimitiveError::Actionability(a) => a.into(),
            PrimitiveError::Input(i) => i.into(),
            PrimitiveError::Page(p) => p.into(),
            PrimitiveError::OptionNotFound(w) => DriverError::not_found(format!("option not found: {w}")),
            PrimitiveError::Unsupported(w) => DriverError::new(ErrorKind::Validation, w),
            PrimitiveError::NoGeometry(w) => DriverError::new(ErrorKind::NotFound, format!("no geometry: {w}")),
        }
    }
}
