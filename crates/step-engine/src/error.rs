use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum StepError {
    #[error("malformed input: {0}")]
    Parse(String),
    #[error("invalid step: {0}")]
    Validation(String),
    #[error("unknown tab: {0}")]
    UnknownTab(String),
    #[error(transparent)]
    Primitive(#[from] step_primitives::PrimitiveError),
    #[error(transparent)]
    Locator(#[from] element_locator::LocatorError),
    #[error(transparent)]
    Actionability(#[from] actionability::ActionabilityError),
    #[error(transparent)]
    Input(#[from] input_emulator::InputError),
    #[error(transparent)]
    Page(#[from] page_controller::PageError),
    #[error(transparent)]
    Snapshot(#[from] accessibility_snapshot::SnapshotError),
    #[error(transparent)]
    Transport(#[from] cdp_transport::TransportError),
    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

impl From<StepError> for DriverError {
    fn from(err: StepError) -> Self {
        match err {
            StepError::Parse(msg) => DriverError::new(ErrorKind::Parse, msg),
            StepError::Validation(msg) | StepError::UnknownTab(msg) => {
                DriverError::new(ErrorKind::Validation, msg)
            }
            StepError::Primitive(p) => p.into(),
            StepError::Locator(l) => l.into(),
            StepError::Actionability(a) => a.into(),
            StepError::Input(i) => i.into(),
            StepError::Page(p) => p.into(),
            StepError::Snapshot(s) => s.into(),
            StepError::Transport(t) => t.into(),
            StepError::AssertionFailed(msg) => DriverError::new(ErrorKind::Execution, msg),
        }
    }
}
