use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum SnapshotError {
    #[error("frame not found: {0}")]
    FrameNotFound(String),
    #[error("snapshot evaluation failed: {0}")]
    Eval(String),
    #[error(transparent)]
    Page(#[from] page_controller::PageError),
}

impl From<SnapshotError> for DriverError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::FrameNotFound(f) => DriverError::not_found(format!("frame not found: {f}")),
            SnapshotError::Eval(msg) => DriverError::execution(msg),
            SnapshotError::Page(p) => p.into(),
        }
    }
}
