use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    NavigationFailed(String),
    #[error("navigation superseded by a newer one")]
    Superseded,
    #[error("navigation stopped")]
    Stopped,
    #[error("page crashed")]
    Crashed,
    #[error("execution context destroyed")]
    ContextDestroyed,
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("frame not found: {0}")]
    FrameNotFound(String),
    #[error(transparent)]
    Transport(#[from] cdp_transport::TransportError),
}

impl From<PageError> for DriverError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::NavigationFailed(msg) => DriverError::new(ErrorKind::Navigation, msg),
            PageError::Superseded | PageError::Stopped => {
                DriverError::new(ErrorKind::NavigationAborted, err.to_string())
            }
            PageError::Crashed => DriverError::new(ErrorKind::PageCrashed, "page crashed"),
            PageError::ContextDestroyed => {
                DriverError::new(ErrorKind::ContextDestroyed, "execution context destroyed")
            }
            PageError::Timeout(what) => DriverError::timeout(what),
            PageError::FrameNotFound(sel) => {
                DriverError::not_found(format!("frame not found: {sel}"))
            }
            PageError::Transport(t) => t.into(),
        }
    }
}
