use core_types::{DriverError, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum InputError {
    #[error("coordinates must be finite and non-negative: ({0}, {1})")]
    InvalidCoordinate(f64, f64),
    #[error("unknown mouse button: {0}")]
    InvalidButton(String),
    #[error("clickCount must be a positive integer, got {0}")]
    InvalidClickCount(i64),
    #[error("unknown key: {0}")]
    UnknownKey(String),
    #[error(transparent)]
    Transport(#[from] cdp_transport::TransportError),
}

impl From<InputError> for DriverError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::InvalidCoordinate(..) | InputError::InvalidButton(_) | InputError::InvalidClickCount(_) | InputError::UnknownKey(_) => {
                DriverError::new(ErrorKind::Validation, err.to_string())
            }
            InputError::Transport(t) => t.into(),
        }
    }
}
