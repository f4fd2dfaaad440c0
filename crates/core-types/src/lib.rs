//! Shared ids, element locator shapes and the error taxonomy for the
//! `cdp-skill` driver. Every other crate in the workspace depends on this
//! one; it depends on nothing else in the workspace.

pub mod error;
pub mod ids;
pub mod locator;

pub use error::{DriverError, ErrorKind};
pub use ids::{ElementRef, ExecutionContextId, FrameId, SessionId, TabAlias, TargetId};
pub use locator::Locator;
