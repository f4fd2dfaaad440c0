//! Element Locator (C6): resolves a `core_types::Locator` into a live
//! `ElementHandle` kept in a page-global handle map, plus the JS helper
//! library (role/accessible-name computation) other crates reuse.

pub mod error;
pub mod handle;
pub mod js;
pub mod locator;

pub use error::LocatorError;
pub use handle::ElementHandle;
pub use locator::{reresolve, resolve, ResolveOptions};
