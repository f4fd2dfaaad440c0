//! Chrome DevTools Protocol websocket transport (C1), session registry (C2)
//! and tab alias store (C3). Chrome's own launch/discovery is an external
//! collaborator's job; this crate only ever attaches to a running browser's
//! debugging port.

pub mod config;
pub mod error;
pub mod listeners;
pub mod session;
pub mod tabs;
pub mod transport;

pub use config::TransportConfig;
pub use error::TransportError;
pub use listeners::{ListenerHandle, ListenerRegistry};
pub use session::{SessionEntry, SessionRegistry, SessionState};
pub use tabs::TabAliasStore;
pub use transport::{lifecycle_events, CommandTarget, Transport, TransportEvent};
