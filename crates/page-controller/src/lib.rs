//! Page Controller (C4) and poll-based Wait Utilities (C5): the navigation
//! state machine, frame tree, and the helpers step executors wait on.

pub mod controller;
pub mod error;
pub mod frame;
pub mod wait;

pub use controller::{NavigateOptions, PageController, WaitUntil};
pub use error::PageError;
pub use frame::{FrameNode, FrameTree};
pub use wait::{clamp_timeout, wait_for_condition, wait_for_quiet, DEFAULT_TIMEOUT, MAX_TIMEOUT};
