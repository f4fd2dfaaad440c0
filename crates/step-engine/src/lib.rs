//! Step Engine: the Step Executors (C10), Step Runner (C11) and tab
//! lifecycle that turn one parsed command into the final JSON report.

pub mod console;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod pdf_sink;
pub mod ready;
pub mod runner;
pub mod screenshot;
pub mod site_profile;
pub mod snapshot_sink;
pub mod tabs;

pub use console::ConsoleCapture;
pub use error::StepError;
pub use model::{CommandContext, CommandInput, CommandOutput, RawStep, StepResult, StepStatus};
pub use pdf_sink::{NullPdfSink, PdfSink};
pub use runner::{run_command, RunnerDeps};
pub use screenshot::{NullScreenshotSink, ScreenshotSink};
pub use site_profile::{NullSiteProfileStore, SiteProfileStore};
pub use snapshot_sink::{NullSnapshotSink, SnapshotSink};
pub use tabs::TabManager;
