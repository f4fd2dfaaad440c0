//! Actionability Checker (C7): re-checks the six predicates in `check` on a
//! jittered exponential backoff until they all pass, a deadline expires, or
//! the single auto-force fallback kicks in.

pub mod check;
pub mod error;

pub use check::{check, ActionabilityReport};
pub use error::ActionabilityError;

use std::time::Duration;

use element_locator::ElementHandle;
use page_controller::PageController;
use rand::Rng;
use tracing::{debug, warn};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);
const BASE_DELAY: Duration = Duration::from_millis(50);
const MAX_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct WaitOptions {
    pub deadline: Duration,
    /// Require the `editable` predicate (text-entry actions only).
    pub require_editable: bool,
    /// Skip checks entirely and report `auto_forced: true` from the start.
    pub force: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            require_editable: false,
            force: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WaitOutcome {
    pub report: ActionabilityReport,
    /// True if the deadline was reached and the checker proceeded anyway on
    /// a single best-effort retry rather than failing outright.
    pub auto_forced: bool,
}

/// Polls `check` with jittered (1.9x-2.1x) exponential backoff capped at
/// `opts.deadline`. On the final timeout, makes one more attempt and, if the
/// element at least still exists in the DOM, returns it anyway marked
/// `auto_forced: true` rather than erroring - mirroring how a human retries
/// once by hand before giving up.
pub async fn wait_until_actionable(
    page: &PageController,
    handle: &ElementHandle,
    opts: &WaitOptions,
) -> Result<WaitOutcome, ActionabilityError> {
    if opts.force {
        let report = check(page, handle).await?;
        if report.stale {
            return Err(ActionabilityError::Stale(handle.describe.clone()));
        }
        return Ok(WaitOutcome {
            report,
            auto_forced: true,
        });
    }

    let start = tokio::time::Instant::now();
    let mut delay = BASE_DELAY;

    loop {
        let report = check(page, handle).await?;
        if report.stale {
            return Err(ActionabilityError::Stale(handle.describe.clone()));
        }
        if report.passes(opts.require_editable) {
            return Ok(WaitOutcome {
                report,
                auto_forced: false,
            });
        }

        if start.elapsed() >= opts.deadline {
            warn!(
                target: "actionability",
                describe = %handle.describe,
                reason = %report.first_failing_reason(opts.require_editable),
                "deadline reached, auto-forcing one last attempt"
            );
            let final_report = check(page, handle).await?;
            if final_report.stale {
                return Err(ActionabilityError::Stale(handle.describe.clone()));
            }
            if final_report.passes(opts.require_editable) {
                return Ok(WaitOutcome {
                    report: final_report,
                    auto_forced: false,
                });
            }
            return Ok(WaitOutcome {
                report: final_report,
                auto_forced: true,
            });
        }

        let jitter = rand::thread_rng().gen_range(1.9..=2.1);
        let sleep_for = Duration::from_secs_f64((delay.as_secs_f64() * jitter).min(MAX_DELAY.as_secs_f64()));
        debug!(target: "actionability", ?sleep_for, describe = %handle.describe, "not yet actionable, retrying");
        tokio::time::sleep(sleep_for).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}
