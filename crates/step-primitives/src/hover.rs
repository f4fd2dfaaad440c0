//! Hover primitive: moves the mouse to the element's clickable point without
//! pressing a button, optionally capturing a tooltip/popover's resulting
//! text via a single follow-up evaluation.

use core_types::{FrameId, Locator};
use element_locator::ResolveOptions;
use input_emulator::InputEmulator;
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;
use crate::geometry::clickable_point;

#[derive(Clone, Debug, Default)]
pub struct HoverOptions {
    pub force: bool,
    /// JS expression evaluated after the hover settles; its value is
    /// returned as `captured_result`.
    pub capture: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HoverOutcome {
    pub hovered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_forced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_resolved: Option<bool>,
}

pub async fn hover(
    page: &PageController,
    input: &InputEmulator,
    frame: &FrameId,
    locator: &Locator,
    opts: &HoverOptions,
) -> Result<HoverOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;
    let re_resolved = handle.re_resolved.then_some(true);

    let wait_opts = actionability::WaitOptions {
        force: opts.force,
        ..Default::default()
    };
    let wait_outcome = actionability::wait_until_actionable(page, &handle, &wait_opts).await?;
    let auto_forced = wait_outcome.auto_forced.then_some(true);

    let (x, y) = clickable_point(page, &handle).await?;
    input.move_to(x, y).await?;

    let captured_result = match &opts.capture {
        Some(expr) => Some(page.evaluate_in_frame(&handle.frame, expr).await?),
        None => None,
    };

    Ok(HoverOutcome {
        hovered: true,
        captured_result,
        auto_forced,
        re_resolved,
    })
}
