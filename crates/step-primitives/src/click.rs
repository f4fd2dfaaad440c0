//! Click primitive (§4.10): resolve, wait actionable, dispatch via the input
//! emulator at the element's clickable point, verify a capture-phase
//! listener actually saw it, and fall back to `element.click()` once.

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use input_emulator::InputEmulator;
use page_controller::PageController;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PrimitiveError;
use crate::geometry::clickable_point;

#[derive(Clone, Debug)]
pub struct ClickOptions {
    pub button: String,
    pub click_count: i64,
    pub modifiers: i32,
    /// Skip CDP entirely and call `element.click()` directly.
    pub js_click: bool,
    /// Never fall back to `element.click()` after a CDP click that the
    /// page didn't observe.
    pub native_only: bool,
    /// Skip actionability checks from the start.
    pub force: bool,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: "left".to_string(),
            click_count: 1,
            modifiers: 0,
            js_click: false,
            native_only: false,
            force: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ClickOutcome {
    pub clicked: bool,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_forced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_resolved: Option<bool>,
}

pub async fn click(
    page: &PageController,
    input: &InputEmulator,
    frame: &FrameId,
    locator: &Locator,
    opts: &ClickOptions,
) -> Result<ClickOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;
    let re_resolved = handle.re_resolved.then_some(true);

    if opts.js_click {
        let body = format!("const el = {js_ref}; if (!el) return false; el.click(); return true;", js_ref = handle.js_ref());
        page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
        return Ok(ClickOutcome {
            clicked: true,
            method: "jsClick".to_string(),
            auto_forced: None,
            re_resolved,
        });
    }

    let wait_opts = actionability::WaitOptions {
        force: opts.force,
        ..Default::default()
    };
    let wait_outcome = actionability::wait_until_actionable(page, &handle, &wait_opts).await?;
    let auto_forced = wait_outcome.auto_forced.then_some(true);

    let (x, y) = clickable_point(page, &handle).await?;

    let marker = format!("__cdpClickSeen_{}", handle.handle_id);
    let arm_body = format!(
        "const el = {js_ref};\n\
         if (!el) return false;\n\
         window['{marker}'] = false;\n\
         const onClick = () => {{ window['{marker}'] = true; el.removeEventListener('click', onClick, true); }};\n\
         el.addEventListener('click', onClick, true);\n\
         return true;",
        js_ref = handle.js_ref(),
    );
    page.evaluate_in_frame(&handle.frame, &wrap(&arm_body)).await?;

    input.click(x, y, &opts.button, opts.click_count, opts.modifiers).await?;

    let check_body = format!("return window['{marker}'] === true;");
    let seen = page
        .evaluate_in_frame(&handle.frame, &wrap(&check_body))
        .await?
        .as_bool()
        .unwrap_or(false);

    if seen || opts.native_only {
        debug!(target: "step-primitives", %seen, describe = %handle.describe, "click dispatched via CDP");
        return Ok(ClickOutcome {
            clicked: true,
            method: "cdp".to_string(),
            auto_forced,
            re_resolved,
        });
    }

    warn!(target: "step-primitives", describe = %handle.describe, "CDP click not observed, falling back to element.click()");
    let fallback_body = format!("const el = {js_ref}; if (!el) return false; el.click(); return true;", js_ref = handle.js_ref());
    let clicked = page
        .evaluate_in_frame(&handle.frame, &wrap(&fallback_body))
        .await?
        .as_bool()
        .unwrap_or(false);

    Ok(ClickOutcome {
        clicked,
        method: "jsClick-auto".to_string(),
        auto_forced,
        re_resolved,
    })
}
