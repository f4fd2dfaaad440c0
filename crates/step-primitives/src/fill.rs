//! Fill primitive (§4.10): focus, optionally select-all, then
//! `Input.insertText`-equivalent paste plus `input`/`change` events, or the
//! React-controlled-input native-setter path when `react: true`.

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug, Default)]
pub struct FillOptions {
    pub select_all: bool,
    /// Use the native value-setter + `input{bubbles:true}` dispatch path
    /// React-controlled inputs require (direct `.value =` writes are
    /// swallowed by React's synthetic event system).
    pub react: bool,
    pub force: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FillOutcome {
    pub filled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_forced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_resolved: Option<bool>,
}

pub async fn fill(
    page: &PageController,
    frame: &FrameId,
    locator: &Locator,
    value: &str,
    opts: &FillOptions,
) -> Result<FillOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;
    let re_resolved = handle.re_resolved.then_some(true);

    let wait_opts = actionability::WaitOptions {
        force: opts.force,
        require_editable: true,
        ..Default::default()
    };
    let wait_outcome = actionability::wait_until_actionable(page, &handle, &wait_opts).await?;
    let auto_forced = wait_outcome.auto_forced.then_some(true);

    let value_json = serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
    let select_all_js = if opts.select_all {
        "if (typeof el.select === 'function') el.select();"
    } else {
        ""
    };

    let body = if opts.react {
        format!(
            "const el = {js_ref};\n\
             if (!el) return false;\n\
             el.focus();\n\
             {select_all_js}\n\
             const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;\n\
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;\n\
             setter.call(el, {value_json});\n\
             el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
             return true;",
            js_ref = handle.js_ref(),
        )
    } else {
        format!(
            "const el = {js_ref};\n\
             if (!el) return false;\n\
             el.focus();\n\
             {select_all_js}\n\
             el.value = {value_json};\n\
             el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
             return true;",
            js_ref = handle.js_ref(),
        )
    };

    let filled = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?.as_bool().unwrap_or(false);
    Ok(FillOutcome { filled, auto_forced, re_resolved })
}
