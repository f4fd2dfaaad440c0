//! selectText primitive: selects a `[start, end)` character range within a
//! text-bearing element (input/textarea via `setSelectionRange`, else a DOM
//! `Range`/`Selection`).

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug, Serialize)]
pub struct SelectTextOutcome {
    pub selected: bool,
    pub text: String,
}

pub async fn select_text(
    page: &PageController,
    frame: &FrameId,
    locator: &Locator,
    start: usize,
    end: usize,
) -> Result<SelectTextOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;

    let body = format!(
        "const el = {js_ref};\n\
         if (!el) return {{ selected: false, text: '' }};\n\
         const tag = el.tagName ? el.tagName.toLowerCase() : '';\n\
         if (tag === 'input' || tag === 'textarea') {{\n\
           el.focus();\n\
           el.setSelectionRange({start}, {end});\n\
           return {{ selected: true, text: el.value.slice({start}, {end}) }};\n\
         }}\n\
         const textNode = el.firstChild;\n\
         if (!textNode) return {{ selected: false, text: '' }};\n\
         const range = document.createRange();\n\
         const len = (textNode.textContent || '').length;\n\
         range.setStart(textNode, Math.min({start}, len));\n\
         range.setEnd(textNode, Math.min({end}, len));\n\
         const sel = window.getSelection();\n\
         sel.removeAllRanges();\n\
         sel.addRange(range);\n\
         return {{ selected: true, text: range.toString() }};",
        js_ref = handle.js_ref(),
    );

    let value = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
    Ok(SelectTextOutcome {
        selected: value.get("selected").and_then(|v| v.as_bool()).unwrap_or(false),
        text: value.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
    })
}
