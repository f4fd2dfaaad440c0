//! selectOption primitive (§4.10): native `<select>` elements can't be
//! clicked open via CDP, so this is JS-only: set `option.selected` and
//! dispatch `change`.

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug)]
pub enum OptionMatch {
    Value(String),
    Label(String),
    Index(usize),
    Values(Vec<String>),
}

#[derive(Clone, Debug, Serialize)]
pub struct SelectOutcome {
    pub selected: Vec<String>,
    pub multiple: bool,
}

pub async fn select_option(
    page: &PageController,
    frame: &FrameId,
    locator: &Locator,
    option: &OptionMatch,
) -> Result<SelectOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;

    let match_js = match option {
        OptionMatch::Value(v) => format!(
            "(opt) => opt.value === {v}",
            v = serde_json::to_string(v).unwrap_or_else(|_| "\"\"".to_string())
        ),
        OptionMatch::Label(l) => format!(
            "(opt) => opt.textContent.trim() === {l}",
            l = serde_json::to_string(l).unwrap_or_else(|_| "\"\"".to_string())
        ),
        OptionMatch::Index(i) => format!("(opt, idx) => idx === {i}"),
        OptionMatch::Values(values) => {
            let list = serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string());
            format!("(opt) => ({list}).includes(opt.value)")
        }
    };

    let body = format!(
        "const el = {js_ref};\n\
         if (!el || el.tagName !== 'SELECT') return {{ status: 'unsupported' }};\n\
         const matcher = {match_js};\n\
         const options = Array.from(el.options);\n\
         let any = false;\n\
         options.forEach((opt, idx) => {{\n\
           const matched = matcher(opt, idx);\n\
           if (matched) any = true;\n\
           opt.selected = el.multiple ? (opt.selected || matched) : matched;\n\
         }});\n\
         if (!any) return {{ status: 'not-found' }};\n\
         el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
         el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
         const selected = Array.from(el.selectedOptions).map((o) => o.value);\n\
         return {{ status: 'ok', selected, multiple: el.multiple }};",
        js_ref = handle.js_ref(),
    );

    let value = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
    match value.get("status").and_then(|v| v.as_str()) {
        Some("ok") => Ok(SelectOutcome {
            selected: value
                .get("selected")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            multiple: value.get("multiple").and_then(|v| v.as_bool()).unwrap_or(false),
        }),
        Some("unsupported") => Err(PrimitiveError::Unsupported(handle.describe.clone())),
        _ => Err(PrimitiveError::OptionNotFound(handle.describe.clone())),
    }
}
