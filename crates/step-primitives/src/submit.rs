//! submit primitive: runs the form's constraint validation, then either
//! submits (preferring a submit button so `formaction`/`formmethod`
//! overrides on the button are honored) or reports the first invalid field.

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug, Serialize)]
pub struct SubmitOutcome {
    pub submitted: bool,
    pub valid: bool,
    pub errors: Vec<String>,
}

pub async fn submit(page: &PageController, frame: &FrameId, locator: &Locator) -> Result<SubmitOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;

    let body = format!(
        "const el = {js_ref};\n\
         if (!el) return {{ submitted: false, valid: false, errors: ['element not found'] }};\n\
         const form = el.tagName === 'FORM' ? el : el.form || el.closest('form');\n\
         if (!form) return {{ submitted: false, valid: false, errors: ['no form found'] }};\n\
         const valid = form.checkValidity();\n\
         if (!valid) {{\n\
           const errors = Array.from(form.elements)\n\
             .filter((f) => typeof f.checkValidity === 'function' && !f.checkValidity())\n\
             .map((f) => f.validationMessage || (f.name || f.id || 'field') + ' is invalid');\n\
           return {{ submitted: false, valid: false, errors }};\n\
         }}\n\
         const submitter = form.querySelector('[type=submit]') || form.querySelector('button:not([type])');\n\
         if (submitter && typeof submitter.click === 'function') {{\n\
           submitter.click();\n\
         }} else if (typeof form.requestSubmit === 'function') {{\n\
           form.requestSubmit();\n\
         }} else {{\n\
           form.submit();\n\
         }}\n\
         return {{ submitted: true, valid: true, errors: [] }};",
        js_ref = handle.js_ref(),
    );

    let value = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
    Ok(SubmitOutcome {
        submitted: value.get("submitted").and_then(|v| v.as_bool()).unwrap_or(false),
        valid: value.get("valid").and_then(|v| v.as_bool()).unwrap_or(false),
        errors: value
            .get("errors")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
    })
}
