//! Viewport-clipped click point (§4.10 "click method resolution": the
//! center of the quad-clipped visible area).

use element_locator::{js::wrap, ElementHandle};
use page_controller::PageController;

use crate::error::PrimitiveError;

pub async fn clickable_point(page: &PageController, handle: &ElementHandle) -> Result<(f64, f64), PrimitiveError> {
    let body = format!(
        "const el = {js_ref};\n\
         if (!el) return null;\n\
         const rect = el.getBoundingClientRect();\n\
         const clipX1 = Math.max(rect.left, 0);\n\
         const clipY1 = Math.max(rect.top, 0);\n\
         const clipX2 = Math.min(rect.right, window.innerWidth);\n\
         const clipY2 = Math.min(rect.bottom, window.innerHeight);\n\
         if (clipX2 <= clipX1 || clipY2 <= clipY1) return null;\n\
         return {{ x: (clipX1 + clipX2) / 2, y: (clipY1 + clipY2) / 2 }};",
        js_ref = handle.js_ref(),
    );
    let value = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
    let x = value.get("x").and_then(|v| v.as_f64());
    let y = value.get("y").and_then(|v| v.as_f64());
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(PrimitiveError::NoGeometry(handle.describe.clone())),
    }
}
