//! Scroll primitive: "top"/"bottom"/a selector/`{x,y}`/`{deltaY}`.

use core_types::FrameId;
use element_locator::js::wrap;
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug)]
pub enum ScrollTarget {
    Top,
    Bottom,
    Selector(String),
    Absolute { x: f64, y: f64 },
    Relative { delta_y: f64 },
}

#[derive(Clone, Debug, Serialize)]
pub struct ScrollOutcome {
    pub scroll_x: f64,
    pub scroll_y: f64,
}

pub async fn scroll(page: &PageController, frame: &FrameId, target: &ScrollTarget) -> Result<ScrollOutcome, PrimitiveError> {
    let body = match target {
        ScrollTarget::Top => "window.scrollTo(window.scrollX, 0);".to_string(),
        ScrollTarget::Bottom => "window.scrollTo(window.scrollX, document.documentElement.scrollHeight);".to_string(),
        ScrollTarget::Selector(sel) => {
            let sel_json = serde_json::to_string(sel).unwrap_or_else(|_| "\"\"".to_string());
            format!(
                "const el = document.querySelector({sel_json});\n\
                 if (el) el.scrollIntoView({{ block: 'center', inline: 'center' }});"
            )
        }
        ScrollTarget::Absolute { x, y } => format!("window.scrollTo({x}, {y});"),
        ScrollTarget::Relative { delta_y } => format!("window.scrollBy(0, {delta_y});"),
    };
    let expression = wrap(&format!("{body}\nreturn {{ scrollX: window.scrollX, scrollY: window.scrollY }};"));
    let value = page.evaluate_in_frame(frame, &expression).await?;
    Ok(ScrollOutcome {
        scroll_x: value.get("scrollX").and_then(|v| v.as_f64()).unwrap_or(0.0),
        scroll_y: value.get("scrollY").and_then(|v| v.as_f64()).unwrap_or(0.0),
    })
}
