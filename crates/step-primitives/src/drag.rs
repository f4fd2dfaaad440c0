//! Drag primitive (§4.10): three strategies, `auto` picking `html5` when
//! the source is `draggable`, then `range-input`, else `mouse`.

use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use input_emulator::InputEmulator;
use page_controller::PageController;
use serde::Serialize;
use std::time::Duration;

use crate::error::PrimitiveError;
use crate::geometry::clickable_point;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DragMethod {
    Auto,
    Html5,
    RangeInput,
    Mouse,
}

#[derive(Clone, Debug)]
pub struct DragOptions {
    pub method: DragMethod,
    pub steps: u32,
    pub delay: Duration,
}

impl Default for DragOptions {
    fn default() -> Self {
        Self {
            method: DragMethod::Auto,
            steps: 10,
            delay: Duration::from_millis(10),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DragOutcome {
    pub dragged: bool,
    pub method: String,
}

pub async fn drag(
    page: &PageController,
    input: &InputEmulator,
    frame: &FrameId,
    source: &Locator,
    target: &Locator,
    opts: &DragOptions,
) -> Result<DragOutcome, PrimitiveError> {
    let source_handle = element_locator::resolve(page, frame, source, ResolveOptions::default()).await?;
    let target_handle = element_locator::resolve(page, frame, target, ResolveOptions::default()).await?;

    let method = match opts.method {
        DragMethod::Auto => resolve_auto_method(page, &source_handle).await?,
        other => other,
    };

    match method {
        DragMethod::Html5 => drag_html5(page, &source_handle, &target_handle).await,
        DragMethod::RangeInput => drag_range_input(page, &source_handle, &target_handle).await,
        DragMethod::Mouse => drag_mouse(page, input, &source_handle, &target_handle, opts).await,
        DragMethod::Auto => unreachable!("resolve_auto_method never returns Auto"),
    }
}

async fn resolve_auto_method(
    page: &PageController,
    source: &element_locator::ElementHandle,
) -> Result<DragMethod, PrimitiveError> {
    let body = format!(
        "const el = {js_ref};\n\
         if (!el) return 'mouse';\n\
         if (el.draggable) return 'html5';\n\
         if (el.tagName === 'INPUT' && el.type === 'range') return 'range-input';\n\
         return 'mouse';",
        js_ref = source.js_ref(),
    );
    let value = page.evaluate_in_frame(&source.frame, &wrap(&body)).await?;
    Ok(match value.as_str() {
        Some("html5") => DragMethod::Html5,
        Some("range-input") => DragMethod::RangeInput,
        _ => DragMethod::Mouse,
    })
}

async fn drag_html5(
    page: &PageController,
    source: &element_locator::ElementHandle,
    target: &element_locator::ElementHandle,
) -> Result<DragOutcome, PrimitiveError> {
    let body = format!(
        "const source = {source_ref};\n\
         const target = {target_ref};\n\
         if (!source || !target) return false;\n\
         const rect = target.getBoundingClientRect();\n\
         const dt = new DataTransfer();\n\
         const fire = (el, type) => el.dispatchEvent(new DragEvent(type, {{ bubbles: true, cancelable: true, dataTransfer: dt, clientX: rect.x + rect.width / 2, clientY: rect.y + rect.height / 2 }}));\n\
         fire(source, 'dragstart');\n\
         fire(source, 'drag');\n\
         fire(target, 'dragover');\n\
         fire(target, 'drop');\n\
         fire(source, 'dragend');\n\
         return true;",
        source_ref = source.js_ref(),
        target_ref = target.js_ref(),
    );
    let dragged = page.evaluate_in_frame(&source.frame, &wrap(&body)).await?.as_bool().unwrap_or(false);
    Ok(DragOutcome {
        dragged,
        method: "html5".to_string(),
    })
}

async fn drag_range_input(
    page: &PageController,
    source: &element_locator::ElementHandle,
    target: &element_locator::ElementHandle,
) -> Result<DragOutcome, PrimitiveError> {
    let body = format!(
        "const source = {source_ref};\n\
         const target = {target_ref};\n\
         if (!source || source.tagName !== 'INPUT') return false;\n\
         const value = target && target.value !== undefined ? target.value : source.value;\n\
         const setter = Object.getOwnPropertyDescriptor(HTMLInputElement.prototype, 'value').set;\n\
         setter.call(source, value);\n\
         source.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
         source.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
         return true;",
        source_ref = source.js_ref(),
        target_ref = target.js_ref(),
    );
    let dragged = page.evaluate_in_frame(&source.frame, &wrap(&body)).await?.as_bool().unwrap_or(false);
    Ok(DragOutcome {
        dragged,
        method: "range-input".to_string(),
    })
}

async fn drag_mouse(
    page: &PageController,
    input: &InputEmulator,
    source: &element_locator::ElementHandle,
    target: &element_locator::ElementHandle,
    opts: &DragOptions,
) -> Result<DragOutcome, PrimitiveError> {
    let (sx, sy) = clickable_point(page, source).await?;
    let (tx, ty) = clickable_point(page, target).await?;

    input.move_to(sx, sy).await?;
    input.mouse_down(sx, sy, "left", 0).await?;

    let steps = opts.steps.max(1);
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let x = sx + (tx - sx) * t;
        let y = sy + (ty - sy) * t;
        input.move_to(x, y).await?;
        if !opts.delay.is_zero() {
            tokio::time::sleep(opts.delay).await;
        }
    }

    input.mouse_up(tx, ty, "left", 0).await?;

    Ok(DragOutcome {
        dragged: true,
        method: "mouse".to_string(),
    })
}
