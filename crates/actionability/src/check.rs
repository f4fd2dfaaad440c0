//! The six actionability predicates (§4.7/C7), evaluated in a single
//! round-trip against the target element so a flaky network doesn't smear
//! the checks across several stale snapshots of the page.

use element_locator::{js::wrap, ElementHandle};
use page_controller::PageController;
use serde::Deserialize;

use crate::error::ActionabilityError;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ActionabilityReport {
    pub stale: bool,
    pub visible: bool,
    pub enabled: bool,
    pub editable: bool,
    pub stable: bool,
    pub not_covered: bool,
    pub pointer_events_on: bool,
    /// Present only when `not_covered` is false: the element actually
    /// receiving pointer events at the target's center point.
    pub covered_by: Option<String>,
}

impl ActionabilityReport {
    /// Whether every predicate this checker cares about for `for_input`
    /// purposes holds. `editable` only gates text-entry actions; callers
    /// doing a plain click don't require it.
    pub fn passes(&self, require_editable: bool) -> bool {
        !self.stale
            && self.visible
            && self.enabled
            && self.stable
            && self.not_covered
            && self.pointer_events_on
            && (!require_editable || self.editable)
    }

    pub fn first_failing_reason(&self, require_editable: bool) -> String {
        if self.stale {
            return "stale".to_string();
        }
        if !self.visible {
            return "not visible".to_string();
        }
        if !self.enabled {
            return "disabled".to_string();
        }
        if require_editable && !self.editable {
            return "not editable".to_string();
        }
        if !self.stable {
            return "still animating/moving".to_string();
        }
        if !self.pointer_events_on {
            return "pointer-events: none".to_string();
        }
        if !self.not_covered {
            let by = self.covered_by.clone().unwrap_or_else(|| "another element".to_string());
            return format!("covered by {by}");
        }
        "unknown".to_string()
    }
}

/// Probes the element's last two bounding rects 16ms apart to call it
/// "stable"; cheap in-process stand-in for a real rAF-driven sample but
/// accurate for the common CSS-transition/animation settle case.
pub async fn check(page: &PageController, handle: &ElementHandle) -> Result<ActionabilityReport, ActionabilityError> {
    let body = format!(
        "const el = {js_ref};\n\
         if (!el || !document.contains(el)) return {{ stale: true }};\n\
         const rect1 = el.getBoundingClientRect();\n\
         await new Promise((r) => setTimeout(r, 16));\n\
         if (!document.contains(el)) return {{ stale: true }};\n\
         const rect2 = el.getBoundingClientRect();\n\
         const stable = Math.abs(rect1.x - rect2.x) < 0.5 && Math.abs(rect1.y - rect2.y) < 0.5\n\
           && Math.abs(rect1.width - rect2.width) < 0.5 && Math.abs(rect1.height - rect2.height) < 0.5;\n\
         const style = window.getComputedStyle(el);\n\
         const pointerEventsOn = style.pointerEvents !== 'none';\n\
         const cx = rect2.x + rect2.width / 2;\n\
         const cy = rect2.y + rect2.height / 2;\n\
         const atPoint = (cx >= 0 && cy >= 0 && cx <= window.innerWidth && cy <= window.innerHeight)\n\
           ? document.elementFromPoint(cx, cy) : el;\n\
         const notCovered = !atPoint || atPoint === el || el.contains(atPoint) || atPoint.contains(el);\n\
         const tag = el.tagName ? el.tagName.toLowerCase() : '';\n\
         const editableTags = tag === 'input' || tag === 'textarea';\n\
         const editable = (editableTags && !el.disabled && !el.readOnly) || el.isContentEditable === true;\n\
         const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';\n\
         return {{\n\
           stale: false,\n\
           visible: window.__cdpIsVisible(el),\n\
           enabled,\n\
           editable,\n\
           stable,\n\
           notCovered,\n\
           pointerEventsOn,\n\
           coveredBy: notCovered ? null : (window.__cdpRole ? window.__cdpRole(atPoint) : atPoint.tagName),\n\
         }};",
        js_ref = handle.js_ref(),
    );

    let expression = wrap(&body);
    let value = page.evaluate_in_frame(&handle.frame, &expression).await?;

    let stale = value.get("stale").and_then(|v| v.as_bool()).unwrap_or(true);
    if stale {
        return Ok(ActionabilityReport {
            stale: true,
            ..Default::default()
        });
    }

    Ok(ActionabilityReport {
        stale: false,
        visible: value.get("visible").and_then(|v| v.as_bool()).unwrap_or(false),
        enabled: value.get("enabled").and_then(|v| v.as_bool()).unwrap_or(false),
        editable: value.get("editable").and_then(|v| v.as_bool()).unwrap_or(false),
        stable: value.get("stable").and_then(|v| v.as_bool()).unwrap_or(false),
        not_covered: value.get("notCovered").and_then(|v| v.as_bool()).unwrap_or(false),
        pointer_events_on: value.get("pointerEventsOn").and_then(|v| v.as_bool()).unwrap_or(false),
        covered_by: value.get("coveredBy").and_then(|v| v.as_str()).map(|s| s.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_requires_editable_only_when_asked() {
        let report = ActionabilityReport {
            stale: false,
            visible: true,
            enabled: true,
            editable: false,
            stable: true,
            not_covered: true,
            pointer_events_on: true,
            covered_by: None,
        };
        assert!(report.passes(false));
        assert!(!report.passes(true));
    }

    #[test]
    fn first_failing_reason_reports_cover() {
        let report = ActionabilityReport {
            stale: false,
            visible: true,
            enabled: true,
            editable: true,
            stable: true,
            not_covered: false,
            pointer_events_on: true,
            covered_by: Some("dialog".to_string()),
        };
        assert_eq!(report.first_failing_reason(false), "covered by dialog");
    }

    #[test]
    fn stale_report_fails_everything() {
        let report = ActionabilityReport::default();
        assert!(report.stale);
        assert!(!report.passes(false));
        assert_eq!(report.first_failing_reason(false), "stale");
    }
}
