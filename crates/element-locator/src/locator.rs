//! Locator resolution (C6): turns a `core_types::Locator` into a live
//! `ElementHandle`, trying each same-origin frame when `search_frames` is
//! set (§4.6/§4.12).

use core_types::{ElementRef, FrameId, Locator};
use page_controller::PageController;
use serde_json::Value;
use tracing::debug;

use crate::error::LocatorError;
use crate::handle::ElementHandle;
use crate::js::wrap;

#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveOptions {
    pub search_frames: bool,
}

pub async fn resolve(
    page: &PageController,
    start_frame: &FrameId,
    locator: &Locator,
    opts: ResolveOptions,
) -> Result<ElementHandle, LocatorError> {
    if let Locator::Selector(raw) = locator {
        if let Some(ref_) = ElementRef::parse(raw) {
            return match resolve_ref(page, &ref_).await {
                Err(LocatorError::Stale) => reresolve_from_metadata(page, &ref_).await,
                other => other,
            };
        }
    }

    let mut frames = vec![start_frame.clone()];
    if opts.search_frames {
        for candidate in page.frames().all_frame_ids() {
            if candidate != *start_frame {
                frames.push(candidate);
            }
        }
    }

    let mut last_err = LocatorError::NoMatch(locator.describe());
    for frame in &frames {
        match resolve_in_frame(page, frame, locator).await {
            Ok(handle) => return Ok(handle),
            Err(LocatorError::NoMatch(_)) => continue,
            Err(other) => {
                last_err = other;
                continue;
            }
        }
    }
    Err(last_err)
}

async fn resolve_in_frame(
    page: &PageController,
    frame: &FrameId,
    locator: &Locator,
) -> Result<ElementHandle, LocatorError> {
    let body = match locator {
        Locator::Selector(sel) => selector_body(sel),
        Locator::MultiSelector { selectors } => multi_selector_body(selectors),
        Locator::Text { text, exact, case_sensitive } => text_body(text, *exact, *case_sensitive),
        Locator::Role { role, name, name_exact, name_regex, .. } => {
            role_body(role, name.as_deref(), name_exact.unwrap_or(false), name_regex.as_deref())
        }
        Locator::Point { x, y } => point_body(*x, *y),
    };

    let expression = wrap(&body);
    let result = page
        .evaluate_in_frame(frame, &expression)
        .await
        .map_err(LocatorError::Page)?;

    parse_resolution(frame, locator, result)
}

/// C12 Ref Resolver: re-resolves a ref whose backing element went stale
/// (navigation, re-render) by falling back to the `{selector, role, name}`
/// descriptor the snapshotter recorded alongside the ref (§3 "Ref format").
pub async fn reresolve(page: &PageController, element_ref: &ElementRef) -> Result<ElementHandle, LocatorError> {
    match resolve_ref(page, element_ref).await {
        Err(LocatorError::Stale) => reresolve_from_metadata(page, element_ref).await,
        other => other,
    }
}

/// §4.12 steps 1-5: read the ref's stored `{selector, role, name}`
/// descriptor, requery the frame, and combine all three properties into one
/// filter. Adopts the result only when it uniquely determines a single
/// element; any other outcome (none, or still ambiguous) is *ref stale*.
async fn reresolve_from_metadata(page: &PageController, element_ref: &ElementRef) -> Result<ElementHandle, LocatorError> {
    let frame = page
        .switch_to_frame(&element_ref.frame)
        .await
        .map_err(LocatorError::Page)?;
    let ref_str = element_ref.to_string().replace('\'', "");
    let meta_body = format!(
        "const meta = window.__cdpSkillRefMeta && window.__cdpSkillRefMeta['{ref_str}'];\n\
         return meta || null;",
    );
    let meta = page
        .evaluate_in_frame(&frame, &wrap(&meta_body))
        .await
        .map_err(LocatorError::Page)?;

    if meta.is_null() {
        return Err(LocatorError::Stale);
    }
    let role = meta.get("role").and_then(|v| v.as_str()).filter(|r| !r.is_empty());
    let name = meta.get("name").and_then(|v| v.as_str()).filter(|n| !n.is_empty());
    let selector = meta.get("selector").and_then(|v| v.as_str()).filter(|s| !s.is_empty());
    if role.is_none() && selector.is_none() {
        return Err(LocatorError::Stale);
    }

    let body = reresolve_body(selector, role, name);
    let result = page
        .evaluate_in_frame(&frame, &wrap(&body))
        .await
        .map_err(LocatorError::Page)?;

    match result.get("status").and_then(|v| v.as_str()) {
        Some("ok") => {
            let handle_id = result
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LocatorError::Invalid("missing handle id".to_string()))?
                .to_string();
            debug!(target: "element-locator", %handle_id, ref = %ref_str, "re-resolved stale ref from metadata");
            Ok(ElementHandle {
                frame,
                handle_id,
                describe: element_ref.to_string(),
                re_resolved: true,
            })
        }
        _ => Err(LocatorError::Stale),
    }
}

/// Builds a single query combining the stored selector, role and accessible
/// name so the ref only re-resolves when the combination is unambiguous.
fn reresolve_body(selector: Option<&str>, role: Option<&str>, name: Option<&str>) -> String {
    let selector_json = serde_json::to_string(&selector).unwrap_or_else(|_| "null".to_string());
    let role_json = serde_json::to_string(&role).unwrap_or_else(|_| "null".to_string());
    let name_json = serde_json::to_string(&name).unwrap_or_else(|_| "null".to_string());
    format!(
        "const wantSelector = {selector_json};\n\
         const wantRole = {role_json};\n\
         const wantName = {name_json};\n\
         let candidates;\n\
         if (wantSelector != null) {{\n\
           try {{ candidates = Array.from(document.querySelectorAll(wantSelector)); }} catch (e) {{ candidates = []; }}\n\
         }} else {{\n\
           candidates = Array.from(document.querySelectorAll('*'));\n\
         }}\n\
         const matches = candidates.filter((el) => {{\n\
           if (wantRole != null && window.__cdpRole(el) !== wantRole) return false;\n\
           if (wantName != null && window.__cdpAccessibleName(el) !== wantName) return false;\n\
           return true;\n\
         }});\n\
         if (matches.length === 0) return {{ status: 'none' }};\n\
         if (matches.length > 1) return {{ status: 'ambiguous', count: matches.length }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(matches[0]) }};",
    )
}

async fn resolve_ref(page: &PageController, element_ref: &ElementRef) -> Result<ElementHandle, LocatorError> {
    let frame = page
        .switch_to_frame(&element_ref.frame)
        .await
        .map_err(LocatorError::Page)?;
    let ref_str = element_ref.to_string().replace('\'', "");
    let body = format!(
        "const el = window.__cdpSkillRefs && window.__cdpSkillRefs['{ref_str}'];\n\
         if (!el || !document.contains(el)) return {{ status: 'stale' }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(el) }};",
    );
    let expression = wrap(&body);
    let result = page
        .evaluate_in_frame(&frame, &expression)
        .await
        .map_err(LocatorError::Page)?;

    match result.get("status").and_then(|v| v.as_str()) {
        Some("ok") => {
            let handle_id = result
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LocatorError::Invalid("missing handle id".to_string()))?
                .to_string();
            Ok(ElementHandle {
                frame,
                handle_id,
                describe: element_ref.to_string(),
                re_resolved: false,
            })
        }
        _ => Err(LocatorError::Stale),
    }
}

fn selector_body(selector: &str) -> String {
    format!(
        "const sel = {sel};\n\
         const el = document.querySelector(sel);\n\
         if (!el) return {{ status: 'none' }};\n\
         if (document.querySelectorAll(sel).length > 1) return {{ status: 'ambiguous', count: document.querySelectorAll(sel).length }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(el) }};",
        sel = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string()),
    )
}

fn multi_selector_body(selectors: &[String]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        "const selectors = {list};\n\
         for (const sel of selectors) {{\n\
           try {{\n\
             const el = document.querySelector(sel);\n\
             if (el) return {{ status: 'ok', id: window.__cdpRegister(el) }};\n\
           }} catch (e) {{}}\n\
         }}\n\
         return {{ status: 'none' }};"
    )
}

fn text_body(text: &str, exact: bool, case_sensitive: bool) -> String {
    let needle = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "const needle = {needle};\n\
         const exact = {exact};\n\
         const caseSensitive = {case_sensitive};\n\
         const norm = (s) => caseSensitive ? s : s.toLowerCase();\n\
         const target = norm(needle);\n\
         const all = Array.from(document.querySelectorAll('body *'));\n\
         const matches = all.filter((el) => {{\n\
           if (el.children.length > 0 && el.textContent.trim().length > (el.innerText || '').length + 200) return false;\n\
           const t = norm((el.textContent || '').trim());\n\
           return exact ? t === target : t.includes(target);\n\
         }});\n\
         const leaf = matches.filter((el) => !matches.some((other) => other !== el && el.contains(other)));\n\
         if (leaf.length === 0) return {{ status: 'none' }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(leaf[0]) }};",
    )
}

fn role_body(role: &str, name: Option<&str>, name_exact: bool, name_regex: Option<&str>) -> String {
    let role_json = serde_json::to_string(role).unwrap_or_else(|_| "\"\"".to_string());
    let name_json = serde_json::to_string(&name).unwrap_or_else(|_| "null".to_string());
    let regex_json = serde_json::to_string(&name_regex).unwrap_or_else(|_| "null".to_string());
    format!(
        "const wantRole = {role_json};\n\
         const wantName = {name_json};\n\
         const wantRegex = {regex_json};\n\
         const nameExact = {name_exact};\n\
         const all = Array.from(document.querySelectorAll('*'));\n\
         const matches = all.filter((el) => {{\n\
           if (window.__cdpRole(el) !== wantRole) return false;\n\
           if (wantName == null && wantRegex == null) return true;\n\
           const accName = window.__cdpAccessibleName(el);\n\
           if (wantRegex != null) {{\n\
             try {{ return new RegExp(wantRegex).test(accName); }} catch (e) {{ return false; }}\n\
           }}\n\
           return nameExact ? accName === wantName : accName.toLowerCase().includes(String(wantName).toLowerCase());\n\
         }});\n\
         if (matches.length === 0) return {{ status: 'none' }};\n\
         if (matches.length > 1) return {{ status: 'ambiguous', count: matches.length, id: window.__cdpRegister(matches[0]) }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(matches[0]) }};",
    )
}

fn point_body(x: f64, y: f64) -> String {
    format!(
        "const el = document.elementFromPoint({x}, {y});\n\
         if (!el) return {{ status: 'none' }};\n\
         return {{ status: 'ok', id: window.__cdpRegister(el) }};",
    )
}

fn parse_resolution(frame: &FrameId, locator: &Locator, result: Value) -> Result<ElementHandle, LocatorError> {
    match result.get("status").and_then(|v| v.as_str()) {
        Some("ok") => {
            let handle_id = result
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LocatorError::Invalid("missing handle id".to_string()))?
                .to_string();
            debug!(target: "element-locator", %handle_id, locator = %locator.describe(), "resolved");
            Ok(ElementHandle {
                frame: frame.clone(),
                handle_id,
                describe: locator.describe(),
                re_resolved: false,
            })
        }
        Some("ambiguous") => {
            let count = result.get("count").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            // A role locator tolerates ambiguity by taking the first match;
            // a bare selector does not, since the caller asked for one node.
            if matches!(locator, Locator::Role { .. }) {
                let handle_id = result
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| LocatorError::Invalid("missing handle id".to_string()))?
                    .to_string();
                Ok(ElementHandle {
                    frame: frame.clone(),
                    handle_id,
                    describe: locator.describe(),
                    re_resolved: false,
                })
            } else {
                Err(LocatorError::Ambiguous(locator.describe(), count))
            }
        }
        Some("stale") => Err(LocatorError::Stale),
        _ => Err(LocatorError::NoMatch(locator.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_body_embeds_escaped_selector() {
        let body = selector_body("#a\"b");
        assert!(body.contains("querySelector"));
        assert!(body.contains("\\\""));
    }

    #[test]
    fn role_body_includes_regex_branch() {
        let body = role_body("button", None, false, Some("^Go$"));
        assert!(body.contains("new RegExp"));
    }

    #[test]
    fn parse_resolution_accepts_ok() {
        let frame = FrameId("f0".to_string());
        let locator = Locator::Selector("#a".to_string());
        let result = serde_json::json!({ "status": "ok", "id": "h1" });
        let handle = parse_resolution(&frame, &locator, result).unwrap();
        assert_eq!(handle.handle_id, "h1");
    }

    #[test]
    fn parse_resolution_rejects_ambiguous_selector() {
        let frame = FrameId("f0".to_string());
        let locator = Locator::Selector(".row".to_string());
        let result = serde_json::json!({ "status": "ambiguous", "count": 3 });
        let err = parse_resolution(&frame, &locator, result).unwrap_err();
        assert!(matches!(err, LocatorError::Ambiguous(_, 3)));
    }

    #[test]
    fn element_ref_round_trips_through_display() {
        let r = ElementRef { frame: "0".to_string(), snapshot: 3, element: 12 };
        assert_eq!(r.to_string(), "f0s3e12");
    }

    #[test]
    fn reresolve_body_combines_selector_role_and_name_in_one_filter() {
        let body = reresolve_body(Some("#submit"), Some("button"), Some("Send"));
        assert!(body.contains("querySelectorAll(wantSelector)"));
        assert!(body.contains("window.__cdpRole(el) !== wantRole"));
        assert!(body.contains("window.__cdpAccessibleName(el) !== wantName"));
        assert!(body.contains("status: 'ambiguous'"));
    }

    #[test]
    fn reresolve_body_falls_back_to_all_elements_without_a_selector() {
        let body = reresolve_body(None, Some("button"), None);
        assert!(body.contains("querySelectorAll('*')"));
    }
}
