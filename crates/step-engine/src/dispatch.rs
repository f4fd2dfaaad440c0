//! Step Executors (C10): one function per step kind (§4.10), each a thin
//! wrapper over `step-primitives`, `element-locator`, `accessibility-snapshot`
//! or a direct CDP/JS call for kinds none of those crates cover.

use std::sync::Arc;
use std::time::Duration;

use accessibility_snapshot::{SnapshotOptions, SnapshotOutput};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cdp_transport::Transport;
use core_types::{FrameId, Locator};
use element_locator::js::wrap;
use input_emulator::{InputEmulator, Os};
use page_controller::{NavigateOptions, PageController, WaitUntil};
use serde_json::{json, Value};

use crate::console::ConsoleCapture;
use crate::error::StepError;
use crate::pdf_sink::PdfSink;
use crate::ready;
use crate::site_profile::SiteProfileStore;
use crate::tabs::TabManager;

pub struct ExecCtx<'a> {
    pub tabs: &'a TabManager,
    pub transport: Arc<Transport>,
    pub console: Option<&'a ConsoleCapture>,
    pub site_profiles: &'a dyn SiteProfileStore,
    pub pdf_sink: &'a dyn PdfSink,
    pub alias: &'a str,
    pub os: Os,
}

/// Side effects a step may have that the runner needs to react to, beyond
/// its JSON output: a newly active tab, or a hint that navigation occurred.
#[derive(Default)]
pub struct StepExtras {
    pub new_tab: Option<(core_types::TabAlias, Arc<PageController>)>,
    pub navigated: bool,
}

fn str_field(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Reads a locator either from a nested `{key: <locator>}` field (used when
/// a step also carries options alongside it, e.g. `{"button":"right", "locator": "#go"}`)
/// or, when no such field is present, by parsing the whole params value as
/// the locator itself — the shorthand the bare-ref form (`{"click":"f0s1e1"}`) relies on.
fn locator_field(params: &Value, key: &str) -> Result<Locator, StepError> {
    if let Some(nested) = params.get(key) {
        return serde_json::from_value(nested.clone())
            .map_err(|e| StepError::Validation(format!("invalid locator at {key:?}: {e}")));
    }
    serde_json::from_value(params.clone())
        .map_err(|_| StepError::Validation(format!("missing or invalid locator ({key})")))
}

fn wait_until_field(params: &Value) -> WaitUntil {
    match params.get("waitUntil").and_then(|v| v.as_str()) {
        Some("commit") => WaitUntil::Commit,
        Some("domContentLoaded") | Some("dom") => WaitUntil::DomContentLoaded,
        Some("networkIdle") => WaitUntil::NetworkIdle,
        _ => WaitUntil::Load,
    }
}

fn modifiers_mask(params: &Value) -> i32 {
    params
        .get("modifiers")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m.as_str())
                .filter_map(input_emulator::keys::modifier_bit)
                .fold(0, |acc, bit| acc | bit)
        })
        .unwrap_or(0)
}

async fn context_snippet(page: &PageController, frame: &FrameId) -> Result<Value, StepError> {
    let body = "return { url: location.href, title: document.title };";
    Ok(page.evaluate_in_frame(frame, &wrap(body)).await?)
}

pub async fn execute(
    kind: &str,
    params: &Value,
    page: &Arc<PageController>,
    frame: &FrameId,
    ctx: &ExecCtx<'_>,
    default_timeout: Duration,
) -> Result<(Value, StepExtras), StepError> {
    let extras = StepExtras::default();

    let output = match kind {
        "chromeStatus" => {
            let tabs = ctx.tabs.list_tabs().await?;
            json!({ "running": true, "tabs": tabs })
        }

        "newTab" | "openTab" => {
            let url = str_field(params, "url");
            let (alias, controller) = ctx.tabs.new_tab(url.as_deref()).await?;
            let main = controller.main_frame().await.unwrap_or_else(|| frame.clone());
            let context = context_snippet(&controller, &main).await?;
            let snapshot = accessibility_snapshot::take_snapshot(&controller, &main, &SnapshotOptions { detail: accessibility_snapshot::DetailLevel::Summary, ..Default::default() })
                .await
                .ok();
            let output = json!({
                "alias": alias.0,
                "context": context,
                "snapshot": snapshot.and_then(|s| match s {
                    SnapshotOutput::Inline(s) => Some(s.text),
                    _ => None,
                }),
            });
            return Ok((
                output,
                StepExtras { new_tab: Some((alias, controller)), navigated: true },
            ));
        }

        "switchTab" | "connectTab" => {
            let (alias, controller) = if let Some(alias) = str_field(params, "alias") {
                let controller = ctx.tabs.switch_tab(&alias).await?;
                (core_types::TabAlias(alias), controller)
            } else if let Some(target_id) = str_field(params, "targetId") {
                ctx.tabs.connect_tab(&target_id).await?
            } else {
                return Err(StepError::Validation("switchTab/connectTab needs alias or targetId".to_string()));
            };
            let main = controller.main_frame().await.unwrap_or_else(|| frame.clone());
            let context = context_snippet(&controller, &main).await?;
            return Ok((json!({ "context": context }), StepExtras { new_tab: Some((alias, controller)), navigated: false }));
        }

        "closeTab" => {
            let alias = str_field(params, "alias").ok_or_else(|| StepError::Validation("closeTab needs alias".to_string()))?;
            let closed = ctx.tabs.close_tab(&alias).await?;
            json!({ "closed": closed })
        }

        "listTabs" => {
            let list = ctx.tabs.list_tabs().await?;
            json!({ "count": list.len(), "list": list })
        }

        "goto" => {
            let url = str_field(params, "url").ok_or_else(|| StepError::Validation("goto needs url".to_string()))?;
            let opts = NavigateOptions { wait_until: wait_until_field(params), timeout: default_timeout, ..Default::default() };
            page.navigate(&url, opts).await?;
            let main = page.main_frame().await.unwrap_or_else(|| frame.clone());
            let context = context_snippet(page, &main).await?;
            return Ok((json!({ "context": context }), StepExtras { navigated: true, ..Default::default() }));
        }

        "reload" => {
            page.reload(params.get("ignoreCache").and_then(|v| v.as_bool()).unwrap_or(false)).await?;
            context_snippet(page, frame).await?
        }

        "back" | "forward" => {
            let result = if kind == "back" { page.back().await } else { page.forward().await };
            match result {
                Ok(()) => context_snippet(page, frame).await?,
                Err(page_controller::PageError::NavigationFailed(_)) => json!({ "noHistory": true }),
                Err(other) => return Err(other.into()),
            }
        }

        "waitForNavigation" => {
            let deadline = default_timeout;
            let predicate = match wait_until_field(params) {
                WaitUntil::Commit | WaitUntil::DomContentLoaded => "() => document.readyState !== 'loading'",
                _ => "() => document.readyState === 'complete'",
            };
            ready::poll_until_truthy(page, frame, predicate, deadline).await?;
            json!({ "navigated": true })
        }

        "click" => {
            let locator = locator_field(params, "locator")?;
            let opts = step_primitives::ClickOptions {
                button: str_field(params, "button").unwrap_or_else(|| "left".to_string()),
                click_count: params.get("clickCount").and_then(|v| v.as_i64()).unwrap_or(1),
                modifiers: modifiers_mask(params),
                js_click: params.get("jsClick").and_then(|v| v.as_bool()).unwrap_or(false),
                native_only: params.get("nativeOnly").and_then(|v| v.as_bool()).unwrap_or(false),
                force: params.get("force").and_then(|v| v.as_bool()).unwrap_or(false),
            };
            let input = InputEmulator::new(ctx.transport.clone(), page.session().clone(), ctx.os);
            let outcome = step_primitives::click(page, &input, frame, &locator, &opts).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "fill" => {
            let locator = locator_field(params, "locator")?;
            let value = str_field(params, "value").unwrap_or_default();
            let opts = step_primitives::FillOptions {
                select_all: params.get("selectAll").and_then(|v| v.as_bool()).unwrap_or(true),
                react: params.get("react").and_then(|v| v.as_bool()).unwrap_or(false),
                force: params.get("force").and_then(|v| v.as_bool()).unwrap_or(false),
            };
            let outcome = step_primitives::fill(page, frame, &locator, &value, &opts).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "press" => {
            let key = str_field(params, "key").ok_or_else(|| StepError::Validation("press needs key".to_string()))?;
            let input = InputEmulator::new(ctx.transport.clone(), page.session().clone(), ctx.os);
            input.press(&key).await?;
            Value::Null
        }

        "pressCombo" => {
            let combo = str_field(params, "combo").ok_or_else(|| StepError::Validation("pressCombo needs combo".to_string()))?;
            let input = InputEmulator::new(ctx.transport.clone(), page.session().clone(), ctx.os);
            input.press_combo(&combo).await?;
            Value::Null
        }

        "hover" => {
            let locator = locator_field(params, "locator")?;
            let input = InputEmulator::new(ctx.transport.clone(), page.session().clone(), ctx.os);
            let opts = step_primitives::HoverOptions {
                force: params.get("force").and_then(|v| v.as_bool()).unwrap_or(false),
                capture: str_field(params, "capture"),
            };
            let outcome = step_primitives::hover(page, &input, frame, &locator, &opts).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "drag" => {
            let source = locator_field(params, "source")?;
            let target = locator_field(params, "target")?;
            let input = InputEmulator::new(ctx.transport.clone(), page.session().clone(), ctx.os);
            let opts = step_primitives::DragOptions {
                method: match params.get("method").and_then(|v| v.as_str()) {
                    Some("html5") => step_primitives::DragMethod::Html5,
                    Some("range-input") | Some("rangeInput") => step_primitives::DragMethod::RangeInput,
                    Some("mouse") => step_primitives::DragMethod::Mouse,
                    _ => step_primitives::DragMethod::Auto,
                },
                steps: params.get("steps").and_then(|v| v.as_u64()).unwrap_or(10) as u32,
                delay: Duration::from_millis(params.get("delay").and_then(|v| v.as_u64()).unwrap_or(10)),
            };
            let outcome = step_primitives::drag(page, &input, frame, &source, &target, &opts).await?;
            let mut value = serde_json::to_value(outcome).unwrap_or(Value::Null);
            if let Value::Object(ref mut map) = value {
                map.insert("source".to_string(), json!(source.describe()));
                map.insert("target".to_string(), json!(target.describe()));
            }
            value
        }

        "selectOption" => {
            let locator = locator_field(params, "locator")?;
            let option = if let Some(values) = params.get("values").and_then(|v| v.as_array()) {
                step_primitives::OptionMatch::Values(values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            } else if let Some(index) = params.get("index").and_then(|v| v.as_u64()) {
                step_primitives::OptionMatch::Index(index as usize)
            } else if let Some(label) = str_field(params, "label") {
                step_primitives::OptionMatch::Label(label)
            } else {
                step_primitives::OptionMatch::Value(str_field(params, "value").ok_or_else(|| StepError::Validation("selectOption needs value/label/index/values".to_string()))?)
            };
            let outcome = step_primitives::select_option(page, frame, &locator, &option).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "scroll" => {
            let target = if let Some(s) = params.as_str() {
                scroll_target_from_str(s)?
            } else if let Some(s) = str_field(params, "to") {
                scroll_target_from_str(&s)?
            } else if let Some(selector) = str_field(params, "selector") {
                step_primitives::ScrollTarget::Selector(selector)
            } else if let (Some(x), Some(y)) = (params.get("x").and_then(|v| v.as_f64()), params.get("y").and_then(|v| v.as_f64())) {
                step_primitives::ScrollTarget::Absolute { x, y }
            } else if let Some(delta_y) = params.get("deltaY").and_then(|v| v.as_f64()) {
                step_primitives::ScrollTarget::Relative { delta_y }
            } else {
                return Err(StepError::Validation("scroll needs to/selector/{x,y}/{deltaY}".to_string()));
            };
            let outcome = step_primitives::scroll(page, frame, &target).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "wait" => {
            let deadline = params.get("ms").and_then(|v| v.as_u64()).map(Duration::from_millis).unwrap_or(default_timeout);
            if let Some(selector) = str_field(params, "selector") {
                let expr = format!("() => !!document.querySelector({:?})", selector);
                ready::poll_until_truthy(page, frame, &expr, deadline).await?;
            } else if let Some(text) = str_field(params, "text") {
                let expr = format!("() => (document.body.innerText || '').includes({:?})", text);
                ready::poll_until_truthy(page, frame, &expr, deadline).await?;
            } else if let Some(url_contains) = str_field(params, "urlContains") {
                let expr = format!("() => location.href.includes({:?})", url_contains);
                ready::poll_until_truthy(page, frame, &expr, deadline).await?;
            } else if let Some(ms) = params.get("ms").and_then(|v| v.as_u64()) {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            Value::Null
        }

        "sleep" => {
            let ms = params.as_u64().or_else(|| params.get("ms").and_then(|v| v.as_u64())).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Value::Null
        }

        "poll" => {
            let predicate = str_field(params, "predicate").ok_or_else(|| StepError::Validation("poll needs predicate".to_string()))?;
            let interval = Duration::from_millis(params.get("interval").and_then(|v| v.as_u64()).unwrap_or(200));
            let deadline = Duration::from_millis(params.get("timeout").and_then(|v| v.as_u64()).unwrap_or(default_timeout.as_millis() as u64));
            ready::poll_report(page, frame, &predicate, interval, deadline).await?
        }

        "snapshot" => {
            let options = snapshot_options_from_params(params);
            let result = accessibility_snapshot::take_snapshot(page, frame, &options).await?;
            snapshot_output_to_value(result)
        }

        "snapshotSearch" => {
            let options = SnapshotOptions { detail: accessibility_snapshot::DetailLevel::Full, ..Default::default() };
            let result = accessibility_snapshot::take_snapshot(page, frame, &options).await?;
            let nodes = match result {
                SnapshotOutput::Inline(s) | SnapshotOutput::TooLarge { snapshot: s, .. } => s.nodes,
                SnapshotOutput::Unchanged { .. } => Vec::new(),
            };
            let text_needle = str_field(params, "text").map(|s| s.to_lowercase());
            let role_needle = str_field(params, "role");
            let matches: Vec<Value> = nodes
                .into_iter()
                .filter(|n| {
                    let role_ok = role_needle.as_deref().map(|r| r == n.role).unwrap_or(true);
                    let text_ok = text_needle.as_deref().map(|t| n.name.to_lowercase().contains(t)).unwrap_or(true);
                    role_ok && text_ok
                })
                .map(|n| json!({ "ref": n.ref_id, "role": n.role, "name": n.name }))
                .collect();
            json!({ "matches": matches })
        }

        "query" | "queryAll" => {
            let all = kind == "queryAll";
            query_elements(page, frame, params, all).await?
        }

        "get" => get_element(page, frame, params).await?,
        "inspect" => inspect_counts(page, frame, params).await?,
        "extract" => extract_content(page, frame, params).await?,

        "elementsAt" | "refAt" | "elementsNear" => elements_at(page, frame, params, kind).await?,

        "frame" => {
            if let Some(sel) = str_field(params, "selector").or_else(|| str_field(params, "name")) {
                let target = page.switch_to_frame(&sel).await?;
                let node = page.frames().get(&target);
                json!({ "frameId": target.0, "url": node.map(|n| n.url).unwrap_or_default() })
            } else if params.get("top").and_then(|v| v.as_bool()).unwrap_or(false) || params.as_str() == Some("top") {
                let main = page.main_frame().await.unwrap_or_else(|| frame.clone());
                json!({ "frameId": main.0 })
            } else if let Some(index) = params.get("index").and_then(|v| v.as_u64()) {
                let target = page.switch_to_frame(&index.to_string()).await?;
                json!({ "frameId": target.0 })
            } else {
                json!({ "frameId": frame.0 })
            }
        }

        "viewport" => set_viewport(page, params).await?,
        "cookies" => cookies_op(page, params).await?,

        "console" => {
            let report = match ctx.console {
                Some(capture) => capture.since(0).await,
                None => crate::model::ConsoleReport::default(),
            };
            serde_json::to_value(report).unwrap_or(Value::Null)
        }

        "eval" | "pageFunction" => {
            let expr = str_field(params, "expression")
                .or_else(|| str_field(params, "fn"))
                .or_else(|| params.as_str().map(str::to_string))
                .ok_or_else(|| StepError::Validation("eval needs expression".to_string()))?;
            ready::evaluate_once(page, frame, &expr).await?
        }

        "pdf" => pdf_op(page, ctx, params).await?,

        "upload" => {
            let locator = locator_field(params, "locator")?;
            let files: Vec<String> = params
                .get("files")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            let outcome = step_primitives::upload(page, frame, &locator, &files).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "selectText" => {
            let locator = locator_field(params, "locator")?;
            let start = params.get("start").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            let end = params.get("end").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            let outcome = step_primitives::select_text(page, frame, &locator, start, end).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "submit" => {
            let locator = locator_field(params, "locator")?;
            let outcome = step_primitives::submit(page, frame, &locator).await?;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }

        "assert" => assert_op(page, frame, params).await?,

        "readSiteProfile" => {
            let domain = str_field(params, "domain").ok_or_else(|| StepError::Validation("readSiteProfile needs domain".to_string()))?;
            let content = ctx.site_profiles.read(&domain).await;
            json!({ "domain": domain, "content": content })
        }

        "writeSiteProfile" => {
            let domain = str_field(params, "domain").ok_or_else(|| StepError::Validation("writeSiteProfile needs domain".to_string()))?;
            let content = str_field(params, "content").unwrap_or_default();
            let path = ctx
                .site_profiles
                .write(&domain, &content)
                .await
                .map_err(StepError::Validation)?;
            json!({ "domain": domain, "path": path })
        }

        other => return Err(StepError::Validation(format!("unknown step kind: {other}"))),
    };

    Ok((output, extras))
}

fn scroll_target_from_str(s: &str) -> Result<step_primitives::ScrollTarget, StepError> {
    match s {
        "top" => Ok(step_primitives::ScrollTarget::Top),
        "bottom" => Ok(step_primitives::ScrollTarget::Bottom),
        other => Ok(step_primitives::ScrollTarget::Selector(other.to_string())),
    }
}

fn snapshot_options_from_params(params: &Value) -> SnapshotOptions {
    SnapshotOptions {
        detail: match params.get("detail").and_then(|v| v.as_str()) {
            Some("summary") => accessibility_snapshot::DetailLevel::Summary,
            Some("interactive") => accessibility_snapshot::DetailLevel::Interactive,
            _ => accessibility_snapshot::DetailLevel::Full,
        },
        pierce_shadow: params.get("pierceShadow").and_then(|v| v.as_bool()).unwrap_or(false),
        include_frames: params.get("includeFrames").and_then(|v| v.as_bool()).unwrap_or(false),
        viewport_only: params.get("viewportOnly").and_then(|v| v.as_bool()).unwrap_or(false),
        since: str_field(params, "since"),
        inline_limit: params.get("inlineLimit").and_then(|v| v.as_u64()).map(|n| n as usize),
    }
}

fn snapshot_output_to_value(output: SnapshotOutput) -> Value {
    match output {
        SnapshotOutput::Unchanged { snapshot_id } => json!({ "unchanged": true, "snapshotId": snapshot_id }),
        SnapshotOutput::Inline(s) => json!({ "yaml": s.text, "snapshotId": s.snapshot_id, "refs": s.nodes.iter().map(|n| &n.ref_id).collect::<Vec<_>>() }),
        SnapshotOutput::TooLarge { snapshot, byte_len } => json!({
            "yaml": snapshot.text,
            "snapshotId": snapshot.snapshot_id,
            "refs": snapshot.nodes.iter().map(|n| &n.ref_id).collect::<Vec<_>>(),
            "tooLarge": true,
            "byteLen": byte_len,
        }),
    }
}

async fn query_elements(page: &PageController, frame: &FrameId, params: &Value, all: bool) -> Result<Value, StepError> {
    let selector = str_field(params, "selector");
    let role = str_field(params, "role");
    let name = str_field(params, "name");

    let body = if let Some(selector) = selector {
        format!(
            "const sel = {sel};\n\
             const els = Array.from(document.querySelectorAll(sel));\n\
             return els.map((el) => ({{ role: window.__cdpRole(el), name: window.__cdpAccessibleName(el), visible: window.__cdpIsVisible(el) }}));",
            sel = serde_json::to_string(&selector).unwrap_or_default(),
        )
    } else {
        let role_json = serde_json::to_string(&role).unwrap_or_else(|_| "null".to_string());
        let name_json = serde_json::to_string(&name).unwrap_or_else(|_| "null".to_string());
        format!(
            "const wantRole = {role_json};\n\
             const wantName = {name_json};\n\
             const els = Array.from(document.querySelectorAll('*')).filter((el) => {{\n\
               if (wantRole != null && window.__cdpRole(el) !== wantRole) return false;\n\
               if (wantName != null && !window.__cdpAccessibleName(el).toLowerCase().includes(String(wantName).toLowerCase())) return false;\n\
               return wantRole != null || wantName != null;\n\
             }});\n\
             return els.map((el) => ({{ role: window.__cdpRole(el), name: window.__cdpAccessibleName(el), visible: window.__cdpIsVisible(el) }}));",
        )
    };

    let value = page.evaluate_in_frame(frame, &wrap(&body)).await?;
    let results = value.as_array().cloned().unwrap_or_default();
    if all {
        Ok(json!({ "results": results }))
    } else {
        Ok(json!({ "result": results.into_iter().next() }))
    }
}

async fn get_element(page: &PageController, frame: &FrameId, params: &Value) -> Result<Value, StepError> {
    let locator = locator_field(params, "locator")?;
    let mode = str_field(params, "mode").unwrap_or_else(|| "text".to_string());
    let handle = element_locator::resolve(page, frame, &locator, element_locator::ResolveOptions::default()).await?;
    let body = match mode.as_str() {
        "html" => format!("const el = {r}; return el ? el.outerHTML : null;", r = handle.js_ref()),
        "value" => format!("const el = {r}; return el ? el.value : null;", r = handle.js_ref()),
        "box" => format!("const el = {r}; if (!el) return null; const r2 = el.getBoundingClientRect(); return {{ x: r2.x, y: r2.y, width: r2.width, height: r2.height }};", r = handle.js_ref()),
        "attributes" => format!(
            "const el = {r}; if (!el) return null; const out = {{}}; for (const a of el.attributes) out[a.name] = a.value; return out;",
            r = handle.js_ref()
        ),
        _ => format!("const el = {r}; return el ? (el.innerText || el.textContent || '').trim() : null;", r = handle.js_ref()),
    };
    page.evaluate_in_frame(&handle.frame, &wrap(&body)).await.map_err(StepError::from)
}

async fn inspect_counts(page: &PageController, frame: &FrameId, params: &Value) -> Result<Value, StepError> {
    let selectors: Vec<String> = params
        .get("selectors")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_else(|| vec!["body *".to_string()]);
    let list = serde_json::to_string(&selectors).unwrap_or_else(|_| "[]".to_string());
    let body = format!(
        "const selectors = {list};\n\
         const out = {{}};\n\
         for (const sel of selectors) {{ try {{ out[sel] = document.querySelectorAll(sel).length; }} catch (e) {{ out[sel] = null; }} }}\n\
         return out;",
    );
    page.evaluate_in_frame(frame, &wrap(&body)).await.map_err(StepError::from)
}

async fn extract_content(page: &PageController, frame: &FrameId, params: &Value) -> Result<Value, StepError> {
    let selector = str_field(params, "selector").ok_or_else(|| StepError::Validation("extract needs selector".to_string()))?;
    let kind = str_field(params, "type").unwrap_or_else(|| "text".to_string());
    let sel_json = serde_json::to_string(&selector).unwrap_or_default();
    let body = match kind.as_str() {
        "table" => format!(
            "const table = document.querySelector({sel_json});\n\
             if (!table) return null;\n\
             const rows = Array.from(table.querySelectorAll('tr'));\n\
             return rows.map((tr) => Array.from(tr.querySelectorAll('td,th')).map((c) => (c.innerText || '').trim()));",
        ),
        "list" => format!(
            "const container = document.querySelector({sel_json});\n\
             if (!container) return [];\n\
             return Array.from(container.querySelectorAll('li')).map((li) => (li.innerText || '').trim());",
        ),
        _ => format!(
            "const el = document.querySelector({sel_json});\n\
             return el ? (el.innerText || el.textContent || '').trim() : null;",
        ),
    };
    page.evaluate_in_frame(frame, &wrap(&body)).await.map_err(StepError::from)
}

async fn elements_at(page: &PageController, frame: &FrameId, params: &Value, kind: &str) -> Result<Value, StepError> {
    let x = params.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let y = params.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let body = if kind == "elementsNear" {
        let radius = params.get("radius").and_then(|v| v.as_f64()).unwrap_or(50.0);
        format!(
            "const cx = {x}, cy = {y}, radius = {radius};\n\
             const all = Array.from(document.querySelectorAll('button,a,input,select,textarea,[role]'));\n\
             const near = all.filter((el) => {{\n\
               const r = el.getBoundingClientRect();\n\
               const dx = Math.max(r.left - cx, cx - r.right, 0);\n\
               const dy = Math.max(r.top - cy, cy - r.bottom, 0);\n\
               return Math.sqrt(dx * dx + dy * dy) <= radius;\n\
             }});\n\
             return near.map((el) => window.__cdpRegister(el));",
        )
    } else if kind == "refAt" {
        format!(
            "const els = document.elementsFromPoint({x}, {y});\n\
             return els.slice(0, 1).map((el) => window.__cdpRegister(el));",
        )
    } else {
        format!(
            "const els = document.elementsFromPoint({x}, {y});\n\
             return els.map((el) => window.__cdpRegister(el));",
        )
    };
    let value = page.evaluate_in_frame(frame, &wrap(&body)).await?;
    let ids = value.as_array().cloned().unwrap_or_default();
    if kind == "refAt" {
        Ok(json!({ "ref": ids.into_iter().next() }))
    } else {
        Ok(json!({ "refs": ids }))
    }
}

async fn set_viewport(page: &PageController, params: &Value) -> Result<Value, StepError> {
    let (width, height) = match params.get("preset").and_then(|v| v.as_str()) {
        Some("mobile") => (390.0, 844.0),
        Some("tablet") => (834.0, 1194.0),
        Some("desktop") => (1440.0, 900.0),
        _ => (
            params.get("width").and_then(|v| v.as_f64()).unwrap_or(1280.0),
            params.get("height").and_then(|v| v.as_f64()).unwrap_or(720.0),
        ),
    };
    page.send_raw(
        "Emulation.setDeviceMetricsOverride",
        json!({ "width": width as i64, "height": height as i64, "deviceScaleFactor": 1, "mobile": false }),
    )
    .await?;
    Ok(json!({ "width": width, "height": height }))
}

async fn cookies_op(page: &PageController, params: &Value) -> Result<Value, StepError> {
    let op = str_field(params, "op").unwrap_or_else(|| "get".to_string());
    match op.as_str() {
        "get" => {
            let result = page.send_raw("Network.getCookies", json!({})).await?;
            Ok(result.get("cookies").cloned().unwrap_or(Value::Array(vec![])))
        }
        "set" => {
            let cookie = params.get("cookie").cloned().unwrap_or(json!({}));
            page.send_raw("Network.setCookie", cookie).await?;
            Ok(json!({ "set": true }))
        }
        "delete" => {
            let name = str_field(params, "name").unwrap_or_default();
            let url = str_field(params, "url");
            let mut body = json!({ "name": name });
            if let Some(url) = url {
                body["url"] = json!(url);
            }
            page.send_raw("Network.deleteCookies", body).await?;
            Ok(json!({ "deleted": true }))
        }
        "clear" => {
            page.send_raw("Network.clearBrowserCookies", json!({})).await?;
            Ok(json!({ "cleared": true }))
        }
        other => Err(StepError::Validation(format!("unknown cookies op: {other}"))),
    }
}

async fn pdf_op(page: &PageController, ctx: &ExecCtx<'_>, params: &Value) -> Result<Value, StepError> {
    let landscape = params.get("landscape").and_then(|v| v.as_bool()).unwrap_or(false);
    let result = page.send_raw("Page.printToPDF", json!({ "landscape": landscape, "printBackground": true })).await?;
    let data = result.get("data").and_then(|v| v.as_str()).unwrap_or_default();
    let bytes = STANDARD.decode(data).unwrap_or_default();
    let requested_path = str_field(params, "path");
    let path = ctx
        .pdf_sink
        .write(ctx.alias, requested_path.as_deref(), &bytes)
        .await
        .map_err(StepError::Validation)?;
    Ok(json!({ "path": path, "bytes": bytes.len() }))
}

async fn assert_op(page: &PageController, frame: &FrameId, params: &Value) -> Result<Value, StepError> {
    let mut assertions = Vec::new();
    let mut all_passed = true;

    if let Some(expected_url) = str_field(params, "url") {
        let value = page.evaluate_in_frame(frame, &wrap("return location.href;")).await?;
        let actual = value.as_str().unwrap_or_default();
        let passed = actual.contains(&expected_url);
        all_passed &= passed;
        assertions.push(json!({ "kind": "url", "expected": expected_url, "actual": actual, "passed": passed }));
    }
    if let Some(expected_text) = str_field(params, "text") {
        let selector = str_field(params, "selector");
        let body = match &selector {
            Some(sel) => format!("const el = document.querySelector({:?}); return el ? (el.innerText || el.textContent || '').trim() : null;", sel),
            None => "return (document.body.innerText || '').trim();".to_string(),
        };
        let value = page.evaluate_in_frame(frame, &wrap(&body)).await?;
        let actual = value.as_str().unwrap_or_default();
        let passed = actual.contains(&expected_text);
        all_passed &= passed;
        assertions.push(json!({ "kind": "text", "expected": expected_text, "actual": actual, "passed": passed, "selector": selector }));
    }

    if assertions.is_empty() {
        return Err(StepError::Validation("assert needs url or text".to_string()));
    }
    if !all_passed {
        return Err(StepError::AssertionFailed(serde_json::to_string(&assertions).unwrap_or_default()));
    }
    Ok(json!({ "passed": true, "assertions": assertions }))
}
