//! Step Runner (C11): the 9-step pipeline of §4.11 wired over the tab
//! manager, console capture and the C10 executors.

use std::sync::Arc;
use std::time::Duration;

use accessibility_snapshot::{DetailLevel, SnapshotOptions, SnapshotOutput};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cdp_transport::Transport;
use core_types::{DriverError, FrameId, SessionId};
use input_emulator::Os;
use page_controller::PageController;
use serde_json::{json, Value};

use crate::console::ConsoleCapture;
use crate::context;
use crate::dispatch::{self, ExecCtx};
use crate::error::StepError;
use crate::model::{
    ActionRequired, Changes, CommandInput, CommandOutput, ConsoleReport, ErrorEntry, RawStep, StepResult, StepStatus,
};
use crate::pdf_sink::PdfSink;
use crate::ready;
use crate::screenshot::ScreenshotSink;
use crate::site_profile::SiteProfileStore;
use crate::snapshot_sink::SnapshotSink;
use crate::tabs::TabManager;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Step kinds that change what's painted, so the runner bothers taking a
/// before-snapshot for them (§4.11 step 3: "lazy: only if the first step is
/// a visual action").
const VISUAL_KINDS: &[&str] = &[
    "click", "fill", "hover", "drag", "scroll", "selectOption", "upload", "selectText", "submit", "press",
    "pressCombo", "goto", "newTab", "openTab", "reload", "back", "forward",
];

pub struct RunnerDeps {
    pub tabs: TabManager,
    pub transport: Arc<Transport>,
    pub site_profiles: Arc<dyn SiteProfileStore>,
    pub screenshots: Arc<dyn ScreenshotSink>,
    pub snapshots: Arc<dyn SnapshotSink>,
    pub pdf_sink: Arc<dyn PdfSink>,
    pub os: Os,
}

fn is_fatal(err: &StepError) -> bool {
    matches!(
        err,
        StepError::Transport(_)
            | StepError::Page(page_controller::PageError::Crashed)
            | StepError::Page(page_controller::PageError::Transport(_))
    )
}

/// Strips scheme and host, keeping only the path (no query/fragment) —
/// good enough for the "did the pathname change" check in step 7; the
/// crate has no `url` dependency so this stays a small manual parser.
fn pathname(url: &str) -> &str {
    let rest = url.splitn(2, "://").nth(1).unwrap_or(url);
    let path = rest.find('/').map(|i| &rest[i..]).unwrap_or("/");
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Host portion of a URL, stripped of userinfo and port — used to key the
/// site-profile store.
fn domain_of(url: &str) -> Option<String> {
    let rest = url.splitn(2, "://").nth(1)?;
    let host_port = rest.split('/').next()?;
    let host_port = host_port.rsplit('@').next()?;
    let host = host_port.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

struct ActiveTab {
    alias: String,
    page: Arc<PageController>,
    frame: FrameId,
}

async fn viewport_snapshot(page: &PageController, frame: &FrameId) -> Result<SnapshotOutput, StepError> {
    let options = SnapshotOptions { detail: DetailLevel::Full, viewport_only: true, ..Default::default() };
    Ok(accessibility_snapshot::take_snapshot(page, frame, &options).await?)
}

fn snapshot_nodes(output: &SnapshotOutput) -> Vec<accessibility_snapshot::AccessibilityNode> {
    match output {
        SnapshotOutput::Unchanged { .. } => Vec::new(),
        SnapshotOutput::Inline(s) | SnapshotOutput::TooLarge { snapshot: s, .. } => s.nodes.clone(),
    }
}

async fn capture_screenshot(page: &PageController, sink: &dyn ScreenshotSink, alias: &str, phase: &str) -> Option<String> {
    let shot = page.send_raw("Page.captureScreenshot", json!({ "format": "png" })).await.ok()?;
    let b64 = shot.get("data").and_then(|v| v.as_str())?;
    let bytes = STANDARD.decode(b64).ok()?;
    sink.write(alias, phase, &bytes).await.ok()
}

pub async fn run_command(deps: &RunnerDeps, input: CommandInput) -> Result<CommandOutput, StepError> {
    // Step 1: parse/validate every step up front; the whole command fails
    // before anything executes if any one of them is malformed.
    let mut raw_steps = Vec::with_capacity(input.steps.len());
    for value in &input.steps {
        let raw = RawStep::parse(value).map_err(StepError::Parse)?;
        raw_steps.push(raw);
    }

    let default_timeout = input.timeout.map(Duration::from_millis).unwrap_or(DEFAULT_TIMEOUT);

    // Step 2: resolve or open the tab. When `tab` is omitted, leave an inert
    // placeholder in place rather than eagerly minting a target — a leading
    // `newTab`/`openTab`/`connectTab` step (the common case) is the one that
    // actually opens it, so the alias that step mints (`t1`) ends up being
    // the command's tab, not a throwaway blank one opened ahead of it.
    let mut active = match &input.tab {
        Some(alias) => {
            let page = deps.tabs.switch_tab(alias).await?;
            let frame = page.main_frame().await.unwrap_or_else(|| FrameId(String::new()));
            ActiveTab { alias: alias.clone(), page, frame }
        }
        None => ActiveTab {
            alias: String::new(),
            page: Arc::new(PageController::new(deps.transport.clone(), SessionId(String::new()))),
            frame: FrameId(String::new()),
        },
    };

    let mut console = ConsoleCapture::attach(&deps.transport, &active.page);

    let initial_url = ready::evaluate_once(&active.page, &active.frame, "() => location.href")
        .await
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    // Step 3: lazy before-viewport-snapshot.
    let is_visual_command = matches!(raw_steps.first(), Some(first) if VISUAL_KINDS.contains(&first.kind.as_str()));
    let before_snapshot = if is_visual_command {
        viewport_snapshot(&active.page, &active.frame).await.ok()
    } else {
        None
    };
    if is_visual_command {
        let _ = capture_screenshot(&active.page, deps.screenshots.as_ref(), &active.alias, "before").await;
    }

    let mut step_results = Vec::with_capacity(raw_steps.len());
    let mut error_entries = Vec::new();
    let mut any_navigated = false;
    let mut stopped_early = false;

    for (index, raw) in raw_steps.iter().enumerate() {
        if stopped_early {
            step_results.push(StepResult {
                action: raw.kind.clone(),
                status: StepStatus::Skipped,
                output: None,
                params: None,
                error: None,
                observation: None,
                context: None,
            });
            continue;
        }

        let timeout = raw.hooks.timeout.unwrap_or(default_timeout);

        let result: Result<Value, StepError> = async {
            if let Some(ready_when) = &raw.hooks.ready_when {
                ready::poll_until_truthy(&active.page, &active.frame, ready_when, timeout).await?;
            }
            let ctx = ExecCtx {
                tabs: &deps.tabs,
                transport: deps.transport.clone(),
                console: Some(&console),
                site_profiles: deps.site_profiles.as_ref(),
                pdf_sink: deps.pdf_sink.as_ref(),
                alias: &active.alias,
                os: deps.os,
            };
            let (output, extras) = dispatch::execute(&raw.kind, &raw.params, &active.page, &active.frame, &ctx, timeout).await?;

            if let Some((alias, page)) = extras.new_tab {
                let frame = page.main_frame().await.unwrap_or_else(|| FrameId(String::new()));
                console = ConsoleCapture::attach(&deps.transport, &page);
                active = ActiveTab { alias: alias.0, page, frame };
            }
            if extras.navigated {
                any_navigated = true;
            }

            if let Some(settled_when) = &raw.hooks.settled_when {
                ready::poll_until_truthy(&active.page, &active.frame, settled_when, timeout).await?;
            }

            Ok(output)
        }
        .await;

        match result {
            Ok(output) => {
                let observation = match &raw.hooks.observe {
                    Some(expr) => ready::evaluate_once(&active.page, &active.frame, expr).await.ok(),
                    None => None,
                };
                step_results.push(StepResult {
                    action: raw.kind.clone(),
                    status: StepStatus::Ok,
                    output: Some(output),
                    params: Some(raw.params.clone()),
                    error: None,
                    observation,
                    context: None,
                });
            }
            Err(err) => {
                let driver_err: DriverError = err.clone().into();
                let error_value = serde_json::to_value(&driver_err).unwrap_or(Value::Null);

                let mut failure_context = context::assemble(&active.page, &active.frame).await.ok();
                if let Some(ctx) = failure_context.as_mut() {
                    let wanted = wanted_hint(&raw.params);
                    let _ = context::augment_failure(&active.page, &active.frame, ctx, wanted.as_deref()).await;
                }
                let context_value = failure_context.and_then(|c| serde_json::to_value(c).ok());

                let fatal = is_fatal(&err);
                if raw.hooks.optional && !fatal {
                    step_results.push(StepResult {
                        action: raw.kind.clone(),
                        status: StepStatus::Skipped,
                        output: None,
                        params: Some(raw.params.clone()),
                        error: Some(error_value),
                        observation: None,
                        context: context_value,
                    });
                } else {
                    step_results.push(StepResult {
                        action: raw.kind.clone(),
                        status: StepStatus::Error,
                        output: None,
                        params: Some(raw.params.clone()),
                        error: Some(error_value.clone()),
                        observation: None,
                        context: context_value,
                    });
                    error_entries.push(ErrorEntry { step: index, action: raw.kind.clone(), error: error_value });
                    stopped_early = true;
                }
            }
        }
    }

    // Step 6-7: after-viewport-snapshot, diff, command context.
    let after_snapshot = viewport_snapshot(&active.page, &active.frame).await.ok();
    let context_out = context::assemble(&active.page, &active.frame).await.unwrap_or_default();

    let changes = match (&before_snapshot, &after_snapshot) {
        (Some(before), Some(after)) => {
            let diff = accessibility_snapshot::viewport_diff(&snapshot_nodes(before), &snapshot_nodes(after));
            if diff.is_empty() {
                None
            } else {
                Some(Changes {
                    summary: format!("{} added, {} removed, {} changed", diff.added.len(), diff.removed.len(), diff.changed.len()),
                    added: diff.added.into_iter().map(Value::from).collect(),
                    removed: diff.removed.into_iter().map(Value::from).collect(),
                    changed: diff.changed.into_iter().map(Value::from).collect(),
                })
            }
        }
        _ => None,
    };

    let pathname_changed = !initial_url.is_empty() && pathname(&initial_url) != pathname(&context_out.url);
    let navigated = any_navigated || pathname_changed;

    // Step 8: screenshots, keyed by tab alias.
    let screenshot_path = capture_screenshot(&active.page, deps.screenshots.as_ref(), &active.alias, "after").await;

    // Step 8b: spill the after-snapshot to file when it overflowed the
    // inline limit.
    let mut full_snapshot_path = None;
    let viewport_snapshot_value = match after_snapshot {
        Some(SnapshotOutput::Inline(s)) => Some(json!(s.text)),
        Some(SnapshotOutput::TooLarge { snapshot, .. }) => {
            full_snapshot_path = deps.snapshots.write(&active.alias, &snapshot.text).await.ok();
            full_snapshot_path.clone().map(Value::from)
        }
        Some(SnapshotOutput::Unchanged { snapshot_id }) => Some(json!({ "unchanged": true, "snapshotId": snapshot_id })),
        None => None,
    };

    // Step 9: site-profile attachment / actionRequired.
    let mut site_profile = None;
    let mut action_required = None;
    if let Some(domain) = domain_of(&context_out.url) {
        match deps.site_profiles.read(&domain).await {
            Some(content) => site_profile = Some(content),
            None => {
                action_required = Some(ActionRequired {
                    action: "createSiteProfile".to_string(),
                    domain: domain.clone(),
                    message: format!("no site profile found for {domain}; consider recording one"),
                });
            }
        }
    }

    let console_report = console.since(0).await;
    let status: &'static str = if error_entries.is_empty() { "ok" } else { "error" };

    Ok(CommandOutput {
        status,
        tab: active.alias,
        site_profile,
        action_required,
        context: context_out,
        screenshot: screenshot_path,
        full_snapshot: full_snapshot_path,
        viewport_snapshot: viewport_snapshot_value,
        changes: if navigated { None } else { changes },
        navigated: if navigated { Some(true) } else { None },
        console: Some(console_report).filter(|c: &ConsoleReport| c.errors + c.warnings + c.messages.len() > 0),
        steps: step_results,
        errors: if error_entries.is_empty() { None } else { Some(error_entries) },
    })
}

/// Best-effort text to seed the failure-context fuzzy matcher with: the
/// locator string/selector/text a failed step was aiming at, whichever of
/// those fields happens to be present.
fn wanted_hint(params: &Value) -> Option<String> {
    if let Some(s) = params.as_str() {
        return Some(s.to_string());
    }
    for key in ["locator", "selector", "text", "name"] {
        if let Some(s) = params.get(key).and_then(|v| v.as_str()) {
            return Some(s.to_string());
        }
    }
    None
}
