//! Page Controller (C4): navigation state machine, frame tracking, and the
//! single background event pump every other method reads its state from.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cdp_transport::{CommandTarget, ListenerHandle, Transport};
use core_types::{ExecutionContextId, FrameId, SessionId};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PageError;
use crate::frame::FrameTree;
use crate::wait::{clamp_timeout, wait_for_condition, wait_for_quiet};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum WaitUntil {
    Commit,
    DomContentLoaded,
    #[default]
    Load,
    NetworkIdle,
}

#[derive(Clone, Debug)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
    pub network_idle_window: Duration,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::default(),
            timeout: clamp_timeout(None),
            network_idle_window: Duration::from_millis(500),
        }
    }
}

/// Mutable state touched by the background event pump and read by every
/// wait/navigate call. Kept behind a single lock rather than one DashMap per
/// field: every update here happens from one task (the pump), so contention
/// is reader-only.
#[derive(Default)]
struct NavState {
    lifecycle_seen: HashSet<String>,
    committed: bool,
    navigation_generation: u64,
    inflight_requests: u64,
    activity_counter: u64,
}

pub struct PageController {
    transport: Arc<Transport>,
    session: SessionId,
    frames: Arc<FrameTree>,
    main_frame: RwLock<Option<FrameId>>,
    state: Arc<RwLock<NavState>>,
    crashed: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    /// Generation number that was cancelled by an explicit `stop_loading()`
    /// rather than by a newer `navigate()` superseding it. `u64::MAX` is the
    /// "nothing has been explicitly stopped" sentinel, since real
    /// generations start at 1. Lets `wait_until`'s `check_supersede` tell the
    /// two abort reasons apart (spec §3: `aborted-superseded` vs
    /// `aborted-stopped`) instead of collapsing both onto one counter bump.
    stopped_generation: Arc<AtomicU64>,
    pump: Option<JoinHandle<()>>,
    listener_handles: Vec<ListenerHandle>,
}

impl PageController {
    pub fn new(transport: Arc<Transport>, session: SessionId) -> Self {
        Self {
            transport,
            session,
            frames: Arc::new(FrameTree::new()),
            main_frame: RwLock::new(None),
            state: Arc::new(RwLock::new(NavState::default())),
            crashed: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            stopped_generation: Arc::new(AtomicU64::new(u64::MAX)),
            pump: None,
            listener_handles: Vec::new(),
        }
    }

    fn target(&self) -> CommandTarget {
        CommandTarget::Session(self.session.0.clone())
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, PageError> {
        self.transport
            .send(self.target(), method, params)
            .await
            .map_err(PageError::from)
    }

    /// Enables the CDP domains the controller depends on and starts the
    /// background pump that keeps frame tree / lifecycle / crash state
    /// current. Idempotent only in the sense that calling it twice spawns a
    /// second pump; callers should call it exactly once per attached tab.
    pub async fn initialize(&mut self) -> Result<(), PageError> {
        self.send("Page.enable", json!({})).await?;
        self.send("Page.setLifecycleEventsEnabled", json!({ "enabled": true }))
            .await?;
        self.send("Network.enable", json!({})).await?;
        self.send("Runtime.enable", json!({})).await?;
        self.send("Inspector.enable", json!({})).await?;

        let registry = self.transport.listeners();
        let session_key = |method: &str| format!("{}:{method}", self.session.0);

        let subscriptions = [
            "Page.lifecycleEvent",
            "Page.frameAttached",
            "Page.frameDetached",
            "Page.frameNavigated",
            "Network.requestWillBeSent",
            "Network.loadingFinished",
            "Network.loadingFailed",
            "Runtime.executionContextCreated",
            "Runtime.executionContextDestroyed",
            "Runtime.executionContextsCleared",
            "Inspector.targetCrashed",
        ];

        let mut receivers = Vec::new();
        for method in subscriptions {
            let (rx, handle) = registry.on(session_key(method), 256);
            self.listener_handles.push(handle);
            receivers.push(rx);
        }

        let state = self.state.clone();
        let crashed = self.crashed.clone();
        let frames = self.frames.clone();

        let pump = tokio::spawn(async move {
            use futures::stream::{select_all, StreamExt};
            use tokio_stream::wrappers::ReceiverStream;

            let mut merged = select_all(receivers.into_iter().map(ReceiverStream::new));
            while let Some(event) = merged.next().await {
                handle_pump_event(&event.method, &event.params, &state, &crashed, &frames).await;
            }
            debug!(target: "page-controller", "event pump exited, registry dropped");
        });
        self.pump = Some(pump);

        Ok(())
    }

    pub async fn set_main_frame(&self, frame: FrameId) {
        *self.main_frame.write().await = Some(frame);
    }

    pub async fn navigate(&self, url: &str, opts: NavigateOptions) -> Result<(), PageError> {
        if self.crashed.load(Ordering::Relaxed) {
            return Err(PageError::Crashed);
        }

        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.lifecycle_seen.clear();
            state.committed = false;
            state.navigation_generation = my_generation;
        }

        let result = self
            .send(
                "Page.navigate",
                json!({ "url": url, "transitionType": "address_bar" }),
            )
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(PageError::NavigationFailed(error_text.to_string()));
        }
        if let Some(frame_id) = result.get("frameId").and_then(|v| v.as_str()) {
            self.set_main_frame(FrameId(frame_id.to_string())).await;
        }

        self.wait_until(opts.wait_until, opts.timeout, opts.network_idle_window, my_generation)
            .await
    }

    async fn wait_until(
        &self,
        wait_until: WaitUntil,
        timeout: Duration,
        idle_window: Duration,
        generation: u64,
    ) -> Result<(), PageError> {
        let check_supersede = || {
            if let Err(err) = supersede_error(
                self.generation.load(Ordering::SeqCst),
                self.stopped_generation.load(Ordering::SeqCst),
                generation,
            ) {
                return Err(err);
            }
            if self.crashed.load(Ordering::Relaxed) {
                return Err(PageError::Crashed);
            }
            Ok(())
        };

        match wait_until {
            WaitUntil::Commit => {
                wait_for_condition("navigation commit", timeout, || async {
                    check_supersede()?;
                    let state = self.state.read().await;
                    Ok(if state.committed { Some(()) } else { None })
                })
                .await
            }
            WaitUntil::DomContentLoaded => {
                wait_for_condition("DOMContentLoaded", timeout, || async {
                    check_supersede()?;
                    let state = self.state.read().await;
                    Ok(if state.lifecycle_seen.contains("DOMContentLoaded") {
                        Some(())
                    } else {
                        None
                    })
                })
                .await
            }
            WaitUntil::Load => {
                wait_for_condition("load", timeout, || async {
                    check_supersede()?;
                    let state = self.state.read().await;
                    Ok(if state.lifecycle_seen.contains("load") {
                        Some(())
                    } else {
                        None
                    })
                })
                .await
            }
            WaitUntil::NetworkIdle => {
                wait_for_condition("load before network idle", timeout, || async {
                    check_supersede()?;
                    let state = self.state.read().await;
                    Ok(if state.lifecycle_seen.contains("load") {
                        Some(())
                    } else {
                        None
                    })
                })
                .await?;

                let state = self.state.clone();
                wait_for_quiet("network idle", timeout, idle_window, move || {
                    let state = state.clone();
                    async move {
                        let s = state.read().await;
                        s.activity_counter.wrapping_add(s.inflight_requests)
                    }
                })
                .await
            }
        }
    }

    pub async fn reload(&self, ignore_cache: bool) -> Result<(), PageError> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.lifecycle_seen.clear();
            state.committed = false;
            state.navigation_generation = my_generation;
        }
        self.send("Page.reload", json!({ "ignoreCache": ignore_cache }))
            .await?;
        self.wait_until(WaitUntil::Load, clamp_timeout(None), Duration::from_millis(500), my_generation)
            .await
    }

    pub async fn back(&self) -> Result<(), PageError> {
        self.navigate_history(-1).await
    }

    pub async fn forward(&self) -> Result<(), PageError> {
        self.navigate_history(1).await
    }

    async fn navigate_history(&self, delta: i64) -> Result<(), PageError> {
        let history = self.send("Page.getNavigationHistory", json!({})).await?;
        let current = history
            .get("currentIndex")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| PageError::NavigationFailed("missing currentIndex".to_string()))?;
        let entries = history
            .get("entries")
            .and_then(|v| v.as_array())
            .ok_or_else(|| PageError::NavigationFailed("missing entries".to_string()))?;
        let target_index = current + delta;
        let entry = entries
            .get(target_index as usize)
            .ok_or_else(|| PageError::NavigationFailed("no such history entry".to_string()))?;
        let entry_id = entry
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| PageError::NavigationFailed("history entry missing id".to_string()))?;

        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.lifecycle_seen.clear();
            state.committed = false;
            state.navigation_generation = my_generation;
        }
        self.send("Page.navigateToHistoryEntry", json!({ "entryId": entry_id }))
            .await?;
        self.wait_until(WaitUntil::Load, clamp_timeout(None), Duration::from_millis(500), my_generation)
            .await
    }

    /// Always safe to call, even with no navigation in flight (spec §4.4).
    /// Cancels whatever generation is currently waiting with `PageError::Stopped`
    /// rather than `Superseded` — this is an explicit stop, not a new
    /// navigation superseding the old one.
    pub async fn stop_loading(&self) -> Result<(), PageError> {
        let current = self.generation.load(Ordering::SeqCst);
        self.stopped_generation.store(current, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.send("Page.stopLoading", json!({})).await?;
        Ok(())
    }

    pub fn frames(&self) -> &FrameTree {
        &self.frames
    }

    /// Escape hatch for step kinds that need a CDP method none of the
    /// navigation/frame/eval helpers above cover (cookies, PDF export,
    /// viewport emulation).
    pub async fn send_raw(&self, method: &str, params: Value) -> Result<Value, PageError> {
        self.send(method, params).await
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub async fn main_frame(&self) -> Option<FrameId> {
        self.main_frame.read().await.clone()
    }

    /// Resolves a frame by index/name path, used by the `frame` step kind.
    pub async fn switch_to_frame(&self, name_or_index: &str) -> Result<FrameId, PageError> {
        if let Some(id) = self.frames.find_by_name(name_or_index) {
            return Ok(id);
        }
        if let Ok(index) = name_or_index.parse::<usize>() {
            let main = self
                .main_frame()
                .await
                .ok_or_else(|| PageError::FrameNotFound(name_or_index.to_string()))?;
            if let Some(id) = self.frames.find_by_index(&main, index) {
                return Ok(id);
            }
        }
        Err(PageError::FrameNotFound(name_or_index.to_string()))
    }

    /// Evaluates `expression` in the isolated execution context attached to
    /// `frame`, creating one via `Page.createIsolatedWorld` on first use.
    pub async fn evaluate_in_frame(&self, frame: &FrameId, expression: &str) -> Result<Value, PageError> {
        if self.crashed.load(Ordering::Relaxed) {
            return Err(PageError::Crashed);
        }

        let ctx = match self.frames.execution_context(frame) {
            Some(ctx) => ctx,
            None => {
                let created = self
                    .send(
                        "Page.createIsolatedWorld",
                        json!({ "frameId": frame.0, "worldName": "cdp-skill" }),
                    )
                    .await?;
                let ctx_id = created
                    .get("executionContextId")
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| PageError::ContextDestroyed)?;
                let ctx = ExecutionContextId(ctx_id.to_string());
                self.frames.set_execution_context(frame, ctx.clone());
                ctx
            }
        };

        let result = self
            .send(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "contextId": ctx.0.parse::<i64>().unwrap_or_default(),
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or("evaluation failed");
            return Err(PageError::NavigationFailed(text.to_string()));
        }

        Ok(result
            .get("result")
            .and_then(|v| v.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Tells `aborted-superseded` apart from `aborted-stopped` (spec §3) for a
/// waiter that observes `current_generation != waited_generation`. An
/// explicit `stop_loading()` records the generation it cancelled in
/// `stopped_generation`; any other mismatch means a newer `navigate()` moved
/// the generation counter on instead.
fn supersede_error(current_generation: u64, stopped_generation: u64, waited_generation: u64) -> Result<(), PageError> {
    if current_generation == waited_generation {
        return Ok(());
    }
    if stopped_generation == waited_generation {
        Err(PageError::Stopped)
    } else {
        Err(PageError::Superseded)
    }
}

impl Drop for PageController {
    fn drop(&mut self) {
        if let Some(handle) = self.pump.take() {
            handle.abort();
        }
    }
}

async fn handle_pump_event(
    method: &str,
    params: &Value,
    state: &Arc<RwLock<NavState>>,
    crashed: &Arc<AtomicBool>,
    frames: &FrameTree,
) {
    match method {
        "Page.lifecycleEvent" => {
            if let Some(name) = params.get("name").and_then(|v| v.as_str()) {
                let mut s = state.write().await;
                if name == "commit" {
                    s.committed = true;
                }
                s.lifecycle_seen.insert(name.to_string());
            }
        }
        "Page.frameAttached" => {
            if let Some(frame_id) = params.get("frameId").and_then(|v| v.as_str()) {
                let parent = params
                    .get("parentFrameId")
                    .and_then(|v| v.as_str())
                    .map(|s| FrameId(s.to_string()));
                frames.upsert(FrameId(frame_id.to_string()), parent, String::new(), None);
            }
        }
        "Page.frameDetached" => {
            if let Some(frame_id) = params.get("frameId").and_then(|v| v.as_str()) {
                frames.remove(&FrameId(frame_id.to_string()));
            }
        }
        "Page.frameNavigated" => {
            if let Some(frame) = params.get("frame") {
                if let Some(frame_id) = frame.get("id").and_then(|v| v.as_str()) {
                    let parent = frame
                        .get("parentId")
                        .and_then(|v| v.as_str())
                        .map(|s| FrameId(s.to_string()));
                    let url = frame
                        .get("url")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let name = frame
                        .get("name")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    frames.upsert(FrameId(frame_id.to_string()), parent, url, name);
                }
            }
        }
        "Network.requestWillBeSent" => {
            let mut s = state.write().await;
            s.inflight_requests += 1;
            s.activity_counter = s.activity_counter.wrapping_add(1);
        }
        "Network.loadingFinished" | "Network.loadingFailed" => {
            let mut s = state.write().await;
            s.inflight_requests = s.inflight_requests.saturating_sub(1);
            s.activity_counter = s.activity_counter.wrapping_add(1);
        }
        "Runtime.executionContextCreated" => {
            if let Some(ctx) = params.get("context") {
                let ctx_id = ctx.get("id").and_then(|v| v.as_i64());
                let frame_id = ctx
                    .get("auxData")
                    .and_then(|a| a.get("frameId"))
                    .and_then(|v| v.as_str());
                if let (Some(ctx_id), Some(frame_id)) = (ctx_id, frame_id) {
                    frames.set_execution_context(
                        &FrameId(frame_id.to_string()),
                        ExecutionContextId(ctx_id.to_string()),
                    );
                }
            }
        }
        "Runtime.executionContextDestroyed" => {
            if let Some(ctx_id) = params.get("executionContextId").and_then(|v| v.as_i64()) {
                frames.clear_execution_context(&ExecutionContextId(ctx_id.to_string()));
            }
        }
        "Inspector.targetCrashed" => {
            warn!(target: "page-controller", "target crashed");
            crashed.store(true, Ordering::Relaxed);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersede_error_distinguishes_stop_from_new_navigation() {
        // Nothing moved the generation on: no error.
        assert!(supersede_error(3, u64::MAX, 3).is_ok());

        // Generation moved and the old one is the one stop_loading recorded.
        assert!(matches!(supersede_error(4, 3, 3), Err(PageError::Stopped)));

        // Generation moved but stop_loading was never called (or stopped a
        // different generation): a newer navigate() superseded this one.
        assert!(matches!(supersede_error(4, u64::MAX, 3), Err(PageError::Superseded)));
        assert!(matches!(supersede_error(4, 1, 3), Err(PageError::Superseded)));
    }

    #[test]
    fn default_navigate_options_wait_for_load() {
        let opts = NavigateOptions::default();
        assert_eq!(opts.wait_until, WaitUntil::Load);
        assert_eq!(opts.timeout, crate::wait::DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn pump_event_tracks_lifecycle_and_frames() {
        let state = Arc::new(RwLock::new(NavState::default()));
        let crashed = Arc::new(AtomicBool::new(false));
        let frames = FrameTree::new();

        handle_pump_event(
            "Page.lifecycleEvent",
            &json!({ "name": "load" }),
            &state,
            &crashed,
            &frames,
        )
        .await;
        assert!(state.read().await.lifecycle_seen.contains("load"));

        handle_pump_event(
            "Page.frameAttached",
            &json!({ "frameId": "f1", "parentFrameId": "f0" }),
            &state,
            &crashed,
            &frames,
        )
        .await;
        assert_eq!(
            frames.get(&FrameId("f1".to_string())).unwrap().parent,
            Some(FrameId("f0".to_string()))
        );

        handle_pump_event(
            "Inspector.targetCrashed",
            &Value::Null,
            &state,
            &crashed,
            &frames,
        )
        .await;
        assert!(crashed.load(Ordering::Relaxed));
    }
}
