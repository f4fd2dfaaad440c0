//! The websocket transport (C1): one connection to the browser, integer-id
//! command correlation, event dispatch (global and session-scoped), and
//! reconnection with exponential backoff + jitter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::target::SessionId as CdpSessionId;
use chromiumoxide::cdp::events::CdpEventMessage;
use chromiumoxide::conn::Connection;
use chromiumoxide::error::CdpError;
use chromiumoxide_types::{CallId, CdpJsonEventMessage, Message, MethodId, Response};
use futures::StreamExt;
use rand::Rng;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::listeners::ListenerRegistry;

#[derive(Clone, Debug)]
pub struct TransportEvent {
    pub method: String,
    pub params: Value,
    pub session_id: Option<String>,
}

#[derive(Clone, Debug)]
pub enum CommandTarget {
    Browser,
    Session(String),
}

struct ControlMessage {
    target: CommandTarget,
    method: String,
    params: Value,
    responder: oneshot::Sender<Result<Value, TransportError>>,
}

/// One live websocket connection plus its receive loop. Recreated by
/// `Transport::runtime` whenever the previous one has died.
struct RuntimeState {
    command_tx: mpsc::Sender<ControlMessage>,
    loop_task: JoinHandle<()>,
    alive: Arc<AtomicBool>,
}

impl RuntimeState {
    async fn start(
        cfg: &TransportConfig,
        listeners: Arc<ListenerRegistry>,
    ) -> Result<Self, TransportError> {
        let ws_url = resolve_ws_url(cfg).await?;

        let conn = Connection::<CdpEventMessage>::connect(&ws_url)
            .await
            .map_err(|err| TransportError::Io(err.to_string()))?;

        let (command_tx, command_rx) = mpsc::channel(256);
        let alive = Arc::new(AtomicBool::new(true));
        let loop_alive = alive.clone();

        let loop_task = tokio::spawn(async move {
            let result = run_loop(conn, command_rx, listeners).await;
            loop_alive.store(false, Ordering::Relaxed);
            if let Err(err) = result {
                error!(target: "cdp-transport", ?err, "receive loop terminated");
            }
        });

        info!(target: "cdp-transport", url = %ws_url, "cdp connection established");

        Ok(Self {
            command_tx,
            loop_task,
            alive,
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    async fn send(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
        deadline: Duration,
    ) -> Result<Value, TransportError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let message = ControlMessage {
            target,
            method: method.to_string(),
            params,
            responder: resp_tx,
        };

        self.command_tx
            .try_send(message)
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    TransportError::Io("command channel closed".to_string())
                }
            })?;

        match tokio::time::timeout(deadline, resp_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Io("response channel closed".to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

impl Drop for RuntimeState {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
        self.loop_task.abort();
    }
}

async fn resolve_ws_url(cfg: &TransportConfig) -> Result<String, TransportError> {
    #[derive(serde::Deserialize)]
    struct VersionInfo {
        #[serde(rename = "webSocketDebuggerUrl")]
        web_socket_debugger_url: String,
    }

    let resp = reqwest::get(cfg.version_endpoint())
        .await
        .map_err(|err| TransportError::Io(err.to_string()))?;
    let info: VersionInfo = resp
        .json()
        .await
        .map_err(|err| TransportError::Io(err.to_string()))?;
    Ok(info.web_socket_debugger_url)
}

async fn run_loop(
    mut conn: Connection<CdpEventMessage>,
    mut command_rx: mpsc::Receiver<ControlMessage>,
    listeners: Arc<ListenerRegistry>,
) -> Result<(), TransportError> {
    let mut inflight: HashMap<CallId, oneshot::Sender<Result<Value, TransportError>>> =
        HashMap::new();

    loop {
        tokio::select! {
            Some(cmd) = command_rx.recv() => {
                handle_command(&mut conn, cmd, &mut inflight);
            }
            message = conn.next() => {
                match message {
                    Some(Ok(Message::Response(resp))) => {
                        handle_response(resp, &mut inflight);
                    }
                    Some(Ok(Message::Event(event))) => {
                        if let Err(err) = handle_event(event, &listeners).await {
                            warn!(target: "cdp-transport", ?err, "failed to decode event");
                        }
                    }
                    Some(Err(err)) => {
                        let mapped = map_cdp_error(err);
                        for (_, sender) in inflight.drain() {
                            let _ = sender.send(Err(mapped.clone()));
                        }
                        return Err(mapped);
                    }
                    None => {
                        let err = TransportError::Io("cdp connection closed".to_string());
                        for (_, sender) in inflight.drain() {
                            let _ = sender.send(Err(err.clone()));
                        }
                        return Err(err);
                    }
                }
            }
        }
    }
}

fn handle_command(
    conn: &mut Connection<CdpEventMessage>,
    cmd: ControlMessage,
    inflight: &mut HashMap<CallId, oneshot::Sender<Result<Value, TransportError>>>,
) {
    let session = match cmd.target {
        CommandTarget::Browser => None,
        CommandTarget::Session(session_id) => Some(CdpSessionId::from(session_id)),
    };

    let method_id: MethodId = cmd.method.clone().into();
    match conn.submit_command(method_id, session, cmd.params) {
        Ok(call_id) => {
            inflight.insert(call_id, cmd.responder);
        }
        Err(err) => {
            let _ = cmd.responder.send(Err(TransportError::Io(err.to_string())));
        }
    }
}

fn handle_response(
    resp: Response,
    inflight: &mut HashMap<CallId, oneshot::Sender<Result<Value, TransportError>>>,
) {
    if let Some(sender) = inflight.remove(&resp.id) {
        let result = if let Some(result) = resp.result {
            Ok(result)
        } else if let Some(error) = resp.error {
            Err(TransportError::Cdp {
                code: error.code,
                message: error.message,
            })
        } else {
            Err(TransportError::Internal("empty cdp response".to_string()))
        };
        let _ = sender.send(result);
    }
}

async fn handle_event(
    event: CdpEventMessage,
    listeners: &Arc<ListenerRegistry>,
) -> Result<(), TransportError> {
    let raw: CdpJsonEventMessage = event
        .try_into()
        .map_err(|err: serde_json::Error| TransportError::Internal(err.to_string()))?;

    listeners
        .dispatch(TransportEvent {
            method: raw.method.into_owned(),
            params: raw.params,
            session_id: raw.session_id,
        })
        .await;
    Ok(())
}

fn map_cdp_error(err: CdpError) -> TransportError {
    let hint = err.to_string();
    match err {
        CdpError::Timeout => TransportError::Timeout,
        CdpError::Serde(_) | CdpError::FrameNotFound(_) | CdpError::JavascriptException(_) => {
            TransportError::Internal(hint)
        }
        _ => TransportError::Io(hint),
    }
}

/// Synthetic method names for transport lifecycle events, fired through the
/// same `ListenerRegistry` as real CDP events so callers subscribe the same
/// way for both.
pub mod lifecycle_events {
    pub const RECONNECTING: &str = "Transport.reconnecting";
    pub const RECONNECTED: &str = "Transport.reconnected";
    pub const CLOSED: &str = "Transport.closed";
}

/// Public entry point: owns the reconnect supervisor and hands out command
/// sends. Cheap to clone; all clones share the same underlying runtime cell.
#[derive(Clone)]
pub struct Transport {
    cfg: TransportConfig,
    state: Arc<OnceCell<Mutex<Option<Arc<RuntimeState>>>>>,
    listeners: Arc<ListenerRegistry>,
    reconnect_attempt: Arc<AtomicU32>,
}

impl Transport {
    pub fn new(cfg: TransportConfig) -> Self {
        Self {
            cfg,
            state: Arc::new(OnceCell::new()),
            listeners: ListenerRegistry::new(),
            reconnect_attempt: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn listeners(&self) -> Arc<ListenerRegistry> {
        self.listeners.clone()
    }

    async fn runtime(&self) -> Result<Arc<RuntimeState>, TransportError> {
        let cell = self.state.get_or_init(|| async { Mutex::new(None) }).await;
        let mut guard = cell.lock().await;

        if let Some(rt) = guard.as_ref() {
            if rt.is_alive() {
                return Ok(rt.clone());
            }
        }

        let runtime = Arc::new(RuntimeState::start(&self.cfg, self.listeners.clone()).await?);
        *guard = Some(runtime.clone());
        Ok(runtime)
    }

    /// Establishes the initial connection and starts the background
    /// reconnect supervisor. Idempotent: later calls just ensure the
    /// connection is live.
    pub async fn connect(&self) -> Result<(), TransportError> {
        self.runtime().await?;
        self.spawn_supervisor();
        Ok(())
    }

    pub async fn send(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        let runtime = self.runtime().await?;
        runtime
            .send(
                target,
                method,
                params,
                Duration::from_millis(self.cfg.default_deadline_ms),
            )
            .await
    }

    fn spawn_supervisor(&self) {
        let transport = self.clone();
        tokio::spawn(async move {
            loop {
                let runtime = match transport.runtime().await {
                    Ok(rt) => rt,
                    Err(err) => {
                        warn!(target: "cdp-transport", ?err, "supervisor failed to establish runtime");
                        if !transport.attempt_reconnect().await {
                            transport.announce_closed().await;
                            return;
                        }
                        continue;
                    }
                };

                // Wait until this runtime dies, then fall through to reconnect.
                while runtime.is_alive() {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }

                transport
                    .reconnect_attempt
                    .store(0, Ordering::Relaxed);

                if !transport.attempt_reconnect().await {
                    transport.announce_closed().await;
                    return;
                }

                transport
                    .listeners
                    .dispatch(TransportEvent {
                        method: lifecycle_events::RECONNECTED.to_string(),
                        params: Value::Null,
                        session_id: None,
                    })
                    .await;
            }
        });
    }

    /// Attempts one reconnect cycle with exponential backoff and jitter, up
    /// to `reconnect_max_attempts`. Returns `false` once attempts are
    /// exhausted.
    async fn attempt_reconnect(&self) -> bool {
        loop {
            let attempt = self.reconnect_attempt.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt > self.cfg.reconnect_max_attempts {
                return false;
            }

            let base = self.cfg.reconnect_base_delay_ms.saturating_mul(1u64 << attempt.min(16));
            let capped = base.min(self.cfg.reconnect_max_delay_ms);
            let jitter = rand::thread_rng().gen_range(0..=capped.max(1) / 4 + 1);
            let delay = capped + jitter;

            self.listeners
                .dispatch(TransportEvent {
                    method: lifecycle_events::RECONNECTING.to_string(),
                    params: serde_json::json!({ "attempt": attempt, "delay": delay }),
                    session_id: None,
                })
                .await;

            debug!(target: "cdp-transport", attempt, delay, "reconnecting");
            tokio::time::sleep(Duration::from_millis(delay)).await;

            match RuntimeState::start(&self.cfg, self.listeners.clone()).await {
                Ok(runtime) => {
                    let cell = self.state.get_or_init(|| async { Mutex::new(None) }).await;
                    let mut guard = cell.lock().await;
                    *guard = Some(Arc::new(runtime));
                    return true;
                }
                Err(err) => {
                    warn!(target: "cdp-transport", ?err, attempt, "reconnect attempt failed");
                    continue;
                }
            }
        }
    }

    async fn announce_closed(&self) {
        self.listeners
            .dispatch(TransportEvent {
                method: lifecycle_events::CLOSED.to_string(),
                params: Value::Null,
                session_id: None,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_never_exceeds_cap() {
        let cfg = TransportConfig {
            reconnect_base_delay_ms: 200,
            reconnect_max_delay_ms: 1000,
            ..TransportConfig::default()
        };
        for attempt in 1u64..10 {
            let base = cfg.reconnect_base_delay_ms.saturating_mul(1u64 << attempt.min(16));
            let capped = base.min(cfg.reconnect_max_delay_ms);
            assert!(capped <= cfg.reconnect_max_delay_ms);
        }
    }
}
