//! Console capture: subscribes to `Runtime.consoleAPICalled` and
//! `Runtime.exceptionThrown` for one tab's session and buffers messages so
//! the runner can slice "since the last capture point" per step (§4.11).

use std::sync::Arc;

use cdp_transport::{ListenerHandle, ListenerRegistry, Transport};
use core_types::SessionId;
use page_controller::PageController;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::model::ConsoleReport;

pub struct ConsoleCapture {
    messages: Arc<Mutex<Vec<Value>>>,
    handles: Vec<ListenerHandle>,
    registry: Arc<ListenerRegistry>,
}

impl ConsoleCapture {
    pub fn attach(transport: &Transport, page: &PageController) -> Self {
        let registry = transport.listeners();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();

        handles.push(spawn_forwarder(&registry, &page.session().clone(), "Runtime.consoleAPICalled", messages.clone(), |params| {
            let level = params.get("type").and_then(|v| v.as_str()).unwrap_or("log").to_string();
            let text = params
                .get("args")
                .and_then(|v| v.as_array())
                .map(|args| {
                    args.iter()
                        .filter_map(|a| a.get("value").and_then(|v| v.as_str()).map(str::to_string).or_else(|| a.get("description").and_then(|v| v.as_str()).map(str::to_string)))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            json!({ "level": level, "text": text })
        }));

        handles.push(spawn_forwarder(&registry, &page.session().clone(), "Runtime.exceptionThrown", messages.clone(), |params| {
            let text = params
                .get("exceptionDetails")
                .and_then(|d| d.get("text"))
                .and_then(|v| v.as_str())
                .unwrap_or("uncaught exception")
                .to_string();
            json!({ "level": "error", "text": text })
        }));

        Self { messages, handles, registry }
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    /// Messages added since `since_index` (the value `len()` returned at
    /// the last capture point), rolled into the `{errors,warnings,messages}`
    /// shape the final report carries.
    pub async fn since(&self, since_index: usize) -> ConsoleReport {
        let all = self.messages.lock().await;
        let slice = all.get(since_index..).unwrap_or_default();
        let errors = slice.iter().filter(|m| m.get("level").and_then(|v| v.as_str()) == Some("error")).count();
        let warnings = slice.iter().filter(|m| m.get("level").and_then(|v| v.as_str()) == Some("warning")).count();
        ConsoleReport {
            errors,
            warnings,
            messages: slice.to_vec(),
        }
    }

    pub fn detach(self) {
        for handle in &self.handles {
            self.registry.off(handle);
        }
    }
}

fn spawn_forwarder(
    registry: &Arc<ListenerRegistry>,
    session: &SessionId,
    method: &str,
    messages: Arc<Mutex<Vec<Value>>>,
    extract: fn(&Value) -> Value,
) -> ListenerHandle {
    let (mut rx, handle) = registry.on(format!("{}:{method}", session.0), 256);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut guard = messages.lock().await;
            guard.push(extract(&event.params));
        }
    });
    handle
}
