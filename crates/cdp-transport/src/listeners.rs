//! Event listener registry (§3 invariant: every subscribed listener is
//! unsubscribed on page-controller dispose; §4 C1/C2).
//!
//! Keys are either a bare CDP method name (`"Page.lifecycleEvent"`, global —
//! fires for every session) or a session-scoped key (`"{sessionId}:{method}"`).
//! The receive loop calls `dispatch` once per inbound event with both keys;
//! callers `subscribe` to whichever key matches the scope they care about.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::transport::TransportEvent;

#[derive(Clone)]
pub struct ListenerHandle {
    key: String,
    id: u64,
}

pub struct ListenerRegistry {
    listeners: DashMap<String, Vec<(u64, mpsc::Sender<TransportEvent>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Subscribes to a bare method name or a `"{sessionId}:{method}"` key.
    /// Returns a receiver and a handle; callers must `unsubscribe` the
    /// handle when done or the sender end leaks for the process lifetime.
    pub fn on(&self, key: impl Into<String>, capacity: usize) -> (mpsc::Receiver<TransportEvent>, ListenerHandle) {
        let key = key.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.entry(key.clone()).or_default().push((id, tx));
        (rx, ListenerHandle { key, id })
    }

    pub fn off(&self, handle: &ListenerHandle) {
        if let Some(mut entry) = self.listeners.get_mut(&handle.key) {
            entry.retain(|(id, _)| *id != handle.id);
        }
    }

    /// Delivers one event to every listener subscribed under the bare
    /// method name and, if a session id is present, under the session-scoped
    /// key too. Dead receivers are pruned opportunistically.
    pub async fn dispatch(&self, event: TransportEvent) {
        let method_key = event.method.clone();
        self.dispatch_key(&method_key, &event).await;

        if let Some(session_id) = &event.session_id {
            let scoped = format!("{session_id}:{}", event.method);
            self.dispatch_key(&scoped, &event).await;
        }
    }

    async fn dispatch_key(&self, key: &str, event: &TransportEvent) {
        let senders: Vec<(u64, mpsc::Sender<TransportEvent>)> = match self.listeners.get(key) {
            Some(entry) => entry.clone(),
            None => return,
        };
        let mut dead = Vec::new();
        for (id, tx) in &senders {
            if tx.send(event.clone()).await.is_err() {
                dead.push(*id);
            }
        }
        if !dead.is_empty() {
            if let Some(mut entry) = self.listeners.get_mut(key) {
                entry.retain(|(id, _)| !dead.contains(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn global_and_scoped_listeners_both_fire() {
        let registry = ListenerRegistry::new();
        let (mut global_rx, global_handle) = registry.on("Page.lifecycleEvent", 4);
        let (mut scoped_rx, _scoped_handle) = registry.on("sess-1:Page.lifecycleEvent", 4);

        registry
            .dispatch(TransportEvent {
                method: "Page.lifecycleEvent".to_string(),
                params: json!({}),
                session_id: Some("sess-1".to_string()),
            })
            .await;

        assert!(global_rx.try_recv().is_ok());
        assert!(scoped_rx.try_recv().is_ok());

        registry.off(&global_handle);
        registry
            .dispatch(TransportEvent {
                method: "Page.lifecycleEvent".to_string(),
                params: json!({}),
                session_id: Some("sess-1".to_string()),
            })
            .await;
        assert!(global_rx.try_recv().is_err());
    }
}
