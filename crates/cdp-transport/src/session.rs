//! Session Registry (C2): attach/detach per-target sessions, route
//! session-tagged events, invalidate on `Target.detachedFromTarget`.

use std::sync::Arc;
use std::time::Instant;

use core_types::{SessionId, TargetId};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::listeners::ListenerRegistry;
use crate::transport::{CommandTarget, Transport};
use crate::error::TransportError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Attached,
    Invalid,
}

#[derive(Clone, Debug)]
pub struct SessionEntry {
    pub target_id: TargetId,
    pub state: SessionState,
    pub attached_at: Instant,
}

/// Flat table keyed by `SessionId`; never back-referenced from `TargetId`
/// so a session invalidation never has to walk a tree.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn attach(&self, session_id: SessionId, target_id: TargetId) {
        self.sessions.insert(
            session_id,
            SessionEntry {
                target_id,
                state: SessionState::Attached,
                attached_at: Instant::now(),
            },
        );
    }

    /// Marks the session invalid on `Target.detachedFromTarget`. Commands on
    /// it must fail immediately rather than be attempted over the wire.
    pub fn invalidate(&self, session_id: &SessionId) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.state = SessionState::Invalid;
        }
    }

    pub fn is_valid(&self, session_id: &SessionId) -> bool {
        self.sessions
            .get(session_id)
            .map(|e| e.state == SessionState::Attached)
            .unwrap_or(false)
    }

    pub fn target_of(&self, session_id: &SessionId) -> Option<TargetId> {
        self.sessions.get(session_id).map(|e| e.target_id.clone())
    }

    pub fn remove(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }

    pub fn sessions_for_target(&self, target_id: &TargetId) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|kv| &kv.value().target_id == target_id)
            .map(|kv| kv.key().clone())
            .collect()
    }

    /// Detaches one session: invalidates it, then drops its entry so
    /// `target_of`/`is_valid` both reflect that it is gone for good.
    /// Commands attempted on it after this call fail via `send_to_session`.
    pub fn detach(&self, session_id: &SessionId) {
        self.invalidate(session_id);
        self.remove(session_id);
    }

    /// Detaches every session currently attached to `target_id` (e.g. when
    /// the tab behind it closes).
    pub fn detach_by_target(&self, target_id: &TargetId) {
        for session_id in self.sessions_for_target(target_id) {
            self.detach(&session_id);
        }
    }

    /// Detaches every session this registry knows about.
    pub fn detach_all(&self) {
        let all: Vec<SessionId> = self.sessions.iter().map(|kv| kv.key().clone()).collect();
        for session_id in all {
            self.detach(&session_id);
        }
    }

    /// Routes a command to a session, refusing invalid sessions before the
    /// command ever reaches the transport (spec §4.2: `sendToSession`
    /// "refuses invalid sessions with a *session invalid* error").
    pub async fn send_to_session(
        &self,
        transport: &Transport,
        session_id: &SessionId,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        if !self.is_valid(session_id) {
            return Err(TransportError::InvalidSession(session_id.0.clone()));
        }
        transport
            .send(CommandTarget::Session(session_id.0.clone()), method, params)
            .await
    }

    /// Subscribes once to the global `Target.detachedFromTarget` event and
    /// invalidates whichever session it names, per spec §4.2 ("Subscribes
    /// once to `Target.detachedFromTarget` on the transport and forwards to
    /// the specific session so it can invalidate itself"). The listener
    /// runs for the lifetime of `registry`; there is nothing to unsubscribe
    /// since the registry itself lives for the process lifetime.
    pub fn watch_detach_events(registry: Arc<Self>, listeners: Arc<ListenerRegistry>) {
        let (mut rx, _handle) = listeners.on("Target.detachedFromTarget", 32);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Some(session_id) = event.params.get("sessionId").and_then(|v| v.as_str()) {
                    debug!(target: "cdp-transport", session_id, "Target.detachedFromTarget: invalidating session");
                    registry.detach(&SessionId(session_id.to_string()));
                }
            }
        });
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_invalidates_session() {
        let registry = SessionRegistry::new();
        let sid = SessionId("s1".to_string());
        let tid = TargetId("t1".to_string());
        registry.attach(sid.clone(), tid.clone());
        assert!(registry.is_valid(&sid));

        registry.invalidate(&sid);
        assert!(!registry.is_valid(&sid));
        assert_eq!(registry.target_of(&sid), Some(tid));
    }

    #[test]
    fn detach_removes_the_entry_entirely() {
        let registry = SessionRegistry::new();
        let sid = SessionId("s1".to_string());
        let tid = TargetId("t1".to_string());
        registry.attach(sid.clone(), tid);
        registry.detach(&sid);
        assert!(!registry.is_valid(&sid));
        assert_eq!(registry.target_of(&sid), None);
    }

    #[test]
    fn detach_by_target_takes_every_session_on_that_target() {
        let registry = SessionRegistry::new();
        let tid = TargetId("t1".to_string());
        let s1 = SessionId("s1".to_string());
        let s2 = SessionId("s2".to_string());
        registry.attach(s1.clone(), tid.clone());
        registry.attach(s2.clone(), tid.clone());

        registry.detach_by_target(&tid);
        assert!(!registry.is_valid(&s1));
        assert!(!registry.is_valid(&s2));
        assert!(registry.sessions_for_target(&tid).is_empty());
    }

    #[test]
    fn detach_all_clears_the_registry() {
        let registry = SessionRegistry::new();
        registry.attach(SessionId("s1".to_string()), TargetId("t1".to_string()));
        registry.attach(SessionId("s2".to_string()), TargetId("t2".to_string()));

        registry.detach_all();
        assert!(!registry.is_valid(&SessionId("s1".to_string())));
        assert!(!registry.is_valid(&SessionId("s2".to_string())));
    }

    #[tokio::test]
    async fn send_to_session_refuses_invalid_sessions() {
        let registry = SessionRegistry::new();
        let sid = SessionId("s1".to_string());
        registry.attach(sid.clone(), TargetId("t1".to_string()));
        registry.detach(&sid);

        let transport = Transport::new(crate::config::TransportConfig::default());
        let err = registry
            .send_to_session(&transport, &sid, "Page.enable", serde_json::json!({}))
            .await
            .expect_err("detached session must be refused before reaching the transport");
        assert!(matches!(err, TransportError::InvalidSession(ref s) if s == &sid.0));
    }
}
