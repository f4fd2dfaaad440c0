//! Tab lifecycle: `newTab`/`openTab`/`switchTab`/`connectTab`/`closeTab`/
//! `listTabs`, layered over the Tab Alias Store (C3), Session Registry (C2)
//! and one `PageController` (C4) per attached tab.

use std::collections::HashMap;
use std::sync::Arc;

use cdp_transport::{CommandTarget, SessionRegistry, TabAliasStore, Transport};
use core_types::{DriverError, FrameId, SessionId, TabAlias, TargetId};
use page_controller::{NavigateOptions, PageController};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StepError;

pub struct Tab {
    pub alias: TabAlias,
    pub target_id: TargetId,
    pub controller: Arc<PageController>,
}

pub struct TabManager {
    transport: Arc<Transport>,
    sessions: Arc<SessionRegistry>,
    aliases: TabAliasStore,
    tabs: RwLock<HashMap<String, Tab>>,
}

impl TabManager {
    pub fn new(transport: Arc<Transport>, aliases: TabAliasStore) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        SessionRegistry::watch_detach_events(sessions.clone(), transport.listeners());
        Self {
            transport,
            sessions,
            aliases,
            tabs: RwLock::new(HashMap::new()),
        }
    }

    async fn attach_and_track(&self, alias: TabAlias, target_id: TargetId) -> Result<Arc<PageController>, StepError> {
        let attached = self
            .transport
            .send(
                CommandTarget::Browser,
                "Target.attachToTarget",
                json!({ "targetId": target_id.0, "flatten": true }),
            )
            .await?;
        let session_id = attached
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StepError::Validation("Target.attachToTarget returned no sessionId".to_string()))?
            .to_string();
        let session = SessionId(session_id);
        self.sessions.attach(session.clone(), target_id.clone());

        let mut controller = PageController::new(self.transport.clone(), session.clone());
        controller.initialize().await?;

        let tree = self
            .transport
            .send(CommandTarget::Session(session.0.clone()), "Page.getFrameTree", json!({}))
            .await
            .unwrap_or(Value::Null);
        hydrate_frame_tree(&controller, &tree).await;

        let controller = Arc::new(controller);
        self.tabs.write().await.insert(
            alias.0.clone(),
            Tab {
                alias: alias.clone(),
                target_id,
                controller: controller.clone(),
            },
        );
        Ok(controller)
    }

    /// `newTab`/`openTab`: creates a fresh target, optionally navigating it.
    pub async fn new_tab(&self, url: Option<&str>) -> Result<(TabAlias, Arc<PageController>), StepError> {
        let created = self
            .transport
            .send(
                CommandTarget::Browser,
                "Target.createTarget",
                json!({ "url": url.unwrap_or("about:blank") }),
            )
            .await?;
        let target_id = created
            .get("targetId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StepError::Validation("Target.createTarget returned no targetId".to_string()))?
            .to_string();
        let target_id = TargetId(target_id);

        let alias = self.aliases.next_alias();
        self.aliases
            .insert(alias.clone(), target_id.0.clone())
            .map_err(|e| StepError::Validation(format!("failed to persist tab alias: {e}")))?;

        let controller = self.attach_and_track(alias.clone(), target_id).await?;
        Ok((alias, controller))
    }

    /// `switchTab`: resolves an existing alias to its tracked controller,
    /// attaching lazily if this process hasn't seen it yet.
    pub async fn switch_tab(&self, alias: &str) -> Result<Arc<PageController>, StepError> {
        if let Some(tab) = self.tabs.read().await.get(alias) {
            return Ok(tab.controller.clone());
        }
        let target_id = self
            .aliases
            .resolve(&TabAlias(alias.to_string()))
            .ok_or_else(|| StepError::UnknownTab(alias.to_string()))?;
        self.attach_and_track(TabAlias(alias.to_string()), TargetId(target_id)).await
    }

    /// `connectTab`: attaches directly to a target id (no alias yet), minting
    /// one so later steps can refer back to it.
    pub async fn connect_tab(&self, target_id: &str) -> Result<(TabAlias, Arc<PageController>), StepError> {
        for (alias, existing) in self.aliases.all() {
            if existing == target_id {
                let controller = self.switch_tab(&alias.0).await?;
                return Ok((alias, controller));
            }
        }
        let alias = self.aliases.next_alias();
        self.aliases
            .insert(alias.clone(), target_id.to_string())
            .map_err(|e| StepError::Validation(format!("failed to persist tab alias: {e}")))?;
        let controller = self.attach_and_track(alias.clone(), TargetId(target_id.to_string())).await?;
        Ok((alias, controller))
    }

    pub async fn close_tab(&self, alias: &str) -> Result<bool, StepError> {
        let target_id = {
            let mut tabs = self.tabs.write().await;
            match tabs.remove(alias) {
                Some(tab) => Some(tab.target_id),
                None => self.aliases.resolve(&TabAlias(alias.to_string())).map(TargetId),
            }
        };
        let Some(target_id) = target_id else {
            return Ok(false);
        };
        self.transport
            .send(CommandTarget::Browser, "Target.closeTarget", json!({ "targetId": target_id.0 }))
            .await?;
        self.sessions.detach_by_target(&target_id);
        let _ = self.aliases.remove(&TabAlias(alias.to_string()));
        Ok(true)
    }

    pub async fn list_tabs(&self) -> Result<Vec<Value>, StepError> {
        let targets = self
            .transport
            .send(CommandTarget::Browser, "Target.getTargets", json!({}))
            .await?;
        let known: HashMap<String, String> = self
            .aliases
            .all()
            .into_iter()
            .map(|(a, t)| (t, a.0))
            .collect();
        let list = targets
            .get("targetInfos")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
                    .map(|t| {
                        let target_id = t.get("targetId").and_then(|v| v.as_str()).unwrap_or_default();
                        json!({
                            "targetId": target_id,
                            "alias": known.get(target_id),
                            "url": t.get("url"),
                            "title": t.get("title"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(list)
    }

    pub async fn navigate(&self, controller: &PageController, url: &str, opts: NavigateOptions) -> Result<(), DriverError> {
        debug!(target: "step-engine", %url, "navigating");
        controller.navigate(url, opts).await.map_err(DriverError::from)
    }
}

async fn hydrate_frame_tree(controller: &PageController, tree: &Value) {
    fn walk(node: &Value, parent: Option<FrameId>, out: &mut Vec<(FrameId, Option<FrameId>, String, Option<String>)>) {
        let Some(frame) = node.get("frame") else { return };
        let id = frame.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let url = frame.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let name = frame.get("name").and_then(|v| v.as_str()).map(str::to_string);
        out.push((FrameId(id.clone()), parent.clone(), url, name));
        if let Some(children) = node.get("childFrames").and_then(|v| v.as_array()) {
            for child in children {
                walk(child, Some(FrameId(id.clone())), out);
            }
        }
    }

    let mut out = Vec::new();
    walk(tree, None, &mut out);
    if out.is_empty() {
        return;
    }
    for (id, parent, url, name) in &out {
        controller.frames().upsert(id.clone(), parent.clone(), url.clone(), name.clone());
    }
    controller.set_main_frame(out[0].0.clone()).await;
}
