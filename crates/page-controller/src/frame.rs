//! Frame tree (§3 data model: `{frameId, parentId?, url, name?, executionContextId?}`).

use core_types::{ExecutionContextId, FrameId};
use dashmap::DashMap;

#[derive(Clone, Debug, Default)]
pub struct FrameNode {
    pub parent: Option<FrameId>,
    pub url: String,
    pub name: Option<String>,
    pub execution_context: Option<ExecutionContextId>,
}

/// Flat table keyed by `FrameId`; parent links point outward, never back.
#[derive(Default)]
pub struct FrameTree {
    frames: DashMap<FrameId, FrameNode>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self {
            frames: DashMap::new(),
        }
    }

    pub fn upsert(&self, id: FrameId, parent: Option<FrameId>, url: String, name: Option<String>) {
        self.frames
            .entry(id)
            .and_modify(|node| {
                node.parent = parent.clone();
                node.url = url.clone();
                node.name = name.clone();
            })
            .or_insert_with(|| FrameNode {
                parent,
                url,
                name,
                execution_context: None,
            });
    }

    pub fn remove(&self, id: &FrameId) {
        self.frames.remove(id);
    }

    pub fn set_execution_context(&self, id: &FrameId, ctx: ExecutionContextId) {
        if let Some(mut node) = self.frames.get_mut(id) {
            node.execution_context = Some(ctx);
        }
    }

    pub fn clear_execution_context(&self, ctx: &ExecutionContextId) {
        for mut entry in self.frames.iter_mut() {
            if entry.execution_context.as_ref() == Some(ctx) {
                entry.execution_context = None;
            }
        }
    }

    pub fn execution_context(&self, id: &FrameId) -> Option<ExecutionContextId> {
        self.frames.get(id).and_then(|n| n.execution_context.clone())
    }

    pub fn get(&self, id: &FrameId) -> Option<FrameNode> {
        self.frames.get(id).map(|n| n.clone())
    }

    pub fn all_frame_ids(&self) -> Vec<FrameId> {
        self.frames.iter().map(|kv| kv.key().clone()).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<FrameId> {
        self.frames
            .iter()
            .find(|kv| kv.value().name.as_deref() == Some(name))
            .map(|kv| kv.key().clone())
    }

    /// Children in insertion order is not tracked; index lookup walks all
    /// frames whose parent matches, ordered by frame id string for
    /// determinism (frame ids are opaque CDP-assigned strings).
    pub fn find_by_index(&self, parent: &FrameId, index: usize) -> Option<FrameId> {
        let mut children: Vec<FrameId> = self
            .frames
            .iter()
            .filter(|kv| kv.value().parent.as_ref() == Some(parent))
            .map(|kv| kv.key().clone())
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));
        children.into_iter().nth(index)
    }
}
