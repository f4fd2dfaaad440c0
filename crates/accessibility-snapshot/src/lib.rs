//! Accessibility Snapshotter (C8): walks the DOM into a role/name/state
//! tree, assigns versioned refs, and detects unchanged pages via a
//! fingerprint before diffing viewport-visible refs across steps.

pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod js;
pub mod model;
pub mod render;

pub use diff::{diff as viewport_diff, ViewportDiff};
pub use error::SnapshotError;
pub use model::{AccessibilityNode, DetailLevel, Snapshot, SnapshotOptions, SnapshotOutput};

use core_types::FrameId;
use page_controller::PageController;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static SNAPSHOT_COUNTER: AtomicU64 = AtomicU64::new(1);

const DEFAULT_INLINE_LIMIT: usize = 9 * 1024;

/// Runs the DOM walk in `frame` and assembles a `SnapshotOutput`, short-
/// circuiting to `Unchanged` when `options.since` matches the freshly
/// computed fingerprint.
pub async fn take_snapshot(
    page: &PageController,
    frame: &FrameId,
    options: &SnapshotOptions,
) -> Result<SnapshotOutput, SnapshotError> {
    let snapshot_id = format!("s{}", SNAPSHOT_COUNTER.fetch_add(1, Ordering::SeqCst));
    let script = js::build_walk_script(&frame.0, &snapshot_id, options.pierce_shadow, options.include_frames);

    let value = page.evaluate_in_frame(frame, &script).await?;
    let mut nodes = parse_nodes(&value)?;
    if options.viewport_only {
        nodes.retain(|n| n.in_viewport);
    }

    let url = value.get("url").and_then(|v| v.as_str()).unwrap_or_default();
    let scroll_x = value.get("scrollX").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let scroll_y = value.get("scrollY").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let doc_width = value.get("docWidth").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let doc_height = value.get("docHeight").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let interactive_count = nodes
        .iter()
        .filter(|n| matches!(n.role.as_str(), "button" | "link" | "textbox" | "checkbox" | "radio" | "combobox"))
        .count();

    let fingerprint = fingerprint::compute(url, scroll_x, scroll_y, doc_width, doc_height, interactive_count);

    if let Some(since) = &options.since {
        if since == &fingerprint {
            debug!(target: "accessibility-snapshot", %fingerprint, "unchanged since last snapshot");
            return Ok(SnapshotOutput::Unchanged { snapshot_id });
        }
    }

    let text = render::render(&nodes, options.detail);
    let snapshot = Snapshot {
        snapshot_id,
        fingerprint,
        nodes,
        text,
    };

    let limit = options.inline_limit.unwrap_or(DEFAULT_INLINE_LIMIT);
    let byte_len = snapshot.text.len();
    if byte_len > limit {
        Ok(SnapshotOutput::TooLarge { snapshot, byte_len })
    } else {
        Ok(SnapshotOutput::Inline(snapshot))
    }
}

fn parse_nodes(value: &Value) -> Result<Vec<AccessibilityNode>, SnapshotError> {
    let raw_nodes = value
        .get("nodes")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SnapshotError::Eval("snapshot result missing nodes array".to_string()))?;

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for raw in raw_nodes {
        let ref_id = raw
            .get("ref")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SnapshotError::Eval("node missing ref".to_string()))?
            .to_string();
        let role = raw.get("role").and_then(|v| v.as_str()).unwrap_or("generic").to_string();
        let name = raw.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let level = raw.get("level").and_then(|v| v.as_u64()).map(|n| n as u32);
        let states = raw
            .get("states")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        let in_viewport = raw.get("inViewport").and_then(|v| v.as_bool()).unwrap_or(false);
        let depth = raw.get("depth").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let cross_origin_frame = raw.get("crossOriginFrame").and_then(|v| v.as_bool()).unwrap_or(false);
        let landmark_path = raw
            .get("landmarkPath")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        nodes.push(AccessibilityNode {
            ref_id,
            role,
            name,
            level,
            states,
            in_viewport,
            depth,
            cross_origin_frame,
            landmark_path,
        });
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_nodes_reads_required_fields() {
        let value = json!({
            "nodes": [
                { "ref": "f0s1e1", "role": "button", "name": "Go", "inViewport": true, "depth": 0 }
            ]
        });
        let nodes = parse_nodes(&value).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].role, "button");
        assert!(nodes[0].in_viewport);
    }

    #[test]
    fn parse_nodes_rejects_missing_ref() {
        let value = json!({ "nodes": [{ "role": "button" }] });
        assert!(parse_nodes(&value).is_err());
    }
}
