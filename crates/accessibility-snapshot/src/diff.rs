//! Viewport diff (§4.8): compares the viewport-visible refs of two
//! snapshots taken at command boundaries by the step runner.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::AccessibilityNode;

#[derive(Clone, Debug, Serialize)]
pub struct ViewportDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl ViewportDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

fn fingerprint_of(node: &AccessibilityNode) -> (String, String, Vec<String>) {
    (node.role.clone(), node.name.clone(), node.states.clone())
}

pub fn diff(before: &[AccessibilityNode], after: &[AccessibilityNode]) -> ViewportDiff {
    let before_visible: HashMap<&str, &AccessibilityNode> = before
        .iter()
        .filter(|n| n.in_viewport)
        .map(|n| (n.ref_id.as_str(), n))
        .collect();
    let after_visible: HashMap<&str, &AccessibilityNode> = after
        .iter()
        .filter(|n| n.in_viewport)
        .map(|n| (n.ref_id.as_str(), n))
        .collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for (ref_id, node) in &after_visible {
        match before_visible.get(ref_id) {
            None => added.push(ref_id.to_string()),
            Some(prev) => {
                if fingerprint_of(prev) != fingerprint_of(node) {
                    changed.push(ref_id.to_string());
                }
            }
        }
    }
    let mut removed: Vec<String> = before_visible
        .keys()
        .filter(|ref_id| !after_visible.contains_key(*ref_id))
        .map(|s| s.to_string())
        .collect();

    added.sort();
    removed.sort();
    changed.sort();
    ViewportDiff { added, removed, changed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ref_id: &str, role: &str, states: Vec<&str>, visible: bool) -> AccessibilityNode {
        AccessibilityNode {
            ref_id: ref_id.to_string(),
            role: role.to_string(),
            name: "x".to_string(),
            level: None,
            states: states.into_iter().map(|s| s.to_string()).collect(),
            in_viewport: visible,
            depth: 0,
            cross_origin_frame: false,
            landmark_path: vec![],
        }
    }

    #[test]
    fn detects_added_removed_and_changed() {
        let before = vec![node("a", "button", vec![], true), node("b", "checkbox", vec![], true)];
        let after = vec![
            node("b", "checkbox", vec!["checked"], true),
            node("c", "button", vec![], true),
        ];
        let d = diff(&before, &after);
        assert_eq!(d.added, vec!["c".to_string()]);
        assert_eq!(d.removed, vec!["a".to_string()]);
        assert_eq!(d.changed, vec!["b".to_string()]);
    }

    #[test]
    fn elements_outside_viewport_are_ignored() {
        let before = vec![node("a", "button", vec![], false)];
        let after = vec![node("a", "button", vec![], false)];
        assert!(diff(&before, &after).is_empty());
    }
}
