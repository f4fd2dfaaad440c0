//! Renders an `AccessibilityNode` list to the YAML-like indented text the
//! spec's `snapshot` step returns, shaped by `DetailLevel`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::model::{AccessibilityNode, DetailLevel};

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "textbox", "searchbox", "checkbox", "radio", "combobox", "slider", "option",
];

const ALERT_ROLES: &[&str] = &["alert", "status"];

pub fn render(nodes: &[AccessibilityNode], detail: DetailLevel) -> String {
    match detail {
        DetailLevel::Summary => render_summary(nodes),
        DetailLevel::Interactive => render_interactive(nodes),
        DetailLevel::Full => render_full(nodes),
    }
}

fn render_summary(nodes: &[AccessibilityNode]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in nodes {
        if matches!(
            node.role.as_str(),
            "navigation" | "main" | "banner" | "contentinfo" | "complementary" | "form" | "search" | "region"
        ) {
            *counts.entry(node.role.as_str()).or_insert(0) += 1;
        }
    }
    let mut out = String::new();
    for (role, count) in counts {
        let _ = writeln!(out, "{role}: {count}");
    }
    out
}

fn render_interactive(nodes: &[AccessibilityNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        if !INTERACTIVE_ROLES.contains(&node.role.as_str()) {
            continue;
        }
        let path = if node.landmark_path.is_empty() {
            String::new()
        } else {
            format!(" [{}]", node.landmark_path.join(" > "))
        };
        let _ = writeln!(out, "- {} \"{}\"{path} [ref={}]", node.role, node.name, node.ref_id);
    }
    out
}

fn render_full(nodes: &[AccessibilityNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        let indent = "  ".repeat(node.depth);
        let mut suffix = String::new();
        if let Some(level) = node.level {
            let _ = write!(suffix, " [level={level}]");
        }
        if !node.states.is_empty() {
            let _ = write!(suffix, " [{}]", node.states.join(","));
        }
        let always_text = ALERT_ROLES.contains(&node.role.as_str());
        let name = if node.name.is_empty() && !always_text {
            String::new()
        } else {
            format!(" \"{}\"", node.name)
        };
        if node.cross_origin_frame {
            let _ = writeln!(out, "{indent}- {} [cross-origin]{suffix} [ref={}]", node.role, node.ref_id);
        } else {
            let _ = writeln!(out, "{indent}- {}{name}{suffix} [ref={}]", node.role, node.ref_id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(role: &str, name: &str, depth: usize) -> AccessibilityNode {
        AccessibilityNode {
            ref_id: "f0s0e1".to_string(),
            role: role.to_string(),
            name: name.to_string(),
            level: None,
            states: vec![],
            in_viewport: true,
            depth,
            cross_origin_frame: false,
            landmark_path: vec![],
        }
    }

    #[test]
    fn summary_counts_landmarks_only() {
        let nodes = vec![node("navigation", "Main nav", 0), node("button", "Go", 1)];
        let text = render_summary(&nodes);
        assert!(text.contains("navigation: 1"));
        assert!(!text.contains("button"));
    }

    #[test]
    fn interactive_includes_landmark_path() {
        let mut n = node("button", "Submit", 2);
        n.landmark_path = vec!["form".to_string()];
        let text = render_interactive(std::slice::from_ref(&n));
        assert!(text.contains("[form]"));
        assert!(text.contains("ref=f0s0e1"));
    }

    #[test]
    fn full_indents_by_depth() {
        let nodes = vec![node("heading", "Title", 0), node("paragraph", "Body", 1)];
        let text = render_full(&nodes);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("  -"));
    }
}
