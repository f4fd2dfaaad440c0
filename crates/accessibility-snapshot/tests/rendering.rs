use accessibility_snapshot::{viewport_diff, AccessibilityNode, DetailLevel};
use accessibility_snapshot::render::render;

fn node(ref_id: &str, role: &str, name: &str, depth: usize, visible: bool) -> AccessibilityNode {
    AccessibilityNode {
        ref_id: ref_id.to_string(),
        role: role.to_string(),
        name: name.to_string(),
        level: None,
        states: vec![],
        in_viewport: visible,
        depth,
        cross_origin_frame: false,
        landmark_path: vec![],
    }
}

#[test]
fn full_then_interactive_then_summary_agree_on_content() {
    let nodes = vec![
        node("f0s1e1", "navigation", "Main nav", 0, true),
        node("f0s1e2", "button", "Sign in", 1, true),
        node("f0s1e3", "paragraph", "Welcome back", 1, true),
    ];

    let full = render(&nodes, DetailLevel::Full);
    assert!(full.contains("navigation"));
    assert!(full.contains("Sign in"));

    let interactive = render(&nodes, DetailLevel::Interactive);
    assert!(interactive.contains("Sign in"));
    assert!(!interactive.contains("Welcome back"));

    let summary = render(&nodes, DetailLevel::Summary);
    assert!(summary.contains("navigation: 1"));
    assert!(!summary.contains("button"));
}

#[test]
fn viewport_diff_across_two_walks() {
    let before = vec![node("a", "button", "A", 0, true), node("b", "link", "B", 0, true)];
    let after = vec![node("b", "link", "B", 0, true), node("c", "button", "C", 0, true)];

    let d = viewport_diff(&before, &after);
    assert_eq!(d.added, vec!["c".to_string()]);
    assert_eq!(d.removed, vec!["a".to_string()]);
    assert!(d.changed.is_empty());
}
