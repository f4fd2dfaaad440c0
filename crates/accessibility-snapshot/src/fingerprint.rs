use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

/// Cheap "has anything meaningful changed" signal: URL, scroll position,
/// document size, and interactive-element count. Two snapshots with the
/// same fingerprint are treated as identical without re-diffing their
/// whole node lists.
pub fn compute(url: &str, scroll_x: f64, scroll_y: f64, doc_width: f64, doc_height: f64, interactive_count: usize) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    (scroll_x.round() as i64).hash(&mut hasher);
    (scroll_y.round() as i64).hash(&mut hasher);
    (doc_width.round() as i64).hash(&mut hasher);
    (doc_height.round() as i64).hash(&mut hasher);
    interactive_count.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_fingerprint() {
        let a = compute("https://x.test", 0.0, 0.0, 100.0, 200.0, 3);
        let b = compute("https://x.test", 0.0, 0.0, 100.0, 200.0, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn scroll_change_changes_fingerprint() {
        let a = compute("https://x.test", 0.0, 0.0, 100.0, 200.0, 3);
        let b = compute("https://x.test", 0.0, 50.0, 100.0, 200.0, 3);
        assert_ne!(a, b);
    }
}
