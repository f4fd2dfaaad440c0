//! Flat identifier newtypes shared across the driver's crates.
//!
//! Per the cyclic-reference design note, frames/sessions/contexts are never
//! stored as back-pointers: every crate keeps flat tables keyed by these ids
//! and resolves relationships by lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CDP session id as returned by `Target.attachToTarget`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CDP target id (one per attachable tab/worker/etc).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CDP frame id.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub String);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime execution context id, scoped to one frame.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ExecutionContextId(pub String);

/// Stable, process-external short alias for a tab (`t1`, `t2`, ...).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TabAlias(pub String);

impl fmt::Display for TabAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TabAlias {
    pub fn from_index(n: u64) -> Self {
        Self(format!("t{n}"))
    }
}

/// Versioned accessibility-tree ref: `f{frame}s{snapshot}e{element}`.
///
/// `frame` may be a numeric frame index or a frame name, hence it is kept as
/// a string rather than parsed into an integer.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub frame: String,
    pub snapshot: u64,
    pub element: u64,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}s{}e{}", self.frame, self.snapshot, self.element)
    }
}

impl ElementRef {
    /// Parses `f{frame}s{snapshot}e{element}`. Returns `None` if the string
    /// does not match the ref grammar (callers treat a non-match as "this is
    /// a plain selector, not a ref").
    ///
    /// The frame name itself may contain `s` (frame names are arbitrary
    /// strings), so the split point is not the first `s` but the rightmost
    /// one that leaves a valid `\d+e\d+` suffix, matching how a greedy
    /// `\w+s\d+e\d+` regex would backtrack.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix('f')?;
        let bytes = rest.as_bytes();
        for idx in (0..bytes.len()).rev() {
            if bytes[idx] != b's' {
                continue;
            }
            let frame = &rest[..idx];
            if frame.is_empty() {
                continue;
            }
            if let Some((snapshot, element)) = parse_snapshot_element(&rest[idx + 1..]) {
                return Some(Self {
                    frame: frame.to_string(),
                    snapshot,
                    element,
                });
            }
        }
        None
    }
}

fn parse_snapshot_element(tail: &str) -> Option<(u64, u64)> {
    let e_pos = tail.find('e')?;
    let (snapshot_str, rest) = tail.split_at(e_pos);
    let element_str = &rest[1..];
    if snapshot_str.is_empty() || element_str.is_empty() {
        return None;
    }
    if !snapshot_str.bytes().all(|b| b.is_ascii_digit()) || !element_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let snapshot = snapshot_str.parse::<u64>().ok()?;
    let element = element_str.parse::<u64>().ok()?;
    Some((snapshot, element))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_frame() {
        let r = ElementRef::parse("f0s1e7").unwrap();
        assert_eq!(r.frame, "0");
        assert_eq!(r.snapshot, 1);
        assert_eq!(r.element, 7);
        assert_eq!(r.to_string(), "f0s1e7");
    }

    #[test]
    fn parses_named_frame() {
        let r = ElementRef::parse("fcheckouts3e12").unwrap();
        assert_eq!(r.frame, "checkout");
        assert_eq!(r.snapshot, 3);
        assert_eq!(r.element, 12);
    }

    #[test]
    fn rejects_non_ref_selectors() {
        assert!(ElementRef::parse("#submit").is_none());
        assert!(ElementRef::parse("div.foo").is_none());
        assert!(ElementRef::parse("fxse1").is_none());
    }

    #[test]
    fn frame_name_containing_s_does_not_confuse_the_delimiter() {
        // Frame name "users" embeds an 's'; naively splitting at the first
        // 's' in the string yields an empty frame name and fails to parse.
        let r = ElementRef::parse("fuserss2e5").unwrap();
        assert_eq!(r.frame, "users");
        assert_eq!(r.snapshot, 2);
        assert_eq!(r.element, 5);
        assert_eq!(r.to_string(), "fuserss2e5");
    }
}
