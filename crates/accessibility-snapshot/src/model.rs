use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Summary,
    Interactive,
    #[default]
    Full,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotOptions {
    #[serde(default)]
    pub detail: DetailLevel,
    #[serde(default)]
    pub pierce_shadow: bool,
    #[serde(default)]
    pub include_frames: bool,
    #[serde(default)]
    pub viewport_only: bool,
    /// Caller-supplied fingerprint from a prior snapshot; matching means
    /// the page hasn't meaningfully changed since.
    pub since: Option<String>,
    /// Bytes above which the caller should spill `text` to a file instead
    /// of returning it inline. Defaults to spec's ~9 KB.
    pub inline_limit: Option<usize>,
}

/// A single accessibility-tree node, keyed by its `f{F}s{S}e{N}` ref.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessibilityNode {
    #[serde(rename = "ref")]
    pub ref_id: String,
    pub role: String,
    pub name: String,
    pub level: Option<u32>,
    pub states: Vec<String>,
    pub in_viewport: bool,
    pub depth: usize,
    pub cross_origin_frame: bool,
    #[serde(default)]
    pub landmark_path: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub fingerprint: String,
    pub nodes: Vec<AccessibilityNode>,
    pub text: String,
}

/// Returned to callers so the inline-limit spill decision (which requires a
/// filesystem port this crate doesn't own) happens one layer up.
#[derive(Clone, Debug)]
pub enum SnapshotOutput {
    Unchanged { snapshot_id: String },
    Inline(Snapshot),
    TooLarge { snapshot: Snapshot, byte_len: usize },
}
