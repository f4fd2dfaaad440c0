//! Wire shapes for the step list input and the final command report (§3/§6).
//!
//! A step is "a discriminated value keyed by its sole own property from a
//! closed set" — rather than fight serde's untagged-enum ambiguity across
//! ~40 similarly-shaped variants, a step is parsed as a bag of meta keys
//! (`optional`/`readyWhen`/`settledWhen`/`observe`/`timeout`) plus exactly
//! one remaining key, which names the kind.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const META_KEYS: &[&str] = &["optional", "readyWhen", "settledWhen", "observe", "timeout"];

#[derive(Clone, Debug, Default)]
pub struct StepHooks {
    pub optional: bool,
    pub ready_when: Option<String>,
    pub settled_when: Option<String>,
    pub observe: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct RawStep {
    pub kind: String,
    pub params: Value,
    pub hooks: StepHooks,
}

impl RawStep {
    /// Parses one step object out of the input list. Returns a `Validation`
    /// message (not a panic) on anything the runner should report as a
    /// per-command parse failure rather than crash on.
    pub fn parse(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "step must be a JSON object".to_string())?;

        let mut kind = None;
        for (key, val) in obj {
            if META_KEYS.contains(&key.as_str()) {
                continue;
            }
            if kind.is_some() {
                return Err(format!("step has more than one action key: {key}"));
            }
            kind = Some((key.clone(), val.clone()));
        }
        let (kind, params) = kind.ok_or_else(|| "step has no action key".to_string())?;

        let optional = obj.get("optional").and_then(|v| v.as_bool()).unwrap_or(false);
        let ready_when = obj.get("readyWhen").and_then(|v| v.as_str()).map(str::to_string);
        let settled_when = obj.get("settledWhen").and_then(|v| v.as_str()).map(str::to_string);
        let observe = obj.get("observe").and_then(|v| v.as_str()).map(str::to_string);
        let timeout = obj
            .get("timeout")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis);

        Ok(RawStep {
            kind,
            params,
            hooks: StepHooks {
                optional,
                ready_when,
                settled_when,
                observe,
                timeout,
            },
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandInput {
    pub tab: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub config: Option<Value>,
    pub steps: Vec<Value>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Error,
    Skipped,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepResult {
    pub action: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScrollInfo {
    pub y: f64,
    pub percent: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewportInfo {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CommandContext {
    pub url: String,
    pub title: String,
    pub scroll: Option<ScrollInfo>,
    pub viewport: Option<ViewportInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_element: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_matches: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_controls: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Changes {
    pub summary: String,
    pub added: Vec<Value>,
    pub removed: Vec<Value>,
    pub changed: Vec<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ConsoleReport {
    pub errors: usize,
    pub warnings: usize,
    pub messages: Vec<Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActionRequired {
    pub action: String,
    pub domain: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorEntry {
    pub step: usize,
    pub action: String,
    pub error: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct CommandOutput {
    pub status: &'static str,
    pub tab: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_required: Option<ActionRequired>,
    pub context: CommandContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_snapshot: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Changes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleReport>,
    pub steps: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_kind_and_hooks() {
        let step = json!({ "click": { "selector": "#go" }, "optional": true, "timeout": 5000 });
        let raw = RawStep::parse(&step).unwrap();
        assert_eq!(raw.kind, "click");
        assert!(raw.hooks.optional);
        assert_eq!(raw.hooks.timeout, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn rejects_step_with_two_action_keys() {
        let step = json!({ "click": {}, "fill": {} });
        assert!(RawStep::parse(&step).is_err());
    }

    #[test]
    fn rejects_step_with_no_action_key() {
        let step = json!({ "optional": true });
        assert!(RawStep::parse(&step).is_err());
    }
}
