//! Command context assembly (§4.11 steps 6-7) and the failure-context
//! augmentation (§4.11 "Failure context"): capped visible controls plus a
//! fuzzy near-match list scored on substring-and-role proximity.

use core_types::FrameId;
use element_locator::js::wrap;
use page_controller::PageController;
use serde_json::Value;

use crate::error::StepError;
use crate::model::{CommandContext, ScrollInfo, ViewportInfo};

const VISIBLE_CONTROLS_CAP: usize = 20;
const NEAR_MATCHES_CAP: usize = 10;

/// Assembles `{url, title, scroll, viewport, activeElement?, modal?}` from
/// one evaluation so it reflects a single consistent paint.
pub async fn assemble(page: &PageController, frame: &FrameId) -> Result<CommandContext, StepError> {
    let body = r#"
        const active = document.activeElement;
        const dialog = document.querySelector('dialog[open], [role="dialog"], [role="alertdialog"]');
        return {
          url: location.href,
          title: document.title,
          scrollY: window.scrollY,
          scrollPercent: document.documentElement.scrollHeight > window.innerHeight
            ? (window.scrollY / (document.documentElement.scrollHeight - window.innerHeight)) * 100
            : 0,
          viewportWidth: window.innerWidth,
          viewportHeight: window.innerHeight,
          activeElement: (active && active !== document.body)
            ? { role: window.__cdpRole(active), name: window.__cdpAccessibleName(active) }
            : null,
          modal: dialog ? { role: window.__cdpRole(dialog), name: window.__cdpAccessibleName(dialog) } : null,
        };
    "#;
    let value = page.evaluate_in_frame(frame, &wrap(body)).await?;

    Ok(CommandContext {
        url: value.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        title: value.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        scroll: Some(ScrollInfo {
            y: value.get("scrollY").and_then(|v| v.as_f64()).unwrap_or(0.0),
            percent: value.get("scrollPercent").and_then(|v| v.as_f64()).unwrap_or(0.0),
        }),
        viewport: Some(ViewportInfo {
            width: value.get("viewportWidth").and_then(|v| v.as_f64()).unwrap_or(0.0),
            height: value.get("viewportHeight").and_then(|v| v.as_f64()).unwrap_or(0.0),
        }),
        active_element: value.get("activeElement").cloned().filter(|v| !v.is_null()),
        modal: value.get("modal").cloned().filter(|v| !v.is_null()),
        near_matches: None,
        visible_controls: None,
    })
}

/// Augments a context that's about to accompany a failed step: a capped
/// list of currently-visible buttons/links/error-text, and a fuzzy
/// near-match list scored against the locator/text the failed step wanted.
pub async fn augment_failure(
    page: &PageController,
    frame: &FrameId,
    context: &mut CommandContext,
    wanted: Option<&str>,
) -> Result<(), StepError> {
    let body = format!(
        r#"
        const controls = Array.from(document.querySelectorAll('button,a,input,select,textarea,[role]'))
          .filter((el) => window.__cdpIsVisible(el))
          .slice(0, {cap})
          .map((el) => ({{ role: window.__cdpRole(el), name: window.__cdpAccessibleName(el) }}));
        const errorText = Array.from(document.querySelectorAll('[role="alert"], .error, .error-message'))
          .filter((el) => window.__cdpIsVisible(el))
          .map((el) => (el.innerText || '').trim())
          .filter(Boolean)
          .slice(0, {cap});
        return {{ controls, errorText }};
        "#,
        cap = VISIBLE_CONTROLS_CAP,
    );
    let value = page.evaluate_in_frame(frame, &wrap(&body)).await?;
    let controls: Vec<Value> = value
        .get("controls")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    context.visible_controls = Some(controls.clone());

    if let Some(wanted) = wanted {
        let needle = wanted.to_lowercase();
        let mut scored: Vec<(i64, Value)> = controls
            .into_iter()
            .map(|c| {
                let name = c.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_lowercase();
                let role = c.get("role").and_then(|v| v.as_str()).unwrap_or_default();
                let score = fuzzy_score(&needle, &name, role, wanted);
                (score, c)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(NEAR_MATCHES_CAP);
        context.near_matches = Some(
            scored
                .into_iter()
                .map(|(score, mut c)| {
                    if let Value::Object(ref mut map) = c {
                        map.insert("score".to_string(), Value::from(score));
                    }
                    c
                })
                .collect(),
        );
    }

    Ok(())
}

/// Substring-and-role proximity, 0-100: exact name match scores highest,
/// a role hint embedded in `wanted` (e.g. `role=button name="Send"`) adds a
/// bonus, pure substring containment scores lower than a prefix match.
fn fuzzy_score(needle: &str, name: &str, role: &str, raw_wanted: &str) -> i64 {
    if needle.is_empty() || name.is_empty() {
        return 0;
    }
    let mut score = if name == needle {
        100
    } else if name.starts_with(needle) {
        80
    } else if name.contains(needle) {
        60
    } else if needle.contains(name) {
        40
    } else {
        0
    };
    if score > 0 && raw_wanted.to_lowercase().contains(role) {
        score = (score + 10).min(100);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_highest() {
        assert_eq!(fuzzy_score("send", "send", "button", "role=button name=\"send\""), 100);
    }

    #[test]
    fn substring_scores_lower_than_prefix() {
        let prefix = fuzzy_score("sub", "submit", "button", "submit");
        let substring = fuzzy_score("mit", "submit", "button", "submit");
        assert!(prefix > substring);
    }

    #[test]
    fn unrelated_name_scores_zero() {
        assert_eq!(fuzzy_score("send", "cancel", "button", "send"), 0);
    }
}
