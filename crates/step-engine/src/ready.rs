//! Shared JS-predicate polling for `readyWhen`/`settledWhen` hooks and the
//! `wait`/`poll` step kinds: evaluate an expression every tick until it's
//! truthy or the deadline elapses.

use std::time::Duration;

use core_types::FrameId;
use element_locator::js::wrap;
use page_controller::PageController;
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::error::StepError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

/// Evaluates `expression` (a `() => …` body or bare expression) once and
/// returns its value, used by `observe` (single evaluation, no polling).
pub async fn evaluate_once(page: &PageController, frame: &FrameId, expression: &str) -> Result<Value, StepError> {
    let body = format!("const fn = ({expression});\nreturn (typeof fn === 'function') ? fn() : fn;");
    Ok(page.evaluate_in_frame(frame, &wrap(&body)).await?)
}

/// Polls `expression` until truthy or `deadline` elapses.
pub async fn poll_until_truthy(
    page: &PageController,
    frame: &FrameId,
    expression: &str,
    deadline: Duration,
) -> Result<Value, StepError> {
    let start = Instant::now();
    loop {
        let value = evaluate_once(page, frame, expression).await?;
        if is_truthy(&value) {
            return Ok(value);
        }
        if start.elapsed() >= deadline {
            return Err(StepError::Page(page_controller::PageError::Timeout(format!(
                "predicate never became truthy: {expression}"
            ))));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// `poll` step kind: like `poll_until_truthy` but reports the outcome
/// instead of erroring on timeout, so the caller decides what to do next.
pub async fn poll_report(
    page: &PageController,
    frame: &FrameId,
    expression: &str,
    interval: Duration,
    deadline: Duration,
) -> Result<Value, StepError> {
    let start = Instant::now();
    let mut last_value = Value::Null;
    loop {
        let value = evaluate_once(page, frame, expression).await?;
        last_value = value.clone();
        if is_truthy(&value) {
            return Ok(serde_json::json!({ "resolved": true, "value": value, "elapsed": start.elapsed().as_millis() }));
        }
        if start.elapsed() >= deadline {
            return Ok(serde_json::json!({ "resolved": false, "lastValue": last_value, "elapsed": start.elapsed().as_millis() }));
        }
        sleep(interval.max(Duration::from_millis(10))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_js_semantics() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::Bool(false)));
        assert!(!is_truthy(&Value::String(String::new())));
        assert!(is_truthy(&Value::String("x".to_string())));
        assert!(is_truthy(&serde_json::json!({})));
    }
}
