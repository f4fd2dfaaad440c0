//! Input Emulator (C9): dispatches `Input.dispatchMouseEvent` and
//! `Input.dispatchKeyEvent` the way a physical mouse/keyboard would,
//! combining the low-level commands into `click`/`type`/`press`/`fill`.

pub mod error;
pub mod keyboard;
pub mod keys;
pub mod mouse;

pub use error::InputError;
pub use keyboard::{parse_combo, Combo};
pub use keys::KeyDef;
pub use mouse::MouseButton;

use std::sync::Arc;

use cdp_transport::{CommandTarget, Transport};
use core_types::SessionId;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Os {
    Mac,
    Other,
}

pub struct InputEmulator {
    transport: Arc<Transport>,
    session: SessionId,
    os: Os,
}

impl InputEmulator {
    pub fn new(transport: Arc<Transport>, session: SessionId, os: Os) -> Self {
        Self { transport, session, os }
    }

    fn target(&self) -> CommandTarget {
        CommandTarget::Session(self.session.0.clone())
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, InputError> {
        self.transport
            .send(self.target(), method, params)
            .await
            .map_err(InputError::from)
    }

    async fn mouse_event(
        &self,
        event_type: &str,
        x: f64,
        y: f64,
        button: MouseButton,
        buttons_mask: i32,
        click_count: u32,
        modifiers: i32,
    ) -> Result<(), InputError> {
        self.send(
            "Input.dispatchMouseEvent",
            json!({
                "type": event_type,
                "x": x,
                "y": y,
                "button": button.cdp_name(),
                "buttons": buttons_mask,
                "clickCount": click_count,
                "modifiers": modifiers,
                "pointerType": "mouse",
            }),
        )
        .await?;
        Ok(())
    }

    /// `mouseMoved` -> `mousePressed{clickCount}` -> `mouseReleased`. The
    /// release event always dispatches with mask `0` (no buttons held).
    pub async fn click(&self, x: f64, y: f64, button: &str, click_count: i64, modifiers: i32) -> Result<(), InputError> {
        mouse::validate_coordinates(x, y)?;
        let button = MouseButton::parse(button)?;
        let count = mouse::validate_click_count(click_count)?;

        self.mouse_event("mouseMoved", x, y, button, 0, 0, modifiers).await?;
        self.mouse_event("mousePressed", x, y, button, button.mask(), count, modifiers).await?;
        self.mouse_event("mouseReleased", x, y, button, 0, count, modifiers).await?;
        Ok(())
    }

    pub async fn move_to(&self, x: f64, y: f64) -> Result<(), InputError> {
        mouse::validate_coordinates(x, y)?;
        self.mouse_event("mouseMoved", x, y, MouseButton::Left, 0, 0, 0).await
    }

    /// Low-level press/release pair, used directly by `drag`'s mouse
    /// strategy so it can interpolate `mouseMoved` steps in between.
    pub async fn mouse_down(&self, x: f64, y: f64, button: &str, modifiers: i32) -> Result<(), InputError> {
        mouse::validate_coordinates(x, y)?;
        let button = MouseButton::parse(button)?;
        self.mouse_event("mousePressed", x, y, button, button.mask(), 1, modifiers).await
    }

    pub async fn mouse_up(&self, x: f64, y: f64, button: &str, modifiers: i32) -> Result<(), InputError> {
        mouse::validate_coordinates(x, y)?;
        let button = MouseButton::parse(button)?;
        self.mouse_event("mouseReleased", x, y, button, 0, 1, modifiers).await
    }

    async fn key_event(&self, event_type: &str, def: &KeyDef, modifiers: i32, text: Option<&str>) -> Result<(), InputError> {
        let mut params = json!({
            "type": event_type,
            "key": def.key,
            "code": def.code,
            "windowsVirtualKeyCode": def.windows_virtual_key_code,
            "nativeVirtualKeyCode": def.windows_virtual_key_code,
            "modifiers": modifiers,
        });
        if let Some(text) = text {
            params["text"] = json!(text);
        }
        self.send("Input.dispatchKeyEvent", params).await?;
        Ok(())
    }

    /// `rawKeyDown` -> optional `char` (only for keys with a printable
    /// representation) -> `keyUp`.
    pub async fn press(&self, key: &str) -> Result<(), InputError> {
        self.press_with_modifiers(key, 0).await
    }

    pub async fn press_with_modifiers(&self, key: &str, modifiers: i32) -> Result<(), InputError> {
        let def = keys::lookup(key)?;
        self.key_event("rawKeyDown", &def, modifiers, None).await?;
        if let Some(text) = def.text {
            self.key_event("char", &def, modifiers, Some(text)).await?;
        }
        self.key_event("keyUp", &def, modifiers, None).await?;
        Ok(())
    }

    /// Parses `"Control+Shift+Enter"` style combos and dispatches the
    /// trailing key with the folded modifier mask.
    pub async fn press_combo(&self, combo: &str) -> Result<(), InputError> {
        let parsed = parse_combo(combo)?;
        self.press_with_modifiers(parsed.main_key.key, parsed.modifiers).await
    }

    /// One `char` event per Unicode code point, so emoji sequences dispatch
    /// as their constituent code points rather than one opaque event.
    pub async fn type_text(&self, text: &str) -> Result<(), InputError> {
        for ch in keyboard::code_points(text) {
            let mut buf = [0u8; 4];
            let s = ch.encode_utf8(&mut buf);
            self.send(
                "Input.dispatchKeyEvent",
                json!({
                    "type": "char",
                    "text": s,
                    "unmodifiedText": s,
                    "modifiers": 0,
                }),
            )
            .await?;
        }
        debug!(target: "input-emulator", len = text.chars().count(), "typed text");
        Ok(())
    }

    /// `click(x, y)` -> OS-aware select-all -> `type(value)`.
    pub async fn fill(&self, x: f64, y: f64, value: &str) -> Result<(), InputError> {
        self.click(x, y, "left", 1, 0).await?;
        let select_all = match self.os {
            Os::Mac => "Meta+A",
            Os::Other => "Control+A",
        };
        self.press_combo(select_all).await?;
        self.type_text(value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_all_combo_is_os_aware() {
        assert_eq!(
            match Os::Mac {
                Os::Mac => "Meta+A",
                Os::Other => "Control+A",
            },
            "Meta+A"
        );
        assert_eq!(
            match Os::Other {
                Os::Mac => "Meta+A",
                Os::Other => "Control+A",
            },
            "Control+A"
        );
    }
}
