//! Keyboard dispatch support (§4.9): combo parsing for `pressCombo` and the
//! Unicode code-point splitting `type(text)` dispatches one `char` event per.

use crate::error::InputError;
use crate::keys::{self, KeyDef};

#[derive(Clone, Debug)]
pub struct Combo {
    pub modifiers: i32,
    pub main_key: KeyDef,
}

/// Parses `"Control+Shift+Enter"` into a modifier mask and the trailing,
/// non-modifier key. `Cmd`/`Ctrl` are accepted as aliases for each other's
/// platform-native meaning, per `keys::modifier_bit`.
pub fn parse_combo(combo: &str) -> Result<Combo, InputError> {
    let parts: Vec<&str> = combo.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
    let (modifier_parts, key_parts): (Vec<&str>, Vec<&str>) =
        parts.iter().partition(|p| keys::modifier_bit(p).is_some());

    let modifiers = modifier_parts.iter().fold(0, |acc, name| acc | keys::modifier_bit(name).unwrap_or(0));

    let key_name = key_parts
        .last()
        .ok_or_else(|| InputError::UnknownKey(combo.to_string()))?;
    let main_key = keys::lookup(key_name)?;

    Ok(Combo { modifiers, main_key })
}

/// Splits `text` into the Unicode code points `type(text)` dispatches one
/// `char` event per, so multi-code-point emoji sequences fan out correctly.
pub fn code_points(text: &str) -> Vec<char> {
    text.chars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_modifier_combo() {
        let combo = parse_combo("Control+Shift+Enter").unwrap();
        assert_eq!(combo.modifiers, keys::MODIFIER_CTRL | keys::MODIFIER_SHIFT);
        assert_eq!(combo.main_key.key, "Enter");
    }

    #[test]
    fn cmd_and_ctrl_are_interchangeable_as_modifier_names() {
        let a = parse_combo("Cmd+A").unwrap();
        let b = parse_combo("Ctrl+A").unwrap();
        assert_eq!(a.main_key.key, b.main_key.key);
    }

    #[test]
    fn code_points_splits_by_codepoint_not_byte() {
        let points = code_points("a👍b");
        assert_eq!(points.len(), 3);
    }
}
