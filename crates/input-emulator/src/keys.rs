//! Key table (§4.9): `{key, code, windowsVirtualKeyCode}` for the common
//! keys `press`/`pressCombo` accept, plus the modifier bit each name maps
//! to so combos can be OR-combined into a single CDP `modifiers` value.

use crate::error::InputError;

#[derive(Clone, Copy, Debug)]
pub struct KeyDef {
    pub key: &'static str,
    pub code: &'static str,
    pub windows_virtual_key_code: i32,
    /// Printable text this key produces, when it has one (letters, digits,
    /// punctuation, space) - drives whether a `char` event is dispatched.
    pub text: Option<&'static str>,
}

pub const MODIFIER_ALT: i32 = 1;
pub const MODIFIER_CTRL: i32 = 2;
pub const MODIFIER_META: i32 = 4;
pub const MODIFIER_SHIFT: i32 = 8;

pub fn lookup(key: &str) -> Result<KeyDef, InputError> {
    let def = match key {
        "Enter" => KeyDef { key: "Enter", code: "Enter", windows_virtual_key_code: 13, text: None },
        "Tab" => KeyDef { key: "Tab", code: "Tab", windows_virtual_key_code: 9, text: None },
        "Escape" => KeyDef { key: "Escape", code: "Escape", windows_virtual_key_code: 27, text: None },
        "Backspace" => KeyDef { key: "Backspace", code: "Backspace", windows_virtual_key_code: 8, text: None },
        "Delete" => KeyDef { key: "Delete", code: "Delete", windows_virtual_key_code: 46, text: None },
        "Space" | " " => KeyDef { key: " ", code: "Space", windows_virtual_key_code: 32, text: Some(" ") },
        "ArrowUp" => KeyDef { key: "ArrowUp", code: "ArrowUp", windows_virtual_key_code: 38, text: None },
        "ArrowDown" => KeyDef { key: "ArrowDown", code: "ArrowDown", windows_virtual_key_code: 40, text: None },
        "ArrowLeft" => KeyDef { key: "ArrowLeft", code: "ArrowLeft", windows_virtual_key_code: 37, text: None },
        "ArrowRight" => KeyDef { key: "ArrowRight", code: "ArrowRight", windows_virtual_key_code: 39, text: None },
        "Home" => KeyDef { key: "Home", code: "Home", windows_virtual_key_code: 36, text: None },
        "End" => KeyDef { key: "End", code: "End", windows_virtual_key_code: 35, text: None },
        "PageUp" => KeyDef { key: "PageUp", code: "PageUp", windows_virtual_key_code: 33, text: None },
        "PageDown" => KeyDef { key: "PageDown", code: "PageDown", windows_virtual_key_code: 34, text: None },
        "Control" | "Ctrl" => KeyDef { key: "Control", code: "ControlLeft", windows_virtual_key_code: 17, text: None },
        "Shift" => KeyDef { key: "Shift", code: "ShiftLeft", windows_virtual_key_code: 16, text: None },
        "Alt" => KeyDef { key: "Alt", code: "AltLeft", windows_virtual_key_code: 18, text: None },
        "Meta" | "Cmd" | "Command" => KeyDef { key: "Meta", code: "MetaLeft", windows_virtual_key_code: 91, text: None },
        "F1" => f_key(1, 112),
        "F2" => f_key(2, 113),
        "F3" => f_key(3, 114),
        "F4" => f_key(4, 115),
        "F5" => f_key(5, 116),
        "F6" => f_key(6, 117),
        "F7" => f_key(7, 118),
        "F8" => f_key(8, 119),
        "F9" => f_key(9, 120),
        "F10" => f_key(10, 121),
        "F11" => f_key(11, 122),
        "F12" => f_key(12, 123),
        other => return lookup_alnum(other),
    };
    Ok(def)
}

fn f_key(n: u8, vk: i32) -> KeyDef {
    match n {
        1 => KeyDef { key: "F1", code: "F1", windows_virtual_key_code: vk, text: None },
        2 => KeyDef { key: "F2", code: "F2", windows_virtual_key_code: vk, text: None },
        3 => KeyDef { key: "F3", code: "F3", windows_virtual_key_code: vk, text: None },
        4 => KeyDef { key: "F4", code: "F4", windows_virtual_key_code: vk, text: None },
        5 => KeyDef { key: "F5", code: "F5", windows_virtual_key_code: vk, text: None },
        6 => KeyDef { key: "F6", code: "F6", windows_virtual_key_code: vk, text: None },
        7 => KeyDef { key: "F7", code: "F7", windows_virtual_key_code: vk, text: None },
        8 => KeyDef { key: "F8", code: "F8", windows_virtual_key_code: vk, text: None },
        9 => KeyDef { key: "F9", code: "F9", windows_virtual_key_code: vk, text: None },
        10 => KeyDef { key: "F10", code: "F10", windows_virtual_key_code: vk, text: None },
        11 => KeyDef { key: "F11", code: "F11", windows_virtual_key_code: vk, text: None },
        _ => KeyDef { key: "F12", code: "F12", windows_virtual_key_code: vk, text: None },
    }
}

fn lookup_alnum(key: &str) -> Result<KeyDef, InputError> {
    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(InputError::UnknownKey(key.to_string()));
    };
    if c.is_ascii_alphabetic() {
        let upper = c.to_ascii_uppercase();
        let vk = 65 + (upper as i32 - 'A' as i32);
        let code: &'static str = LETTER_CODES[(upper as u8 - b'A') as usize];
        let text: &'static str = LETTER_TEXT[(c.to_ascii_lowercase() as u8 - b'a') as usize];
        return Ok(KeyDef { key: LETTER_KEY[(c.to_ascii_lowercase() as u8 - b'a') as usize], code, windows_virtual_key_code: vk, text: Some(text) });
    }
    if c.is_ascii_digit() {
        let idx = (c as u8 - b'0') as usize;
        let vk = 48 + idx as i32;
        return Ok(KeyDef {
            key: DIGIT_KEY[idx],
            code: DIGIT_CODES[idx],
            windows_virtual_key_code: vk,
            text: Some(DIGIT_KEY[idx]),
        });
    }
    Err(InputError::UnknownKey(key.to_string()))
}

const LETTER_KEY: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
];
const LETTER_TEXT: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
];
const LETTER_CODES: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK", "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ",
    "KeyR", "KeyS", "KeyT", "KeyU", "KeyV", "KeyW", "KeyX", "KeyY", "KeyZ",
];
const DIGIT_KEY: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
const DIGIT_CODES: [&str; 10] = [
    "Digit0", "Digit1", "Digit2", "Digit3", "Digit4", "Digit5", "Digit6", "Digit7", "Digit8", "Digit9",
];

/// Modifier names as they appear in `pressCombo("Control+Shift+Enter")`,
/// folding `Cmd`/`Ctrl` to the same CDP modifier bit per platform.
pub fn modifier_bit(name: &str) -> Option<i32> {
    match name {
        "Alt" | "Option" => Some(MODIFIER_ALT),
        "Control" | "Ctrl" => Some(MODIFIER_CTRL),
        "Meta" | "Cmd" | "Command" => Some(MODIFIER_META),
        "Shift" => Some(MODIFIER_SHIFT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_lookup_has_text_and_code() {
        let def = lookup("a").unwrap();
        assert_eq!(def.code, "KeyA");
        assert_eq!(def.text, Some("a"));
    }

    #[test]
    fn enter_has_no_printable_text_override() {
        let def = lookup("Enter").unwrap();
        assert_eq!(def.windows_virtual_key_code, 13);
    }

    #[test]
    fn unknown_key_errors() {
        assert!(lookup("Unobtainium").is_err());
    }

    #[test]
    fn modifier_aliases_fold_together() {
        assert_eq!(modifier_bit("Ctrl"), modifier_bit("Control"));
        assert_eq!(modifier_bit("Cmd"), modifier_bit("Meta"));
    }
}
