//! Locator shapes accepted anywhere a step names an element (§4.6).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    /// Multiple candidate CSS selectors, first match wins.
    MultiSelector { selectors: Vec<String> },
    /// Visible-text matcher.
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
        #[serde(default, rename = "caseSensitive")]
        case_sensitive: bool,
    },
    /// ARIA role + accessible-name matcher.
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "nameExact")]
        name_exact: Option<bool>,
        #[serde(default, rename = "nameRegex")]
        name_regex: Option<String>,
        #[serde(default)]
        level: Option<u8>,
        #[serde(default)]
        checked: Option<bool>,
        #[serde(default)]
        disabled: Option<bool>,
    },
    /// Viewport coordinates, resolved via `document.elementFromPoint`.
    Point { x: f64, y: f64 },
    /// A bare string: either a CSS selector or a ref (`f{F}s{S}e{N}`).
    /// Disambiguated at resolution time via `ElementRef::parse`, not here.
    Selector(String),
}

impl Locator {
    pub fn as_ref_string(&self) -> Option<&str> {
        match self {
            Locator::Selector(s) => Some(s),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Locator::Selector(s) => s.clone(),
            Locator::MultiSelector { selectors } => selectors.join(" | "),
            Locator::Text { text, .. } => format!("text={text:?}"),
            Locator::Role { role, name, .. } => match name {
                Some(n) => format!("role={role} name={n:?}"),
                None => format!("role={role}"),
            },
            Locator::Point { x, y } => format!("point=({x},{y})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_is_selector() {
        let l: Locator = serde_json::from_str("\"#submit\"").unwrap();
        assert!(matches!(l, Locator::Selector(s) if s == "#submit"));
    }

    #[test]
    fn role_object_parses() {
        let l: Locator =
            serde_json::from_str(r#"{"role":"button","name":"Send"}"#).unwrap();
        match l {
            Locator::Role { role, name, .. } => {
                assert_eq!(role, "button");
                assert_eq!(name.as_deref(), Some("Send"));
            }
            _ => panic!("expected Role"),
        }
    }

    #[test]
    fn point_object_parses() {
        let l: Locator = serde_json::from_str(r#"{"x":10,"y":20}"#).unwrap();
        assert!(matches!(l, Locator::Point { x, y } if x == 10.0 && y == 20.0));
    }
}
