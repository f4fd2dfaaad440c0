//! Mouse dispatch (§4.9): `mouseMoved` -> `mousePressed{clickCount}` ->
//! `mouseReleased`, with the button-to-mask table release uses mask `0` for.

use crate::error::InputError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

impl MouseButton {
    pub fn parse(name: &str) -> Result<Self, InputError> {
        match name {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" => Ok(Self::Middle),
            "back" => Ok(Self::Back),
            "forward" => Ok(Self::Forward),
            other => Err(InputError::InvalidButton(other.to_string())),
        }
    }

    pub fn cdp_name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
            Self::Back => "back",
            Self::Forward => "forward",
        }
    }

    /// Button bit used in the CDP `buttons` bitmask.
    pub fn mask(&self) -> i32 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 4,
            Self::Back => 8,
            Self::Forward => 16,
        }
    }
}

pub fn validate_coordinates(x: f64, y: f64) -> Result<(), InputError> {
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Err(InputError::InvalidCoordinate(x, y));
    }
    Ok(())
}

pub fn validate_click_count(count: i64) -> Result<u32, InputError> {
    if count <= 0 {
        return Err(InputError::InvalidClickCount(count));
    }
    Ok(count as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_masks_match_spec() {
        assert_eq!(MouseButton::Left.mask(), 1);
        assert_eq!(MouseButton::Right.mask(), 2);
        assert_eq!(MouseButton::Middle.mask(), 4);
        assert_eq!(MouseButton::Back.mask(), 8);
        assert_eq!(MouseButton::Forward.mask(), 16);
    }

    #[test]
    fn rejects_unknown_button() {
        assert!(MouseButton::parse("stylus").is_err());
    }

    #[test]
    fn rejects_negative_and_nonfinite_coordinates() {
        assert!(validate_coordinates(-1.0, 10.0).is_err());
        assert!(validate_coordinates(f64::NAN, 10.0).is_err());
        assert!(validate_coordinates(10.0, 10.0).is_ok());
    }

    #[test]
    fn rejects_nonpositive_click_count() {
        assert!(validate_click_count(0).is_err());
        assert!(validate_click_count(-1).is_err());
        assert!(validate_click_count(2).is_ok());
    }
}
