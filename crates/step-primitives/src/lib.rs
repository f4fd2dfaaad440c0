//! Step Primitives: the shared low-level browser operations (click, fill,
//! hover, drag, selectOption, scroll, upload, selectText, submit) the step
//! executors (C10) are thin wrappers over. Each combines locator resolution
//! (`element-locator`), actionability gating (`actionability`), and
//! dispatch (`input-emulator` or direct JS).

pub mod click;
pub mod drag;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod hover;
pub mod scroll;
pub mod select;
pub mod select_text;
pub mod submit;
pub mod upload;

pub use click::{click, ClickOptions, ClickOutcome};
pub use drag::{drag, DragMethod, DragOptions, DragOutcome};
pub use error::PrimitiveError;
pub use fill::{fill, FillOptions, FillOutcome};
pub use hover::{hover, HoverOptions, HoverOutcome};
pub use scroll::{scroll, ScrollOutcome, ScrollTarget};
pub use select::{select_option, OptionMatch, SelectOutcome};
pub use select_text::{select_text, SelectTextOutcome};
pub use submit::{submit, SubmitOutcome};
pub use upload::{upload, UploadOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_options_default_to_single_left_click() {
        let opts = ClickOptions::default();
        assert_eq!(opts.button, "left");
        assert_eq!(opts.click_count, 1);
        assert!(!opts.js_click);
    }

    #[test]
    fn drag_options_default_to_auto_method() {
        let opts = DragOptions::default();
        assert_eq!(opts.method, DragMethod::Auto);
        assert!(opts.steps > 0);
    }
}
