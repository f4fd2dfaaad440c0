use core_types::FrameId;

/// An opaque reference to a live DOM node, valid as long as the page's
/// handle map (see `js.rs`) still holds it and the frame hasn't navigated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElementHandle {
    pub frame: FrameId,
    pub handle_id: String,
    pub describe: String,
    /// Set when this handle was recovered by the C12 Ref Resolver after the
    /// live lookup for an `ElementRef` came back stale (§4.12 step 4).
    pub re_resolved: bool,
}

impl ElementHandle {
    /// JS snippet fragment referring back to this handle; callers embed it in
    /// a larger expression via `js::wrap`.
    pub fn js_ref(&self) -> String {
        format!("window.__cdpGetHandle({:?})", self.handle_id)
    }
}
