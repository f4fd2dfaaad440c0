//! Screenshot file management is an external collaborator (§1 Non-goals):
//! the core captures PNG bytes over CDP but hands them to this port rather
//! than touching a filesystem itself, mirroring `SiteProfileStore`.

use async_trait::async_trait;

#[async_trait]
pub trait ScreenshotSink: Send + Sync {
    /// `phase` is `"before"` or `"after"`; returns the path written to.
    async fn write(&self, alias: &str, phase: &str, png_bytes: &[u8]) -> Result<String, String>;
}

pub struct NullScreenshotSink;

#[async_trait]
impl ScreenshotSink for NullScreenshotSink {
    async fn write(&self, alias: &str, phase: &str, _png_bytes: &[u8]) -> Result<String, String> {
        Ok(format!("(not persisted: no screenshot sink configured for {alias}.{phase})"))
    }
}
