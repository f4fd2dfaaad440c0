//! PDF file management is an external collaborator (§1 Non-goals), same
//! shape as `ScreenshotSink`/`SnapshotSink`: the core issues
//! `Page.printToPDF` and decodes the returned base64 payload, but hands the
//! bytes to this port rather than touching a filesystem itself.

use async_trait::async_trait;

#[async_trait]
pub trait PdfSink: Send + Sync {
    /// `requested_path` is the step's own `path` param, if the caller gave
    /// one; `None` means the sink picks a default location keyed by `alias`.
    async fn write(&self, alias: &str, requested_path: Option<&str>, pdf_bytes: &[u8]) -> Result<String, String>;
}

pub struct NullPdfSink;

#[async_trait]
impl PdfSink for NullPdfSink {
    async fn write(&self, alias: &str, _requested_path: Option<&str>, _pdf_bytes: &[u8]) -> Result<String, String> {
        Ok(format!("(not persisted: no pdf sink configured for {alias})"))
    }
}
