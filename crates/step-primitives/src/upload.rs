//! Upload primitive: reads file bytes locally and hands them to the page
//! as a synthetic `File`/`DataTransfer` pair, since CDP's `DOM.setFileInputFiles`
//! needs a backend node id this driver's handle map deliberately avoids
//! threading through every crate (see `element_locator::js`).

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use core_types::{FrameId, Locator};
use element_locator::{js::wrap, ResolveOptions};
use page_controller::PageController;
use serde::Serialize;

use crate::error::PrimitiveError;

#[derive(Clone, Debug, Serialize)]
pub struct UploadOutcome {
    pub files: Vec<String>,
}

pub async fn upload(
    page: &PageController,
    frame: &FrameId,
    locator: &Locator,
    paths: &[impl AsRef<Path>],
) -> Result<UploadOutcome, PrimitiveError> {
    let handle = element_locator::resolve(page, frame, locator, ResolveOptions::default()).await?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PrimitiveError::Unsupported(format!("cannot read {}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess(path);
        files.push(serde_json::json!({
            "name": name,
            "mime": mime,
            "base64": STANDARD.encode(&bytes),
        }));
    }
    let files_json = serde_json::to_string(&files).unwrap_or_else(|_| "[]".to_string());

    let body = format!(
        "const el = {js_ref};\n\
         if (!el) return [];\n\
         const dt = new DataTransfer();\n\
         const entries = {files_json};\n\
         for (const f of entries) {{\n\
           const binary = atob(f.base64);\n\
           const bytes = new Uint8Array(binary.length);\n\
           for (let i = 0; i < binary.length; i++) bytes[i] = binary.charCodeAt(i);\n\
           dt.items.add(new File([bytes], f.name, {{ type: f.mime }}));\n\
         }}\n\
         Object.defineProperty(el, 'files', {{ value: dt.files, configurable: true }});\n\
         el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
         el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
         return Array.from(el.files).map((f) => f.name);",
        js_ref = handle.js_ref(),
    );

    let value = page.evaluate_in_frame(&handle.frame, &wrap(&body)).await?;
    let names = value
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    Ok(UploadOutcome { files: names })
}

fn mime_guess(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
