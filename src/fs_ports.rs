//! Filesystem-backed implementations of the `step-engine` external-
//! collaborator ports (SPEC_FULL §3): the library crates only ever see
//! the trait, this binary is the "something behind each trait" that
//! makes the tool run end-to-end against a real disk.

use std::path::PathBuf;

use async_trait::async_trait;
use step_engine::{PdfSink, ScreenshotSink, SiteProfileStore, SnapshotSink};
use tracing::debug;

/// One markdown file per domain at `$HOME/.cdp-skill/sites/<domain>.md`
/// (spec §6 "File formats"). The core's contract is exactly the two
/// operations below; interpreting the markdown is the agent's job.
pub struct FsSiteProfileStore {
    dir: PathBuf,
}

impl FsSiteProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{}.md", sanitize(domain)))
    }
}

#[async_trait]
impl SiteProfileStore for FsSiteProfileStore {
    async fn read(&self, domain: &str) -> Option<String> {
        let path = self.path_for(domain);
        tokio::fs::read_to_string(&path).await.ok()
    }

    async fn write(&self, domain: &str, content: &str) -> Result<String, String> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| e.to_string())?;
        let path = self.path_for(domain);
        tokio::fs::write(&path, content).await.map_err(|e| e.to_string())?;
        debug!(target: "cdp-skill", domain, path = %path.display(), "wrote site profile");
        Ok(path.display().to_string())
    }
}

/// PNG files at `<tmp>/<alias>.before.png` / `.after.png`.
pub struct FsScreenshotSink {
    tmp_dir: PathBuf,
}

impl FsScreenshotSink {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self { tmp_dir: tmp_dir.into() }
    }
}

#[async_trait]
impl ScreenshotSink for FsScreenshotSink {
    async fn write(&self, alias: &str, phase: &str, png_bytes: &[u8]) -> Result<String, String> {
        tokio::fs::create_dir_all(&self.tmp_dir).await.map_err(|e| e.to_string())?;
        let path = self.tmp_dir.join(format!("{}.{}.png", sanitize(alias), phase));
        tokio::fs::write(&path, png_bytes).await.map_err(|e| e.to_string())?;
        Ok(path.display().to_string())
    }
}

/// YAML-like accessibility snapshot text at `<tmp>/<alias>.snapshot.yaml`,
/// written only once the inline form overflows the inline limit (C8).
pub struct FsSnapshotSink {
    tmp_dir: PathBuf,
}

impl FsSnapshotSink {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self { tmp_dir: tmp_dir.into() }
    }
}

#[async_trait]
impl SnapshotSink for FsSnapshotSink {
    async fn write(&self, alias: &str, yaml: &str) -> Result<String, String> {
        tokio::fs::create_dir_all(&self.tmp_dir).await.map_err(|e| e.to_string())?;
        let path = self.tmp_dir.join(format!("{}.snapshot.yaml", sanitize(alias)));
        tokio::fs::write(&path, yaml).await.map_err(|e| e.to_string())?;
        Ok(path.display().to_string())
    }
}

/// PDF exports at `<tmp>/<alias>.pdf`, or at the step's own `path` param
/// when one was given (spec.md `pdf | path, options | file info`).
pub struct FsPdfSink {
    tmp_dir: PathBuf,
}

impl FsPdfSink {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self { tmp_dir: tmp_dir.into() }
    }
}

#[async_trait]
impl PdfSink for FsPdfSink {
    async fn write(&self, alias: &str, requested_path: Option<&str>, pdf_bytes: &[u8]) -> Result<String, String> {
        let path = match requested_path {
            Some(p) => PathBuf::from(p),
            None => {
                tokio::fs::create_dir_all(&self.tmp_dir).await.map_err(|e| e.to_string())?;
                self.tmp_dir.join(format!("{}.pdf", sanitize(alias)))
            }
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&path, pdf_bytes).await.map_err(|e| e.to_string())?;
        debug!(target: "cdp-skill", alias, path = %path.display(), "wrote pdf export");
        Ok(path.display().to_string())
    }
}

/// Tab aliases and domains are expected to already be filesystem-safe
/// (`t1`, `example.com`), but anything containing a path separator is
/// collapsed rather than trusted, since both feed directly into a path.
fn sanitize(raw: &str) -> String {
    raw.chars().map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn site_profile_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSiteProfileStore::new(dir.path());
        assert!(store.read("example.com").await.is_none());
        let path = store.write("example.com", "# notes").await.unwrap();
        assert!(PathBuf::from(&path).exists());
        assert_eq!(store.read("example.com").await.as_deref(), Some("# notes"));
    }

    #[tokio::test]
    async fn screenshot_sink_writes_png_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsScreenshotSink::new(dir.path());
        let path = sink.write("t1", "before", b"\x89PNG").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn pdf_sink_defaults_to_alias_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsPdfSink::new(dir.path());
        let path = sink.write("t1", None, b"%PDF-1.4").await.unwrap();
        assert!(path.ends_with("t1.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn pdf_sink_honors_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsPdfSink::new(dir.path().join("unused"));
        let explicit = dir.path().join("custom.pdf");
        let path = sink.write("t1", Some(explicit.to_str().unwrap()), b"%PDF-1.4").await.unwrap();
        assert_eq!(PathBuf::from(&path), explicit);
    }

    #[test]
    fn sanitize_collapses_path_separators() {
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
    }
}
