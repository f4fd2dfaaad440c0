//! Site profile port: the core's contract with the markdown-per-domain
//! store is exactly two operations (§6 "File formats" / site profiles).
//! The concrete filesystem implementation is an external collaborator
//! (binary crate); this trait is what `readSiteProfile`/`writeSiteProfile`
//! and the runner's new-domain detection call through.

use async_trait::async_trait;

#[async_trait]
pub trait SiteProfileStore: Send + Sync {
    async fn read(&self, domain: &str) -> Option<String>;
    async fn write(&self, domain: &str, content: &str) -> Result<String, String>;
}

/// No-op fallback used when the caller doesn't wire a real store; every
/// domain looks new and writes are accepted but not persisted.
pub struct NullSiteProfileStore;

#[async_trait]
impl SiteProfileStore for NullSiteProfileStore {
    async fn read(&self, _domain: &str) -> Option<String> {
        None
    }

    async fn write(&self, domain: &str, _content: &str) -> Result<String, String> {
        Ok(format!("(not persisted: no site-profile store configured for {domain})"))
    }
}
