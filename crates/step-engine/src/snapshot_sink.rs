//! Snapshot file spill is an external collaborator, same as screenshots
//! (§6 "File formats": `<tmp>/<alias>.snapshot.yaml`): the core renders the
//! YAML-like text but hands it to this port once it overflows the inline
//! limit rather than writing a file itself.

use async_trait::async_trait;

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, alias: &str, yaml: &str) -> Result<String, String>;
}

pub struct NullSnapshotSink;

#[async_trait]
impl SnapshotSink for NullSnapshotSink {
    async fn write(&self, alias: &str, _yaml: &str) -> Result<String, String> {
        Ok(format!("(not persisted: no snapshot sink configured for {alias})"))
    }
}
