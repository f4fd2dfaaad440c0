//! Tab Alias Store (C3): process-external mapping from stable short
//! aliases (`t1`, `t2`, ...) to browser target ids, persisted across CLI
//! invocations at `<tmp>/cdp-skill-tabs.json` (§6 file formats).
//!
//! Read-then-write is not transactional; concurrent writers may race. A
//! corrupt file is treated as an empty map rather than an error, since
//! aliases are a discovery aid, not authoritative state (§5 shared resources).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use core_types::TabAlias;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct TabAliasFile(HashMap<String, String>);

pub struct TabAliasStore {
    path: PathBuf,
}

impl TabAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path(tmp_dir: &Path) -> PathBuf {
        tmp_dir.join("cdp-skill-tabs.json")
    }

    fn load(&self) -> TabAliasFile {
        fs::read(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .unwrap_or_default()
    }

    fn save(&self, file: &TabAliasFile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("tmp");
        let mut f = fs::File::create(&temp)?;
        let data = serde_json::to_vec_pretty(file).unwrap_or_default();
        f.write_all(&data)?;
        f.sync_all()?;
        fs::rename(temp, &self.path)
    }

    pub fn resolve(&self, alias: &TabAlias) -> Option<String> {
        self.load().0.get(&alias.0).cloned()
    }

    pub fn insert(&self, alias: TabAlias, target_id: impl Into<String>) -> std::io::Result<()> {
        let mut file = self.load();
        file.0.insert(alias.0, target_id.into());
        self.save(&file)
    }

    pub fn remove(&self, alias: &TabAlias) -> std::io::Result<()> {
        let mut file = self.load();
        file.0.remove(&alias.0);
        self.save(&file)
    }

    pub fn next_alias(&self) -> TabAlias {
        let file = self.load();
        let mut n = 1;
        loop {
            let candidate = TabAlias::from_index(n);
            if !file.0.contains_key(&candidate.0) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn all(&self) -> Vec<(TabAlias, String)> {
        self.load()
            .0
            .into_iter()
            .map(|(alias, target)| (TabAlias(alias), target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn insert_then_resolve_round_trips() {
        let dir = tempdir().unwrap();
        let store = TabAliasStore::new(TabAliasStore::default_path(dir.path()));
        let alias = store.next_alias();
        assert_eq!(alias.0, "t1");
        store.insert(alias.clone(), "target-123").unwrap();
        assert_eq!(store.resolve(&alias), Some("target-123".to_string()));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = TabAliasStore::default_path(dir.path());
        fs::write(&path, b"not json").unwrap();
        let store = TabAliasStore::new(path);
        assert!(store.all().is_empty());
    }

    #[test]
    fn next_alias_skips_taken_slots() {
        let dir = tempdir().unwrap();
        let store = TabAliasStore::new(TabAliasStore::default_path(dir.path()));
        store.insert(TabAlias::from_index(1), "a").unwrap();
        store.insert(TabAlias::from_index(2), "b").unwrap();
        assert_eq!(store.next_alias().0, "t3");
    }
}
