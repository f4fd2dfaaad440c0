//! Driver configuration (SPEC_FULL §2.3): environment variables layered
//! under the CLI's overrides, mirroring the teacher's `CdpConfig`
//! defaulting pattern (explicit `Default`, then env override, then
//! request/CLI override) but scoped to what this driver actually needs.

use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Chrome/Chromium executable, when known ahead of launch detection.
    pub chrome_path: Option<PathBuf>,
    /// Directory for screenshots, snapshot spill files and the tab alias
    /// file (`<tmp>/...` throughout spec §6's "File formats").
    pub tmp_dir: PathBuf,
    /// Directory holding the launched browser's user-data-dir, when this
    /// process also owns launching Chrome.
    pub profile_dir: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chrome_path: std::env::var_os("CHROME_PATH").map(PathBuf::from),
            tmp_dir: std::env::var_os("CDP_SKILL_TMPDIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            profile_dir: std::env::var_os("CDP_SKILL_PROFILE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".cdp-skill-profile")),
        }
    }
}

impl DriverConfig {
    pub fn sites_dir(&self) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".cdp-skill")
            .join("sites")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_system_tmp_dir_when_unset() {
        std::env::remove_var("CDP_SKILL_TMPDIR");
        let cfg = DriverConfig::default();
        assert_eq!(cfg.tmp_dir, std::env::temp_dir());
    }
}
