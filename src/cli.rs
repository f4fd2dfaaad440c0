//! CLI argument parsing (SPEC_FULL §3): the input envelope (spec §6) comes
//! either on stdin or as a single positional JSON argument, matching the
//! teacher's `clap::Parser` derive usage style.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cdp-skill", version, about = "Executes a declarative step list against a Chrome/Chromium tab over CDP")]
pub struct CliArgs {
    /// The input envelope as a JSON string. Reads stdin when omitted.
    pub command: Option<String>,

    /// Overrides `CDP_SKILL_TMPDIR` for screenshots/snapshots/tab aliases.
    #[arg(long)]
    pub tmpdir: Option<PathBuf>,

    /// Overrides `CHROME_PATH` for launch detection.
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,
}
