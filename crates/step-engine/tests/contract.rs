//! End-to-end contract test against a real Chrome/Chromium binary.
//!
//! Ignored by default: enable with `SOULBROWSER_CDP_CONTRACT=1` (and make
//! sure `chrome`/`chromium`/`google-chrome` is on PATH, or point
//! `CHROME_PATH` at one). This crate's transport only ever attaches to an
//! already-running debugging port, so the test launches Chrome itself with
//! `--headless=new --remote-debugging-port=0` and scrapes the assigned port
//! from stderr, the same way the teacher's own adapter contract tests spin
//! up a throwaway browser process per test.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use cdp_transport::{TabAliasStore, Transport, TransportConfig};
use input_emulator::Os;
use serde_json::json;
use step_engine::{
    run_command, CommandInput, NullPdfSink, NullScreenshotSink, NullSiteProfileStore, NullSnapshotSink, RunnerDeps,
    TabManager,
};

fn contract_enabled() -> bool {
    std::env::var("SOULBROWSER_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn chrome_binary() -> Option<String> {
    if let Ok(path) = std::env::var("CHROME_PATH") {
        return Some(path);
    }
    ["google-chrome", "chromium", "chromium-browser", "chrome"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
        .map(|p| p.display().to_string())
}

struct ChromeProcess {
    child: Child,
    port: u16,
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_chrome(binary: &str, profile_dir: &std::path::Path) -> ChromeProcess {
    let mut child = Command::new(binary)
        .arg("--headless=new")
        .arg("--remote-debugging-port=0")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg(format!("--user-data-dir={}", profile_dir.display()))
        .arg("about:blank")
        .stderr(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn chrome");

    let stderr = child.stderr.take().expect("captured stderr");
    let mut reader = BufReader::new(stderr);
    let mut port = None;
    for _ in 0..200 {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if let Some(rest) = line.trim().strip_prefix("DevTools listening on ws://") {
            if let Some(host_port) = rest.split('/').next() {
                if let Some(p) = host_port.rsplit(':').next() {
                    port = p.parse().ok();
                    break;
                }
            }
        }
    }
    // The reader owns stderr now; drop it so it doesn't block the child on a full pipe.
    drop(reader);

    ChromeProcess { child, port: port.expect("chrome printed its debugging port") }
}

#[tokio::test]
async fn navigate_and_click_against_real_chrome() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (SOULBROWSER_CDP_CONTRACT not enabled)");
        return;
    }
    let Some(binary) = chrome_binary() else {
        eprintln!("skipping CDP contract test (no chrome/chromium binary found)");
        return;
    };

    let profile_dir = tempfile::tempdir().expect("temp profile dir");
    let chrome = spawn_chrome(&binary, profile_dir.path());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut config = TransportConfig::default();
    config.port = chrome.port;
    let transport = Arc::new(Transport::new(config));
    transport.connect().await.expect("connect to chrome's debugging port");

    let tmp = tempfile::tempdir().expect("temp aliases dir");
    let aliases = TabAliasStore::new(TabAliasStore::default_path(tmp.path()));
    let deps = RunnerDeps {
        tabs: TabManager::new(transport.clone(), aliases),
        transport,
        site_profiles: Arc::new(NullSiteProfileStore),
        screenshots: Arc::new(NullScreenshotSink),
        snapshots: Arc::new(NullSnapshotSink),
        pdf_sink: Arc::new(NullPdfSink),
        os: Os::Other,
    };

    let input: CommandInput = serde_json::from_value(json!({
        "steps": [
            {"kind": "goto", "params": {"url": "about:blank"}},
            {"kind": "wait", "params": {"ms": 50}},
            {"kind": "snapshot", "params": {}},
        ]
    }))
    .expect("well-formed command input");

    let output = run_command(&deps, input).await.expect("run_command completes");
    assert_eq!(output.status, "ok", "unexpected report: {:?}", output.errors);
    assert_eq!(output.steps.len(), 3);
    // Exercises accessibility-snapshot's live DOM walk (`take_snapshot`) end
    // to end through the same path the runner itself uses.
    assert!(output.steps[2].output.is_some());
}
