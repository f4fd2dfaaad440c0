mod chrome;
mod cli;
mod config;
mod fs_ports;
mod logging;

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cdp_transport::{TabAliasStore, Transport, TransportConfig};
use input_emulator::Os;
use step_engine::{run_command, CommandInput, RunnerDeps, TabManager};

use crate::chrome::{ChromeLocator, LocalChromeLocator};
use crate::cli::CliArgs;
use crate::config::DriverConfig;
use crate::fs_ports::{FsPdfSink, FsScreenshotSink, FsSiteProfileStore, FsSnapshotSink};

fn current_os() -> Os {
    if cfg!(target_os = "macos") {
        Os::Mac
    } else {
        Os::Other
    }
}

fn read_input(cli: &CliArgs) -> anyhow::Result<String> {
    match &cli.command {
        Some(s) => Ok(s.clone()),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = CliArgs::parse();
    let mut driver_config = DriverConfig::default();
    if let Some(tmpdir) = &cli.tmpdir {
        driver_config.tmp_dir = tmpdir.clone();
    }
    if let Some(chrome_path) = &cli.chrome_path {
        driver_config.chrome_path = Some(chrome_path.clone());
    }

    let raw_input = read_input(&cli)?;
    let input: CommandInput = match serde_json::from_str(&raw_input) {
        Ok(v) => v,
        Err(err) => {
            let report = serde_json::json!({
                "status": "error",
                "errors": [{"step": 0, "action": "parse", "error": {"type": "PARSE", "message": err.to_string()}}],
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(1);
        }
    };

    if let Some(path) = LocalChromeLocator { configured: driver_config.chrome_path.clone() }.locate() {
        info!(chrome = %path.display(), "detected chrome executable");
    } else {
        info!("no chrome executable detected; relying on an already-running debug target");
    }

    let transport_config = TransportConfig::from_request_config(input.config.as_ref());
    let transport = Arc::new(Transport::new(transport_config));
    if let Err(err) = transport.connect().await {
        error!(%err, "failed to connect to the browser's debugging port");
        let report = serde_json::json!({
            "status": "error",
            "errors": [{"step": 0, "action": "connect", "error": {"type": "CONNECTION", "message": err.to_string()}}],
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(1);
    }

    let aliases = TabAliasStore::new(TabAliasStore::default_path(&driver_config.tmp_dir));
    let deps = RunnerDeps {
        tabs: TabManager::new(transport.clone(), aliases),
        transport,
        site_profiles: Arc::new(FsSiteProfileStore::new(driver_config.sites_dir())),
        screenshots: Arc::new(FsScreenshotSink::new(driver_config.tmp_dir.clone())),
        snapshots: Arc::new(FsSnapshotSink::new(driver_config.tmp_dir.clone())),
        pdf_sink: Arc::new(FsPdfSink::new(driver_config.tmp_dir.clone())),
        os: current_os(),
    };

    match run_command(&deps, input).await {
        Ok(output) => {
            let exit_code = if output.status == "ok" { 0 } else { 1 };
            println!("{}", serde_json::to_string_pretty(&output)?);
            std::process::exit(exit_code);
        }
        Err(err) => {
            error!(%err, "command failed before a report could be assembled");
            let report = serde_json::json!({
                "status": "error",
                "errors": [{"step": 0, "action": "run", "error": {"type": "EXECUTION", "message": err.to_string()}}],
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(1);
        }
    }
}
