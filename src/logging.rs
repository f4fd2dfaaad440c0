//! Tracing init. `CDP_SKILL_LOG_FORMAT=json` switches to structured JSON
//! output; otherwise a compact human-readable format is used. Filtering is
//! driven by `RUST_LOG` (default `info`), the same env-filter convention
//! the teacher's adapter crates use.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("CDP_SKILL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}
