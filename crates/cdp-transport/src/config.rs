//! Connection configuration. Launching Chrome is an external collaborator's
//! job; this crate only ever attaches to an already-running browser's
//! debugging port.

use serde_json::Value;

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub default_deadline_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub reconnect_max_attempts: u32,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9222,
            default_deadline_ms: 30_000,
            heartbeat_interval_ms: 15_000,
            reconnect_max_attempts: 5,
            reconnect_base_delay_ms: 200,
            reconnect_max_delay_ms: 8_000,
        }
    }
}

impl TransportConfig {
    pub fn version_endpoint(&self) -> String {
        format!("http://{}:{}/json/version", self.host, self.port)
    }

    /// Layers the input envelope's top-level `"config"` object (§6: `{host,
    /// port, headless}`) over the defaults. `headless` is not a transport
    /// concern (Chrome launch is an external collaborator's job) so it is
    /// ignored here.
    pub fn from_request_config(cfg: Option<&Value>) -> Self {
        let mut out = Self::default();
        let Some(cfg) = cfg else { return out };
        if let Some(host) = cfg.get("host").and_then(Value::as_str) {
            out.host = host.to_string();
        }
        if let Some(port) = cfg.get("port").and_then(Value::as_u64) {
            out.port = port as u16;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_no_config_given() {
        let cfg = TransportConfig::from_request_config(None);
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 9222);
    }

    #[test]
    fn overrides_host_and_port() {
        let cfg = TransportConfig::from_request_config(Some(&json!({"host":"127.0.0.1","port":9333})));
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9333);
    }
}
