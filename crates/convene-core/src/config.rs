use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
/// Outbound payloads buffered per subscriber before a delivery has to wait.
pub const SUBSCRIBER_BUFFER: usize = 32;
/// A delivery attempt slower than this drops the subscriber.
pub const DELIVERY_TIMEOUT_MS: u64 = 2_000;
/// Cadence of server pings used to detect silently dropped connections.
pub const PING_INTERVAL_SECS: u64 = 30;

/// Top-level config (convene.toml + CONVENE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConveneConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Browser origin allowed to call the API and open the push channel.
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_frontend_origin() -> String {
    DEFAULT_FRONTEND_ORIGIN.to_string()
}

impl ConveneConfig {
    /// Load config from a TOML file with CONVENE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.convene/convene.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ConveneConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CONVENE_").split("_"))
            .extract()
            .map_err(|e| crate::error::ConveneError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.convene/convene.toml", home)
}
