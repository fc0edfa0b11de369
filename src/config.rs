//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct Config {
    // === Telegram Credentials ===
    /// Application id issued by my.telegram.org.
    pub apiid: i32,

    /// Application hash issued by my.telegram.org.
    pub apihash: String,

    /// Base64 encoded serialized session of an already authorized login.
    pub stringsession: String,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Metrics ===
    /// Install the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port of the Prometheus exporter listener.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.apiid <= 0 {
            return Err("APIID must be a positive integer".to_string());
        }

        if self.apihash.trim().is_empty() {
            return Err("APIHASH is required".to_string());
        }

        if self.stringsession.trim().is_empty() {
            return Err("STRINGSESSION is required".to_string());
        }

        Ok(())
    }

    /// The application hash with everything but its first characters masked.
    pub fn redacted_api_hash(&self) -> String {
        redact(&self.apihash)
    }
}

// Secrets must never reach the logs, so Debug is written by hand.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("apiid", &self.apiid)
            .field("apihash", &redact(&self.apihash))
            .field("stringsession", &"<redacted>")
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}
