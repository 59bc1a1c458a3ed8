use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream Nibo API settings
    #[serde(default)]
    pub nibo: NiboConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".into()));
        }
        let base = url::Url::parse(&self.nibo.base_url).map_err(|e| {
            ConfigError::Invalid(format!("nibo.base_url is not a valid URL: {e}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "nibo.base_url must use http or https".into(),
            ));
        }
        let timeout = self.nibo.request_timeout_secs;
        // try_from_secs_f64 rejects NaN, infinity and values past Duration::MAX
        if timeout <= 0.0 || Duration::try_from_secs_f64(timeout).is_err() {
            return Err(ConfigError::Invalid(
                "nibo.request_timeout_secs must be a positive number".into(),
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    /// Strips the trailing slash from the base URL and surrounding whitespace
    /// from the token.
    pub fn normalize(&mut self) {
        let base = self.nibo.base_url.trim().trim_end_matches('/').to_string();
        self.nibo.base_url = base;
        self.nibo.api_token = self.nibo.api_token.trim().to_string();
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NiboConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as the `ApiToken` header. Empty means unset.
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: f64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_base_url() -> String {
    "https://api.nibo.com.br".into()
}
fn default_request_timeout() -> f64 {
    20.0
}
fn default_cache_ttl() -> u64 {
    20
}

impl NiboConfig {
    /// Falls back to the default for values `validate` would reject.
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_request_timeout()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn has_token(&self) -> bool {
        !self.api_token.is_empty()
    }
}

impl Default for NiboConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            request_timeout_secs: default_request_timeout(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::env;
    use std::path::PathBuf;

    /// Flat variables kept from the original deployment; they override
    /// everything else.
    const LEGACY_ENV: [(&str, &str); 4] = [
        ("NIBO_BASE_URL", "nibo.base_url"),
        ("NIBO_APITOKEN", "nibo.api_token"),
        ("REQUEST_TIMEOUT", "nibo.request_timeout_secs"),
        ("CACHE_TTL_SECONDS", "nibo.cache_ttl_secs"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("nibo-bff.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Structured overrides, e.g. NIBO_BFF__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("NIBO_BFF")
                .try_parsing(true)
                .separator("__"),
        );
        for (var, key) in LEGACY_ENV {
            let value = env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }
        let mut merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.normalize();
        merged.validate()?;
        Ok(merged)
    }
}
