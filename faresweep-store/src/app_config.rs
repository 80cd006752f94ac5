use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_currency() -> String { "EUR".to_string() }
fn default_timeout() -> u64 { 10 }

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StreamConfig {
    /// Pause between combination events, 0 to disable
    #[serde(default)]
    pub pacing_ms: u64,
}

impl StreamConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RateLimitTier {
    pub limit: u32,
    pub window_secs: u64,
}

impl RateLimitTier {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Per-client request caps on the search route; every tier must have room.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_tiers")]
    pub tiers: Vec<RateLimitTier>,
}

fn default_rate_tiers() -> Vec<RateLimitTier> {
    vec![
        RateLimitTier { limit: 30, window_secs: 60 },
        RateLimitTier { limit: 50, window_secs: 3600 },
        RateLimitTier { limit: 200, window_secs: 86_400 },
    ]
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { tiers: default_rate_tiers() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeepaliveConfig {
    pub url: Option<String>,
    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
}

fn default_keepalive_interval() -> u64 { 840 }

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self { url: None, interval_secs: default_keepalive_interval() }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. FARESWEEP__SERVER__PORT=8080, FARESWEEP__CORS__ALLOWED_ORIGINS=a,b
            .add_source(
                config::Environment::with_prefix("FARESWEEP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 5000

                [provider]
                base_url = "https://services-api.ryanair.com"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = s.try_deserialize().unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.provider.currency, "EUR");
        assert_eq!(config.stream.pacing(), Duration::ZERO);
        assert_eq!(config.rate_limit.tiers.len(), 3);
        assert_eq!(config.rate_limit.tiers[1].limit, 50);
        assert_eq!(config.rate_limit.tiers[1].window(), Duration::from_secs(3600));
        assert_eq!(config.keepalive.interval_secs, 840);
        assert!(config.keepalive.url.is_none());
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_rate_limit_tiers_from_toml() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 5000

                [provider]
                base_url = "https://services-api.ryanair.com"

                [[rate_limit.tiers]]
                limit = 5
                window_secs = 10
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = s.try_deserialize().unwrap();

        assert_eq!(config.rate_limit.tiers, vec![RateLimitTier { limit: 5, window_secs: 10 }]);
    }
}
