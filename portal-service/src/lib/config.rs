use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub kafka: KafkaConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
    pub registration: RegistrationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
}

/// Per-IP token bucket parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub rate_per_second: f64,
    pub capacity: f64,
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: u64,
    pub secure_cookies: bool,
    pub activity_update_interval_secs: i64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 60 * 60)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub cookie_name: String,
    pub max_age_days: u64,
}

impl IdentityConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days * 24 * 60 * 60)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Headers consulted, in order, for the client address when running
    /// behind a reverse proxy. Empty disables header trust entirely.
    pub trusted_proxy_headers: Vec<String>,
    pub csrf_ttl_secs: u64,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
    pub password_parallelism: u32,
}

impl SecurityConfig {
    pub fn csrf_ttl(&self) -> Duration {
        Duration::from_secs(self.csrf_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistrationConfig {
    pub enabled: bool,
    pub reserved_usernames: Vec<String>,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, RATE_LIMIT__CAPACITY, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: SESSION__SECURE_COOKIES=true overrides session.secure_cookies
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
