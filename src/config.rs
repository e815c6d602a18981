use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Deployment environment. Production tightens transport checks and
/// hides error details from clients.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnv {
    #[default]
    Development,
    Production,
}

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3000
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// Credential vault configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VaultConfig {
    /// Shared secret the encryption key is derived from.
    /// Required in production; development falls back to a built-in key.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Instance table storage
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    ".bots-data.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Instance registry settings
#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// First port handed out to a new bot instance
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    /// Command prefix used when a create request omits one
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
}

fn default_base_port() -> u16 {
    3001
}

fn default_prefix() -> String {
    "$".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_port: default_base_port(),
            default_prefix: default_prefix(),
        }
    }
}

/// Rate limiting settings
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// How often expired identities are swept from the table
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Reject requests with no client address instead of sharing one
    /// "unknown" bucket between them
    #[serde(default)]
    pub reject_unattributed: bool,
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_requests() -> u32 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            sweep_interval_secs: default_sweep_interval_secs(),
            reject_unattributed: false,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: DeploymentEnv,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: BOTKEEPER_)
            // e.g., BOTKEEPER_VAULT__SECRET, BOTKEEPER_WEB__PORT
            .add_source(
                Environment::with_prefix("BOTKEEPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }

    pub fn is_production(&self) -> bool {
        self.environment == DeploymentEnv::Production
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.vault.secret.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Message(
                "vault.secret must be set in production".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Message(
                "rate_limit.window_secs must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Message(
                "rate_limit.max_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
