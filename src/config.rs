use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{ConfigError, Result};
use crate::feed::fetcher::DEFAULT_ENDPOINT;
use crate::storage::MAX_TTL;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Seconds a result set stays cached.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_cache_key_prefix")]
    pub cache_key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Token signing secret. Empty means a random secret per process.
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_token_lifetime")]
    pub token_lifetime: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file when present, otherwise start from defaults; env overrides apply either way.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file()?,
        };

        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.search.endpoint)
            .map_err(|_| ConfigError::InvalidUrl(self.search.endpoint.clone()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(self.search.endpoint.clone()));
        }

        if self.search.cache_ttl == 0 {
            return Err(ConfigError::Invalid("Cache TTL must be greater than 0".to_string()));
        }

        if self.search.cache_ttl() > MAX_TTL {
            return Err(ConfigError::Invalid(format!(
                "Cache TTL must be at most {} seconds",
                MAX_TTL.as_secs()
            )));
        }

        if self.search.timeout == 0 {
            return Err(ConfigError::Invalid("Timeout must be greater than 0".to_string()));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid("Cache max_entries must be greater than 0".to_string()));
        }

        if self.security.token_lifetime < 2 {
            return Err(ConfigError::Invalid("Token lifetime must be at least 2 seconds".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("NEWS_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }

        if let Ok(port) = std::env::var("NEWS_SEARCH_PORT") {
            if let Ok(val) = port.parse() {
                self.server.port = val;
            }
        }

        if let Ok(secret) = std::env::var("NEWS_SEARCH_SECRET") {
            self.security.secret = secret;
        }

        if let Ok(level) = std::env::var("NEWS_SEARCH_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("news-search"))
            .ok_or_else(|| ConfigError::Config("Could not determine config directory".to_string()))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

impl SearchSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

impl SecurityConfig {
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            cache_ttl: default_cache_ttl(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            cache_key_prefix: default_cache_key_prefix(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_size: default_max_request_size(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_lifetime: default_token_lifetime(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
            json_format: false,
        }
    }
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }
fn default_cache_ttl() -> u64 { 300 }
fn default_timeout() -> u64 { 10 }
fn default_user_agent() -> String {
    format!("news-search/{}", env!("CARGO_PKG_VERSION"))
}
fn default_cache_key_prefix() -> String { "news_results_".to_string() }

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_max_request_size() -> usize { 16 * 1024 }

fn default_token_lifetime() -> u64 { 24 * 60 * 60 }
fn default_max_entries() -> usize { 1000 }

fn default_log_level() -> String { "info".to_string() }
fn default_log_file() -> String { "logs/news-search.log".to_string() }
