use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";
// Free tier allows 5 calls per minute; keep a small margin.
const DEFAULT_REQUEST_DELAY_MS: u64 = 5100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlphaVantageConfig {
    #[serde(default = "default_alpha_vantage_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_queue_depth: Option<usize>,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        AlphaVantageConfig {
            base_url: default_alpha_vantage_url(),
            api_key: None,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_queue_depth: None,
        }
    }
}

impl AlphaVantageConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, or the `ALPHAVANTAGE_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(API_KEY_ENV).map_err(|_| {
            anyhow!("No Alpha Vantage API key configured. Set providers.alpha_vantage.api_key or {API_KEY_ENV}")
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub alpha_vantage: AlphaVantageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            persist: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Quotes arrive in USD; `conversion_rate` turns them into `currency` for display.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_conversion_rate")]
    pub conversion_rate: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            currency: default_currency(),
            conversion_rate: default_conversion_rate(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "stockify", "stockify")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("app", "stockify", "stockify")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.display.conversion_rate.is_finite() && self.display.conversion_rate > 0.0) {
            return Err(anyhow!(
                "display.conversion_rate must be a positive number, got {}",
                self.display.conversion_rate
            ));
        }
        if self.providers.alpha_vantage.max_queue_depth == Some(0) {
            return Err(anyhow!(
                "providers.alpha_vantage.max_queue_depth must be at least 1"
            ));
        }
        Ok(())
    }
}

fn default_alpha_vantage_url() -> String {
    DEFAULT_ALPHA_VANTAGE_URL.to_string()
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_conversion_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml_str = r#"
backend:
  base_url: "http://localhost:8080"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.backend.base_url, "http://localhost:8080");

        let av = &config.providers.alpha_vantage;
        assert_eq!(av.base_url, "https://www.alphavantage.co");
        assert_eq!(av.request_delay(), Duration::from_millis(5100));
        assert_eq!(av.timeout(), Duration::from_secs(30));
        assert!(av.api_key.is_none());
        assert!(av.max_queue_depth.is_none());

        assert_eq!(config.cache.ttl(), Duration::from_secs(900));
        assert!(config.cache.persist);
        assert_eq!(config.display.currency, "USD");
        assert_eq!(config.display.conversion_rate, 1.0);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_full_config_deserialization() {
        let yaml_str = r#"
backend:
  base_url: "https://portfolio.example.com"
providers:
  alpha_vantage:
    base_url: "http://example.com/av"
    api_key: "SECRET"
    request_delay_ms: 12000
    timeout_secs: 5
    max_queue_depth: 20
cache:
  ttl_secs: 60
  persist: false
display:
  currency: "INR"
  conversion_rate: 85.76
data_path: "/tmp/stockify"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        let av = &config.providers.alpha_vantage;
        assert_eq!(av.base_url, "http://example.com/av");
        assert_eq!(av.resolve_api_key().unwrap(), "SECRET");
        assert_eq!(av.request_delay(), Duration::from_secs(12));
        assert_eq!(av.timeout(), Duration::from_secs(5));
        assert_eq!(av.max_queue_depth, Some(20));
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(!config.cache.persist);
        assert_eq!(config.display.currency, "INR");
        assert_eq!(config.display.conversion_rate, 85.76);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/stockify")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
backend:
  base_url: "http://localhost"
display:
  conversion_rate: 0
"#,
        )
        .unwrap();
        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("conversion_rate"));

        fs::write(
            &path,
            r#"
backend:
  base_url: "http://localhost"
providers:
  alpha_vantage:
    max_queue_depth: 0
"#,
        )
        .unwrap();
        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("max_queue_depth"));
    }

    #[test]
    fn test_missing_backend_fails_to_parse() {
        let result = serde_yaml::from_str::<AppConfig>("cache:\n  ttl_secs: 10\n");
        assert!(result.is_err());
    }
}
