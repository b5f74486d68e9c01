//! Configuration for TripScout

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the extraction engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Browser session configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Page extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Retry supervision configuration (flight sources)
    #[serde(default)]
    pub retry: RetryConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.browser.user_agents.is_empty() {
            errors.push("browser user_agents pool must not be empty".to_string());
        }
        if self.browser.launch_timeout_secs == 0 {
            errors.push("launch_timeout_secs must be positive".to_string());
        }

        if self.extraction.navigation_timeout_secs == 0 {
            errors.push("navigation_timeout_secs must be positive".to_string());
        }
        if self.extraction.content_wait_secs == 0 {
            errors.push("content_wait_secs must be positive".to_string());
        }
        if self.extraction.reload_wait_secs == 0 {
            errors.push("reload_wait_secs must be positive".to_string());
        }
        if self.extraction.scroll_passes == 0 {
            errors.push("scroll_passes must be positive".to_string());
        }
        if self.extraction.marker_poll_ms == 0 {
            errors.push("marker_poll_ms must be positive".to_string());
        }

        if self.retry.max_attempts == 0 {
            errors.push("retry max_attempts must be positive".to_string());
        }

        if self.cache.ttl_secs == 0 {
            errors.push("cache ttl_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

/// Browser session factory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run Chrome headless
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Explicit Chrome/Chromium executable path (autodetected when absent)
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Pool of client identity strings; one is drawn at random per session
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    /// Browser launch timeout (seconds)
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_secs: u64,
}

fn default_headless() -> bool {
    true
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_launch_timeout() -> u64 {
    30
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            user_agents: default_user_agents(),
            launch_timeout_secs: default_launch_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}

/// Page extraction timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Full page navigation timeout (seconds)
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
    /// Bounded wait for the content-readiness marker (seconds)
    #[serde(default = "default_content_wait")]
    pub content_wait_secs: u64,
    /// Shortened wait after the single reload fallback (seconds)
    #[serde(default = "default_reload_wait")]
    pub reload_wait_secs: u64,
    /// Soft wait for late-hydrating images (seconds)
    #[serde(default = "default_image_wait")]
    pub image_wait_secs: u64,
    /// Number of viewport-height scroll steps to trigger lazy content
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,
    /// Settle delay between scroll steps (milliseconds)
    #[serde(default = "default_scroll_settle")]
    pub scroll_settle_ms: u64,
    /// Interval between content-marker polls (milliseconds)
    #[serde(default = "default_marker_poll")]
    pub marker_poll_ms: u64,
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_content_wait() -> u64 {
    20
}

fn default_reload_wait() -> u64 {
    12
}

fn default_image_wait() -> u64 {
    5
}

fn default_scroll_passes() -> u32 {
    5
}

fn default_scroll_settle() -> u64 {
    1200
}

fn default_marker_poll() -> u64 {
    4000
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout(),
            content_wait_secs: default_content_wait(),
            reload_wait_secs: default_reload_wait(),
            image_wait_secs: default_image_wait(),
            scroll_passes: default_scroll_passes(),
            scroll_settle_ms: default_scroll_settle(),
            marker_poll_ms: default_marker_poll(),
        }
    }
}

impl ExtractionConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_secs(self.content_wait_secs)
    }

    pub fn reload_wait(&self) -> Duration {
        Duration::from_secs(self.reload_wait_secs)
    }

    pub fn image_wait(&self) -> Duration {
        Duration::from_secs(self.image_wait_secs)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn marker_poll(&self) -> Duration {
        Duration::from_millis(self.marker_poll_ms)
    }
}

/// Retry supervision configuration for the flight sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum extraction attempts per query
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts (milliseconds)
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for cached payloads (seconds)
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent_pool() {
        let mut cfg = Config::default();
        cfg.browser.user_agents.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("user_agents pool must not be empty"));
    }

    #[test]
    fn validate_rejects_zero_retry_attempts() {
        let mut cfg = Config::default();
        cfg.retry.max_attempts = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts must be positive"));
    }

    #[test]
    fn validate_rejects_zero_cache_ttl() {
        let mut cfg = Config::default();
        cfg.cache.ttl_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("ttl_secs must be positive"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = Config::default();
        cfg.retry.max_attempts = 0;
        cfg.cache.ttl_secs = 0;
        cfg.extraction.scroll_passes = 0;
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("max_attempts must be positive"));
        assert!(msg.contains("ttl_secs must be positive"));
        assert!(msg.contains("scroll_passes must be positive"));
    }

    #[test]
    fn default_extraction_timing_values() {
        let ex = ExtractionConfig::default();
        assert_eq!(ex.content_wait(), Duration::from_secs(20));
        assert_eq!(ex.image_wait(), Duration::from_secs(5));
        assert_eq!(ex.scroll_passes, 5);
        assert_eq!(ex.scroll_settle(), Duration::from_millis(1200));
    }

    #[test]
    fn default_retry_matches_flight_policy() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay(), Duration::from_secs(5));
    }

    #[test]
    fn default_cache_ttl_is_one_hour() {
        assert_eq!(CacheConfig::default().ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn config_parses_partial_toml_with_defaults() {
        let toml_str = r#"
            [retry]
            max_attempts = 2
            delay_ms = 100
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.cache.ttl_secs, 3600);
        assert!(cfg.browser.headless);
    }

    #[test]
    fn partial_retry_section_fills_remaining_fields() {
        let toml_str = r#"
            [retry]
            max_attempts = 2
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.retry.delay_ms, 5000);
    }

    #[test]
    fn partial_extraction_section_fills_remaining_fields() {
        let toml_str = r#"
            [extraction]
            content_wait_secs = 30
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.extraction.content_wait_secs, 30);
        assert_eq!(cfg.extraction.navigation_timeout_secs, 60);
        assert_eq!(cfg.extraction.scroll_passes, 5);
        assert_eq!(cfg.extraction.marker_poll_ms, 4000);
    }

    #[test]
    fn empty_sections_parse_as_defaults() {
        let toml_str = r#"
            [browser]
            [extraction]
            [retry]
            [cache]
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.cache.ttl_secs, 3600);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.extraction.reload_wait_secs, 12);
        assert!(!cfg.browser.user_agents.is_empty());
    }
}
