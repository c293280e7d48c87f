use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const EBAY_TOKEN_ENV: &str = "EBAY_ACCESS_TOKEN";
pub const LIVEAUCTIONEERS_KEY_ENV: &str = "LIVEAUCTIONEERS_API_KEY";
pub const HERITAGE_TOKEN_ENV: &str = "HERITAGE_API_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// Maximum results requested from each source
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Seed for fallback sale synthesis; random when unset
    #[serde(default)]
    pub fallback_seed: Option<u64>,
    #[serde(default)]
    pub ebay: EbayConfig,
    #[serde(default)]
    pub liveauctioneers: LiveAuctioneersConfig,
    #[serde(default)]
    pub heritage: HeritageConfig,
}

fn default_result_limit() -> u32 {
    20
}
fn default_source_timeout_secs() -> u64 {
    10
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            source_timeout_secs: default_source_timeout_secs(),
            fallback_seed: None,
            ebay: EbayConfig::default(),
            liveauctioneers: LiveAuctioneersConfig::default(),
            heritage: HeritageConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EbayConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_ebay_base_url")]
    pub base_url: String,
    #[serde(default = "default_ebay_marketplace")]
    pub marketplace_id: String,
}

fn default_ebay_base_url() -> String {
    "https://api.ebay.com".to_string()
}
fn default_ebay_marketplace() -> String {
    "EBAY_US".to_string()
}

impl Default for EbayConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: default_ebay_base_url(),
            marketplace_id: default_ebay_marketplace(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveAuctioneersConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_liveauctioneers_base_url")]
    pub base_url: String,
}

fn default_liveauctioneers_base_url() -> String {
    "https://api.liveauctioneers.com".to_string()
}

impl Default for LiveAuctioneersConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_liveauctioneers_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HeritageConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_heritage_base_url")]
    pub base_url: String,
}

fn default_heritage_base_url() -> String {
    "https://api.ha.com".to_string()
}

impl Default for HeritageConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_heritage_base_url(),
        }
    }
}

impl MarketConfig {
    /// Defaults plus credentials from the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay credentials found by `lookup`; values found there win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = credential(lookup(EBAY_TOKEN_ENV)) {
            self.ebay.access_token = Some(token);
        }
        if let Some(key) = credential(lookup(LIVEAUCTIONEERS_KEY_ENV)) {
            self.liveauctioneers.api_key = Some(key);
        }
        if let Some(token) = credential(lookup(HERITAGE_TOKEN_ENV)) {
            self.heritage.api_token = Some(token);
        }
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.result_limit == 0 {
            anyhow::bail!("result_limit must be >= 1");
        }
        if self.source_timeout_secs == 0 {
            anyhow::bail!("source_timeout_secs must be >= 1");
        }
        for (name, url) in [
            ("ebay", &self.ebay.base_url),
            ("liveauctioneers", &self.liveauctioneers.base_url),
            ("heritage", &self.heritage.base_url),
        ] {
            reqwest::Url::parse(url)
                .with_context(|| format!("{}.base_url is not a valid URL: {}", name, url))?;
        }
        Ok(())
    }
}

/// Blank credentials count as absent
pub(crate) fn credential(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_config(content: &str) -> Result<MarketConfig> {
    let config: MarketConfig =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load a TOML config file, then overlay credentials from the environment
pub fn load_config(path: &Path) -> Result<MarketConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
