// src/config/mod.rs
//! Service configuration, loaded from TOML with env overrides.

pub mod ai;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/sireneye.toml";
pub const ENV_CONFIG_PATH: &str = "SIRENEYE_CONFIG_PATH";

/// `"ENV"` (any case) means: read `var`; a missing var resolves to an empty string.
pub(crate) fn resolve_env_secret(raw: &str, var: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("env") {
        std::env::var(var).unwrap_or_default()
    } else {
        raw.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: AiConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub news_enabled: bool,
    pub news_query: String,
    pub news_lang: String,
    /// "ENV" means NEWS_API_KEY
    pub news_api_key: String,
    pub news_timeout_ms: u64,
    pub social_enabled: bool,
    pub social_path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            news_enabled: true,
            news_query: crate::sources::gnews::DEFAULT_NEWS_QUERY.to_string(),
            news_lang: "en".to_string(),
            news_api_key: "ENV".to_string(),
            news_timeout_ms: 8_000,
            social_enabled: true,
            social_path: PathBuf::from(crate::sources::mock_social::DEFAULT_MOCK_SOCIAL_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Drop later items whose normalized text repeats an earlier one.
    pub dedup_identical: bool,
    /// Upper bound for a single source fetch, including body read.
    pub source_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            dedup_identical: false,
            source_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/triage-records.jsonl"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// "ENV" means AUTH_SECRET
    pub secret: String,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "ENV".to_string(),
            token_ttl_secs: 3_600,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing service config toml")?;
        cfg.finalize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallback:
    /// 1) $SIRENEYE_CONFIG_PATH (must exist)
    /// 2) config/sireneye.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(p);
        }
        let mut cfg = AppConfig::default();
        cfg.finalize();
        Ok(cfg)
    }

    fn finalize(&mut self) {
        self.classifier.finalize();
        self.sources.news_api_key = resolve_env_secret(&self.sources.news_api_key, "NEWS_API_KEY");
        self.auth.secret = resolve_env_secret(&self.auth.secret, "AUTH_SECRET");
        if self.auth.token_ttl_secs <= 0 {
            self.auth.token_ttl_secs = AuthConfig::default().token_ttl_secs;
        }
    }
}
