// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

use super::resolve_env_secret;

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_connect_timeout_ms() -> u64 {
    4_000
}
fn default_batch_concurrency() -> usize {
    4
}
fn default_cache_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "gemini" | "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Upper bound on in-flight classifier calls per batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// 0 disables the classification cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            batch_concurrency: default_batch_concurrency(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl AiConfig {
    /// Normalize provider name, resolve "ENV" key and clamp numeric knobs.
    pub fn finalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();

        let key_var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GEMINI_API_KEY",
        };
        self.api_key = resolve_env_secret(&self.api_key, key_var);

        if self.batch_concurrency == 0 {
            self.batch_concurrency = default_batch_concurrency();
        }
        if self.timeout_ms == 0 {
            self.timeout_ms = default_timeout_ms();
        }
    }

    /// `AI_TEST_MODE=mock` forces the deterministic keyword classifier.
    pub fn test_mode_mock() -> bool {
        env::var("AI_TEST_MODE")
            .map(|v| v.eq_ignore_ascii_case("mock"))
            .unwrap_or(false)
    }
}
