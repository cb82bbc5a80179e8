// src/config/mod.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::{DEFAULT_MIN_WORD_LEN, DEFAULT_STOP_WORDS, DEFAULT_TOP_N};
use crate::enrich::DEFAULT_KEYWORDS;
use crate::ingest::hn::DEFAULT_BASE_URL;

pub const ENV_CONFIG_PATH: &str = "INSIGHTS_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/insights.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/insights.json";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_fetch_limit() -> usize {
    50
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_fetch_concurrency() -> usize {
    8
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_stop_words() -> Vec<String> {
    DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect()
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_min_word_len() -> usize {
    DEFAULT_MIN_WORD_LEN
}

/// Service configuration. Every field has a default, so an empty file (or no
/// file at all) is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightsConfig {
    /// Root of the item API, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Maximum number of ranked items per snapshot.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Item bodies fetched in parallel during one refresh.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,
    /// Size of the domain and trending rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Shortest title word (in characters) that may trend.
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fetch_limit: default_fetch_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_concurrency: default_fetch_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            keywords: default_keywords(),
            stop_words: default_stop_words(),
            top_n: default_top_n(),
            min_word_len: default_min_word_len(),
        }
    }
}

impl InsightsConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading insights config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)
            .with_context(|| format!("parsing insights config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $INSIGHTS_CONFIG_PATH (must exist when set)
    /// 2) config/insights.toml
    /// 3) config/insights.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_CONFIG_TOML).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_TOML))?
        } else if Path::new(DEFAULT_CONFIG_JSON).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_JSON))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides().sanitized())
    }

    /// `HN_*` environment variables win over file values. Unparsable values
    /// are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("HN_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v.trim().to_string();
            }
        }
        override_num("HN_FETCH_LIMIT", &mut self.fetch_limit);
        override_num("HN_CACHE_TTL_SECS", &mut self.cache_ttl_secs);
        override_num("HN_FETCH_CONCURRENCY", &mut self.fetch_concurrency);
        override_num("HN_REFRESH_INTERVAL_SECS", &mut self.refresh_interval_secs);
        self
    }

    /// Clamp zero counts to 1, restore emptied lists, drop trailing slashes.
    pub fn sanitized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            self.base_url = default_base_url();
        }
        self.fetch_concurrency = self.fetch_concurrency.max(1);
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.keywords = clean_list(self.keywords);
        if self.keywords.is_empty() {
            self.keywords = default_keywords();
        }
        self.stop_words = clean_list(self.stop_words);
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn stop_word_set(&self) -> HashSet<String> {
        self.stop_words.iter().cloned().collect()
    }
}

fn override_num<T: std::str::FromStr>(var: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!(var, value = %raw, "ignoring unparsable env override"),
        }
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<InsightsConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("invalid JSON config");
    }
    match toml::from_str::<InsightsConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => {
            // Extension-less files may still hold JSON.
            if hint_ext != "toml" {
                if let Ok(cfg) = serde_json::from_str::<InsightsConfig>(s) {
                    return Ok(cfg);
                }
            }
            Err(anyhow!(toml_err).context("invalid TOML config"))
        }
    }
}

/// Lower-case, trim, drop blanks and duplicates; keeps first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
