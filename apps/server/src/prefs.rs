use std::collections::BTreeMap;

use crate::config::Config;

/// Per-request preference overrides, sent by the client as a flat string
/// map. Anything not overridden falls back to the server config.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    values: BTreeMap<String, String>,
}

impl Preferences {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.parse().ok())
    }

    pub fn hits_per_page(&self, cfg: &Config) -> u32 {
        self.parsed("hits-per-page").unwrap_or(cfg.hits_per_page)
    }

    pub fn completions_per_box(&self, cfg: &Config) -> u32 {
        self.parsed("completions-per-box")
            .unwrap_or(cfg.completions_per_box)
    }

    pub fn rank_hits(&self) -> String {
        self.values
            .get("rank-hits")
            .cloned()
            .unwrap_or_else(|| "1d".to_string())
    }

    pub fn rank_completions(&self) -> String {
        self.values
            .get("rank-completions")
            .cloned()
            .unwrap_or_else(|| "1d".to_string())
    }

    pub fn language<'a>(&'a self, cfg: &'a Config) -> &'a str {
        self.values
            .get("language")
            .map(String::as_str)
            .unwrap_or(&cfg.language)
    }
}
