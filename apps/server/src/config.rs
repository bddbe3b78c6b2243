use crate::error::Result;
use config::{AppStrategy, create_strategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default = "default_config", deny_unknown_fields)]
pub struct Config {
    /// Completion backend endpoint.
    pub backend_host: String,
    pub backend_port: u16,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,

    /// Inputs whose last word is shorter than this launch no query.
    pub min_query_length: usize,
    /// Words at least this long get a trailing wildcard appended.
    pub min_word_length_for_star: usize,

    pub hits_per_page: u32,
    pub completions_per_box: u32,
    /// Hard cap on completions fetched for one box.
    pub max_completions_fetch: u32,
    /// "Show more" ladder steps offered under a completion box.
    pub more_thresholds: Vec<u32>,
    /// Completion labels wider than this are middle-truncated.
    pub max_completion_length: usize,

    /// Facet boxes to show, one per name, in this order.
    pub facet_names: Vec<String>,
    /// Whether the index carries precomputed facet-id words.
    pub facetids_available: bool,
    /// Index words starting with this tag are never shown as completions.
    pub internal_tag: String,
    /// Language requested for translation blocks.
    pub language: String,
    /// Query substituted when the input is empty but panels are requested.
    pub replacement_for_empty_query: String,

    pub runtime_dir: PathBuf,
}

fn default_config() -> Config {
    let strategy = create_strategy().unwrap();

    Config {
        backend_host: "127.0.0.1".to_string(),
        backend_port: 8181,
        connect_timeout_ms: 500,
        read_timeout_ms: 2500,
        min_query_length: 3,
        min_word_length_for_star: 3,
        hits_per_page: 5,
        completions_per_box: 4,
        max_completions_fetch: 1000,
        more_thresholds: vec![4, 50, 250],
        max_completion_length: 40,
        facet_names: vec!["author".to_string(), "year".to_string()],
        facetids_available: false,
        internal_tag: ":info:".to_string(),
        language: "en".to_string(),
        replacement_for_empty_query: String::new(),
        runtime_dir: config::resolve_dir("RUNTIME_DIRECTORY", &strategy, |s| s.runtime_dir()),
    }
}

impl Config {
    fn load_str(user_config_str: &str) -> Result<Config> {
        let user_config: Config = toml::from_str(user_config_str)?;
        Ok(user_config)
    }

    pub fn load() -> Result<Config> {
        let strategy = create_strategy()?;
        let config_path = strategy
            .config_dir()
            .join(config::constants::SERVER_CONFIG_FILE_NAME);

        match std::fs::read_to_string(&config_path) {
            Ok(user_config_str) => Self::load_str(&user_config_str),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::create_example_config(&config_path)?;
                Self::load_str("")
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    fn create_example_config(config_path: &PathBuf) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let example_config = r#"# boxsearch server configuration
#
# Created automatically on first run; edits take effect on restart.

# Completion backend endpoint
# backend-host = "127.0.0.1"
# backend-port = 8181

# Facet boxes, one per name, in this order
# facet-names = ["author", "year"]

# Set when the index carries precomputed :facetid: words
# facetids-available = false

# Queries launch once the last word reaches this length
# min-query-length = 3
"#;

        let mut file = std::fs::File::create(config_path)?;
        file.write_all(example_config.as_bytes())?;

        eprintln!("\nCreated config file: {config_path:?}");
        eprintln!("Edit it to point at your completion backend, then run: cargo run -p server -- serve\n");

        Ok(())
    }
}
