pub mod constants;

pub use etcetera::AppStrategy;
use etcetera::{AppStrategyArgs, choose_app_strategy};

use std::env;
use std::path::PathBuf;

pub fn create_strategy() -> std::result::Result<impl AppStrategy, etcetera::HomeDirError> {
    choose_app_strategy(AppStrategyArgs {
        top_level_domain: constants::TOP_LEVEL_DOMAIN.to_string(),
        author: constants::AUTHOR.to_string(),
        app_name: constants::APP_NAME.to_string(),
    })
}

pub fn resolve_dir<S, F>(env_key: &str, strategy: &S, strategy_fn: F) -> PathBuf
where
    S: AppStrategy,
    F: FnOnce(&S) -> Option<PathBuf>,
{
    env::var_os(env_key)
        .map(PathBuf::from)
        .or_else(|| strategy_fn(strategy))
        .unwrap_or_else(|| env::temp_dir().join(constants::APP_NAME))
}

/// Where the dispatcher listens and clients connect.
pub fn socket_path<S: AppStrategy>(strategy: &S) -> PathBuf {
    resolve_dir("BOXSEARCH_RUNTIME_DIR", strategy, |s| s.runtime_dir())
        .join(constants::UNIX_SOCKET_FILE_NAME)
}

/// Where the server reads (and on first run writes) its config file.
pub fn server_config_path<S: AppStrategy>(strategy: &S) -> PathBuf {
    resolve_dir("BOXSEARCH_CONFIG_DIR", strategy, |s| Some(s.config_dir()))
        .join(constants::SERVER_CONFIG_FILE_NAME)
}
