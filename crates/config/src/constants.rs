pub const TOP_LEVEL_DOMAIN: &str = "io.github";
pub const AUTHOR: &str = "boxsearch";
pub const APP_NAME: &str = "boxsearch";

/// Unix socket the dispatcher listens on, under the runtime dir.
pub const UNIX_SOCKET_FILE_NAME: &str = "boxsearch.sock";
pub const SERVER_CONFIG_FILE_NAME: &str = "server.toml";
