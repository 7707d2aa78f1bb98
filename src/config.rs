use std::path::PathBuf;

use crate::constants;

/// Runtime configuration, built once at startup and handed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Full URL of the chat-completions endpoint.
    pub api_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// JSON file backing the persistent key-value store.
    pub store_path: PathBuf,
    /// Label shown next to assistant turns.
    pub assistant_name: String,
    /// Where the terminal UI writes its log.
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            store_path: PathBuf::from(constants::DEFAULT_STORE_PATH.as_str()),
            assistant_name: constants::DEFAULT_ASSISTANT_NAME.to_string(),
            log_file: PathBuf::from(constants::DEFAULT_LOG_FILE.as_str()),
        }
    }
}
