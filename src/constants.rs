// Fixed wire values plus defaults that can be overridden from the environment.

use std::env;

/// Key under which the credential is kept in the persistent store.
pub const CREDENTIAL_KEY: &str = "api_Key";

/// Assistant turn content used whenever no usable reply text is available.
pub const FALLBACK_REPLY: &str = "Something went wrong, please try again.";

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_ASSISTANT_NAME: &str = "ChatGPT";
pub const USER_LABEL: &str = "You";

lazy_static::lazy_static! {
    // $HOME/.chatgate, falling back to the working directory when HOME is unset.
    pub static ref DATA_DIR: String = env::var("HOME")
        .map(|home| format!("{}/.chatgate", home))
        .unwrap_or_else(|_| ".chatgate".to_string());
    pub static ref DEFAULT_STORE_PATH: String = format!("{}/store.json", *DATA_DIR);
    pub static ref DEFAULT_LOG_FILE: String = format!("{}/chatgate.log", *DATA_DIR);
}
