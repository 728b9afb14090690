//! Store configuration loaded from environment variables.
//!
//! Every setting has a default, so `StoreConfig::default()` is a working
//! configuration for tests and embedding.

use std::fmt;
use std::str::FromStr;

use parley_shared::constants::DEFAULT_CHAT_NAME;

/// What happens to dependents when a project or chat is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Remove dependents with their parent: a project takes its chats, a
    /// chat takes its messages.
    #[default]
    Cascade,
    /// Refuse to delete while dependents exist.
    Restrict,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(DeletePolicy::Cascade),
            "restrict" => Ok(DeletePolicy::Restrict),
            other => Err(format!("expected cascade or restrict, got {other:?}")),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Cascade => f.write_str("cascade"),
            DeletePolicy::Restrict => f.write_str("restrict"),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Delete semantics for projects and chats.
    /// Env: `PARLEY_DELETE_POLICY` (`cascade` / `restrict`)
    /// Default: `cascade`
    pub delete_policy: DeletePolicy,

    /// Create a default settings row when `update_user_settings` finds none,
    /// instead of failing.
    /// Env: `PARLEY_CREATE_SETTINGS_ON_WRITE` (true/false)
    /// Default: `false`
    pub create_settings_on_write: bool,

    /// Name of a chat created with neither a quick prompt nor a message.
    /// Env: `PARLEY_DEFAULT_CHAT_NAME`
    /// Default: `"New chat"`
    pub default_chat_name: String,

    /// Initial sidebar state of a fresh store.
    /// Env: `PARLEY_SIDEBAR_OPEN` (true/false)
    /// Default: `true`
    pub sidebar_open: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Cascade,
            create_settings_on_write: false,
            default_chat_name: DEFAULT_CHAT_NAME.to_string(),
            sidebar_open: true,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("PARLEY_DELETE_POLICY") {
            match val.parse::<DeletePolicy>() {
                Ok(policy) => config.delete_policy = policy,
                Err(e) => {
                    tracing::warn!(
                        value = %val,
                        error = %e,
                        "Invalid PARLEY_DELETE_POLICY, using default"
                    );
                }
            }
        }

        if let Some(val) = lookup("PARLEY_CREATE_SETTINGS_ON_WRITE") {
            config.create_settings_on_write = parse_flag(&val);
        }

        if let Some(name) = lookup("PARLEY_DEFAULT_CHAT_NAME") {
            match parley_shared::naming::validate_name("PARLEY_DEFAULT_CHAT_NAME", &name) {
                Ok(()) => config.default_chat_name = name,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid PARLEY_DEFAULT_CHAT_NAME, using default");
                }
            }
        }

        if let Some(val) = lookup("PARLEY_SIDEBAR_OPEN") {
            config.sidebar_open = parse_flag(&val);
        }

        config
    }
}

fn parse_flag(val: &str) -> bool {
    val != "false" && val != "0"
}
