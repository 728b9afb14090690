/// Application name
pub const APP_NAME: &str = "Parley";

/// Maximum length of a project or chat name, in Unicode scalar values
pub const MAX_NAME_CHARS: usize = 90;

/// Snapshot schema version produced by this build.
/// 1 = profile fields on `User`, 2 = profile fields on `UserSettings` plus integrations.
pub const SCHEMA_VERSION: u32 = 2;

/// Oldest snapshot schema version the loader can still migrate
pub const MIN_SCHEMA_VERSION: u32 = 1;

/// Name given to a chat created without a quick prompt or initial message
pub const DEFAULT_CHAT_NAME: &str = "New chat";
