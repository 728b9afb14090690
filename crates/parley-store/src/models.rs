//! Domain model structs held by the [`AppStore`](crate::AppStore).
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names, so records can be handed to a UI layer or written into a
//! [`Snapshot`](crate::Snapshot) as-is. Timestamps travel as RFC 3339 strings.

use chrono::{DateTime, Utc};
use parley_shared::{
    ChatFont, ChatId, ColorMode, IntegrationId, IntegrationType, MessageId, ModelId,
    ProjectId, PromptCategory, QuickPromptId, Role, SettingsId, UserId,
};
use serde::{Deserialize, Serialize};

/// Creation/update timestamps shared by every entity.
///
/// `updated_at() >= created_at()` always holds; [`touch`](Self::touch) never
/// moves `updated_at` backwards.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn touch(&mut self, at: DateTime<Utc>);
}

macro_rules! timestamped {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Timestamped for $ty {
                fn created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }

                fn updated_at(&self) -> DateTime<Utc> {
                    self.updated_at
                }

                fn touch(&mut self, at: DateTime<Utc>) {
                    if at > self.updated_at {
                        self.updated_at = at;
                    }
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account. Profile fields live on [`UserSettings`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Unique across users, compared case-insensitively.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A collection of related chats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub user_id: UserId,
    /// At most 90 characters; may contain any Unicode.
    pub name: String,
    pub description: String,
    pub is_starred: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation thread, optionally filed under a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// From the first message or a quick prompt; at most 90 characters.
    pub name: String,
    pub model_id: ModelId,
    pub is_starred: bool,
    pub is_archived: bool,
    /// Sort key for recent activity. Never decreases.
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One entry of a chat. Messages are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// An assistant model a chat can be bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_default(&self) -> bool {
        self.is_default.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// QuickPrompt
// ---------------------------------------------------------------------------

/// A template that seeds the name and first message of a new chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuickPrompt {
    pub id: QuickPromptId,
    pub category: PromptCategory,
    /// Label shown in the prompt list.
    pub name: String,
    /// Name given to the chat created from this prompt.
    pub chat_name: String,
    /// Text of the chat's first message.
    pub prompt_content: String,
    /// Display sort key; gaps are allowed.
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// UserSettings
// ---------------------------------------------------------------------------

/// Preferences and profile of one user. Exactly one row per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: SettingsId,
    pub user_id: UserId,
    pub color_mode: ColorMode,
    pub chat_font: ChatFont,
    pub use_location_metadata: bool,
    pub full_name: String,
    /// "What should we call you?"
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    /// Artefacts feature preview toggle.
    pub artefacts: bool,
    /// Analysis tool feature preview toggle.
    pub analysis_tool: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Default preferences carrying the given profile.
    pub fn new(user_id: UserId, profile: Profile, at: DateTime<Utc>) -> Self {
        Self {
            id: SettingsId::new(),
            user_id,
            color_mode: ColorMode::default(),
            chat_font: ChatFont::default(),
            use_location_metadata: false,
            full_name: profile.full_name,
            display_name: profile.display_name,
            work_description: non_empty(profile.work_description),
            custom_instructions: non_empty(profile.custom_instructions),
            artefacts: false,
            analysis_tool: false,
            created_at: at,
            updated_at: at,
        }
    }
}

// ---------------------------------------------------------------------------
// UserSettingsIntegration
// ---------------------------------------------------------------------------

/// A connection to an external service. One per `(user, type)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsIntegration {
    pub id: IntegrationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    pub name: String,
    pub is_connected: bool,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

timestamped!(
    User,
    Project,
    Chat,
    Message,
    Model,
    QuickPrompt,
    UserSettings,
    UserSettingsIntegration,
);

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Profile fields collected at sign-up or in the profile screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub display_name: String,
    #[serde(default)]
    pub work_description: Option<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

/// Input of [`AppStore::create_user`](crate::AppStore::create_user).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Input of [`AppStore::register_model`](crate::AppStore::register_model).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    /// Fixed id such as `"claude-3-7-sonnet"`; generated when absent.
    #[serde(default)]
    pub id: Option<ModelId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Input of [`AppStore::register_quick_prompt`](crate::AppStore::register_quick_prompt).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuickPrompt {
    #[serde(default)]
    pub id: Option<QuickPromptId>,
    pub category: PromptCategory,
    pub name: String,
    pub chat_name: String,
    pub prompt_content: String,
    pub order: i64,
}

/// Input of [`AppStore::add_integration`](crate::AppStore::add_integration).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewIntegration {
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    /// Defaults to the service's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to the wire name of the type.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// Fields of a project that may change after creation. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_starred: Option<bool>,
    pub is_archived: Option<bool>,
}

/// Fields of a chat that may change through `update_chat`.
///
/// `projectId` moves go through `move_chat` and `lastMessageAt` through
/// `add_message`, where their invariants are checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatUpdate {
    pub name: Option<String>,
    pub model_id: Option<ModelId>,
    pub is_starred: Option<bool>,
    pub is_archived: Option<bool>,
}

/// Partial settings update. For the optional text fields an empty string
/// clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub color_mode: Option<ColorMode>,
    pub chat_font: Option<ChatFont>,
    pub use_location_metadata: Option<bool>,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub work_description: Option<String>,
    pub custom_instructions: Option<String>,
    pub artefacts: Option<bool>,
    pub analysis_tool: Option<bool>,
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
