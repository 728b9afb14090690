//! The [`AppStore`] state container and its UI/session actions.
//!
//! Entity actions live next to their entity (`projects.rs`, `chats.rs`, ...)
//! as further `impl AppStore` blocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use parley_shared::{
    ChatId, EntityKind, IntegrationId, MessageId, ModelId, ProjectId, QuickPromptId, SettingsId,
    UserId,
};

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{
    Chat, Message, Model, Project, QuickPrompt, User, UserSettings, UserSettingsIntegration,
};

/// A store shared between threads. Every action runs under the lock, which
/// keeps them atomic with respect to each other.
pub type SharedStore = Arc<Mutex<AppStore>>;

/// Central application state.
///
/// Holds one map per entity kind, keyed by the entity's own id, plus the
/// pointers a UI needs (current user, focused chat and project, sidebar).
/// All mutation goes through `&mut self` actions.
#[derive(Debug, Clone)]
pub struct AppStore {
    pub(crate) config: StoreConfig,
    pub(crate) clock: Clock,

    pub(crate) users: HashMap<UserId, User>,
    pub(crate) projects: HashMap<ProjectId, Project>,
    pub(crate) chats: HashMap<ChatId, Chat>,
    pub(crate) messages: HashMap<MessageId, Message>,
    pub(crate) models: HashMap<ModelId, Model>,
    pub(crate) quick_prompts: HashMap<QuickPromptId, QuickPrompt>,
    pub(crate) user_settings: HashMap<SettingsId, UserSettings>,
    pub(crate) integrations: HashMap<IntegrationId, UserSettingsIntegration>,

    /// Message ids of each chat in creation order.
    pub(crate) chat_messages: HashMap<ChatId, Vec<MessageId>>,

    pub(crate) current_user_id: Option<UserId>,
    pub(crate) active_chat: Option<ChatId>,
    pub(crate) active_project: Option<ProjectId>,
    pub(crate) is_sidebar_open: bool,
}

impl AppStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let is_sidebar_open = config.sidebar_open;
        Self {
            config,
            clock: Clock::new(),
            users: HashMap::new(),
            projects: HashMap::new(),
            chats: HashMap::new(),
            messages: HashMap::new(),
            models: HashMap::new(),
            quick_prompts: HashMap::new(),
            user_settings: HashMap::new(),
            integrations: HashMap::new(),
            chat_messages: HashMap::new(),
            current_user_id: None,
            active_chat: None,
            active_project: None,
            is_sidebar_open,
        }
    }

    /// Wrap the store for use behind a concurrent boundary.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // UI / session state
    // ------------------------------------------------------------------

    /// Select the active user. Existence is not checked here; actions that
    /// need a user report `NotFound` for a dangling pointer.
    pub fn set_current_user(&mut self, user_id: UserId) {
        tracing::debug!(user_id = %user_id, "current user set");
        self.current_user_id = Some(user_id);
    }

    /// Forget the active user. Focus pointers are cleared with it.
    pub fn clear_current_user(&mut self) {
        self.current_user_id = None;
        self.active_chat = None;
        self.active_project = None;
    }

    pub fn set_active_chat(&mut self, chat_id: Option<ChatId>) {
        self.active_chat = chat_id;
    }

    pub fn set_active_project(&mut self, project_id: Option<ProjectId>) {
        self.active_project = project_id;
    }

    /// Flip the sidebar and return its new state.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.is_sidebar_open = !self.is_sidebar_open;
        self.is_sidebar_open
    }

    pub fn current_user_id(&self) -> Option<&UserId> {
        self.current_user_id.as_ref()
    }

    pub fn active_chat(&self) -> Option<&ChatId> {
        self.active_chat.as_ref()
    }

    pub fn active_project(&self) -> Option<&ProjectId> {
        self.active_project.as_ref()
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.is_sidebar_open
    }

    // ------------------------------------------------------------------
    // Entity maps (read-only views of the state)
    // ------------------------------------------------------------------

    pub fn users(&self) -> &HashMap<UserId, User> {
        &self.users
    }

    pub fn projects(&self) -> &HashMap<ProjectId, Project> {
        &self.projects
    }

    pub fn chats(&self) -> &HashMap<ChatId, Chat> {
        &self.chats
    }

    pub fn messages(&self) -> &HashMap<MessageId, Message> {
        &self.messages
    }

    pub fn models(&self) -> &HashMap<ModelId, Model> {
        &self.models
    }

    pub fn quick_prompts(&self) -> &HashMap<QuickPromptId, QuickPrompt> {
        &self.quick_prompts
    }

    pub fn user_settings(&self) -> &HashMap<SettingsId, UserSettings> {
        &self.user_settings
    }

    pub fn integrations(&self) -> &HashMap<IntegrationId, UserSettingsIntegration> {
        &self.integrations
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    pub(crate) fn now(&mut self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The current user's id, checked against the user map.
    pub(crate) fn require_current_user(&self) -> Result<UserId> {
        let user_id = self
            .current_user_id
            .clone()
            .ok_or(StoreError::NoCurrentUser)?;
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::not_found(EntityKind::User, &user_id));
        }
        Ok(user_id)
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::models::{NewModel, NewUser, Profile};

    #[test]
    fn test_fresh_store_is_empty() {
        let store = AppStore::new();
        assert!(store.users().is_empty());
        assert!(store.current_user_id().is_none());
        assert!(store.active_chat().is_none());
        assert!(store.is_sidebar_open());
    }

    #[test]
    fn test_toggle_sidebar() {
        let mut store = AppStore::new();
        assert!(!store.toggle_sidebar());
        assert!(store.toggle_sidebar());
        assert!(store.is_sidebar_open());
    }

    #[test]
    fn test_focus_pointers() {
        let mut store = AppStore::new();
        let chat_id = ChatId::from("chat-1");
        store.set_active_chat(Some(chat_id.clone()));
        store.set_active_project(Some(ProjectId::from("project-1")));
        assert_eq!(store.active_chat(), Some(&chat_id));

        store.set_active_chat(None);
        assert!(store.active_chat().is_none());
        assert!(store.active_project().is_some());
    }

    #[test]
    fn test_set_current_user_does_not_validate() {
        let mut store = AppStore::new();
        store.set_current_user(UserId::from("ghost"));
        assert_eq!(store.current_user_id().map(|u| u.as_str()), Some("ghost"));

        let err = store.create_project("Notes", "").unwrap_err();
        assert!(err.is_not_found());

        store.clear_current_user();
        assert!(matches!(
            store.create_project("Notes", ""),
            Err(StoreError::NoCurrentUser)
        ));
    }

    #[test]
    fn test_shared_store_serializes_actions() {
        let mut store = AppStore::new();
        let user_id = store
            .create_user(NewUser {
                email: "ada@example.com".into(),
                profile: Profile {
                    full_name: "Ada Lovelace".into(),
                    display_name: "Ada".into(),
                    ..Default::default()
                },
            })
            .unwrap();
        store.set_current_user(user_id);
        let model_id = store
            .register_model(NewModel {
                name: "Sonnet".into(),
                is_default: true,
                ..Default::default()
            })
            .unwrap();
        let chat_id = store.create_chat(&model_id, None, None, None).unwrap();

        let shared = store.into_shared();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = Arc::clone(&shared);
                let chat_id = chat_id.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        let mut guard = shared.lock().unwrap();
                        guard
                            .add_message(&chat_id, parley_shared::Role::User, &format!("{i}-{j}"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let guard = shared.lock().unwrap();
        let messages = guard.messages_for_chat(&chat_id).unwrap();
        assert_eq!(messages.len(), 100);
        assert!(messages.windows(2).all(|w| w[0].created_at < w[1].created_at));
    }
}
