//! Whole-store export and import as versioned JSON.
//!
//! A [`Snapshot`] holds every entity plus the session pointers. Import runs
//! the pending [`migrations`](crate::migrations) on the raw document first,
//! then checks every cross-entity invariant before handing back a store, so
//! a loaded [`AppStore`] is always in a state its actions could have produced.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use parley_shared::constants::SCHEMA_VERSION;
use parley_shared::naming::{normalize_email, validate_name};
use parley_shared::{ChatId, EntityKind, MessageId, ProjectId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migrations::run_migrations;
use crate::models::{
    Chat, Message, Model, Project, QuickPrompt, Timestamped, User, UserSettings,
    UserSettingsIntegration,
};
use crate::store::AppStore;

/// Serializable image of an [`AppStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    /// Version of the crate that wrote the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub quick_prompts: Vec<QuickPrompt>,
    #[serde(default)]
    pub user_settings: Vec<UserSettings>,
    #[serde(default)]
    pub integrations: Vec<UserSettingsIntegration>,
    #[serde(default)]
    pub session: SessionState,
}

/// UI/session pointers carried along with the entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub current_user_id: Option<UserId>,
    pub active_chat: Option<ChatId>,
    pub active_project: Option<ProjectId>,
    pub is_sidebar_open: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_user_id: None,
            active_chat: None,
            active_project: None,
            is_sidebar_open: true,
        }
    }
}

impl AppStore {
    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Capture the full state. Every list is ordered by `(createdAt, id)`,
    /// so two exports of the same state are identical apart from `exportedAt`.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SCHEMA_VERSION,
            exported_at: Some(Utc::now()),
            app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            users: sorted_records(&self.users),
            projects: sorted_records(&self.projects),
            chats: sorted_records(&self.chats),
            messages: sorted_records(&self.messages),
            models: sorted_records(&self.models),
            quick_prompts: sorted_records(&self.quick_prompts),
            user_settings: sorted_records(&self.user_settings),
            integrations: sorted_records(&self.integrations),
            session: SessionState {
                current_user_id: self.current_user_id.clone(),
                active_chat: self.active_chat.clone(),
                active_project: self.active_project.clone(),
                is_sidebar_open: self.is_sidebar_open,
            },
        }
    }

    /// The snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.export_snapshot();
        tracing::info!(
            users = snapshot.users.len(),
            chats = snapshot.chats.len(),
            messages = snapshot.messages.len(),
            "exporting snapshot"
        );
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Parse, migrate and validate a JSON snapshot.
    pub fn from_json(json: &str, config: StoreConfig) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)?;
        Self::from_snapshot_value(doc, config)
    }

    /// Migrate a raw snapshot document to the current schema, then load it.
    pub fn from_snapshot_value(mut doc: Value, config: StoreConfig) -> Result<Self> {
        run_migrations(&mut doc)?;
        let snapshot: Snapshot = serde_json::from_value(doc)?;
        Self::from_snapshot(snapshot, config)
    }

    /// Build a store from a snapshot already in the current shape.
    ///
    /// Emails are stored in their canonical lower-case form. Fails with
    /// [`StoreError::InvalidSnapshot`] on the first broken invariant. Session pointers to missing records are dropped with a
    /// warning rather than rejected.
    pub fn from_snapshot(snapshot: Snapshot, config: StoreConfig) -> Result<Self> {
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchemaVersion {
                found: u64::from(snapshot.schema_version),
                min: SCHEMA_VERSION,
                max: SCHEMA_VERSION,
            });
        }

        let mut users = snapshot.users;
        for user in &mut users {
            user.email = normalize_email(&user.email)
                .map_err(|e| StoreError::InvalidSnapshot(format!("user {}: {e}", user.id)))?;
        }

        let mut store = AppStore::with_config(config);
        store.users = index_by(users, EntityKind::User, |u| u.id.clone())?;
        store.projects = index_by(snapshot.projects, EntityKind::Project, |p| p.id.clone())?;
        store.chats = index_by(snapshot.chats, EntityKind::Chat, |c| c.id.clone())?;
        store.messages = index_by(snapshot.messages, EntityKind::Message, |m| m.id.clone())?;
        store.models = index_by(snapshot.models, EntityKind::Model, |m| m.id.clone())?;
        store.quick_prompts =
            index_by(snapshot.quick_prompts, EntityKind::QuickPrompt, |p| p.id.clone())?;
        store.user_settings =
            index_by(snapshot.user_settings, EntityKind::UserSettings, |s| s.id.clone())?;
        store.integrations =
            index_by(snapshot.integrations, EntityKind::Integration, |i| i.id.clone())?;

        if let Some(violation) = store.integrity_violations().into_iter().next() {
            return Err(StoreError::InvalidSnapshot(violation));
        }

        store.rebuild_message_index();
        store.clock = clock_after(&store);
        store.restore_session(snapshot.session);

        let defaults = store.models.values().filter(|m| m.is_default()).count();
        if defaults > 1 {
            tracing::warn!(
                defaults,
                "snapshot has several default models; the oldest one is used"
            );
        }

        tracing::info!(
            users = store.users.len(),
            projects = store.projects.len(),
            chats = store.chats.len(),
            messages = store.messages.len(),
            "snapshot imported"
        );
        Ok(store)
    }

    /// Every cross-entity invariant the current state breaks, one line each.
    ///
    /// An empty list means the store is consistent. Actions maintain these
    /// invariants; only imported data can break them.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut out = Vec::new();

        let mut emails = HashSet::new();
        for user in self.users.values() {
            match normalize_email(&user.email) {
                Ok(email) if email != user.email => {
                    out.push(format!("user {} has non-canonical email {}", user.id, user.email));
                }
                Ok(_) => {}
                Err(e) => out.push(format!("user {}: {e}", user.id)),
            }
            if !emails.insert(user.email.trim().to_lowercase()) {
                out.push(format!("duplicate email {}", user.email));
            }
        }

        for project in self.projects.values() {
            if !self.users.contains_key(&project.user_id) {
                out.push(format!("project {} references missing user {}", project.id, project.user_id));
            }
            if let Err(e) = validate_name("name", &project.name) {
                out.push(format!("project {}: {e}", project.id));
            }
        }

        for chat in self.chats.values() {
            if !self.users.contains_key(&chat.user_id) {
                out.push(format!("chat {} references missing user {}", chat.id, chat.user_id));
            }
            if !self.models.contains_key(&chat.model_id) {
                out.push(format!("chat {} references missing model {}", chat.id, chat.model_id));
            }
            if let Some(project_id) = &chat.project_id {
                match self.projects.get(project_id) {
                    None => out.push(format!(
                        "chat {} references missing project {project_id}",
                        chat.id
                    )),
                    Some(project) if project.user_id != chat.user_id => out.push(format!(
                        "chat {} is filed under project {project_id} of another user",
                        chat.id
                    )),
                    Some(_) => {}
                }
            }
            if let Err(e) = validate_name("name", &chat.name) {
                out.push(format!("chat {}: {e}", chat.id));
            }
            if chat.last_message_at < chat.created_at {
                out.push(format!("chat {} has lastMessageAt before createdAt", chat.id));
            }
        }

        for message in self.messages.values() {
            match self.chats.get(&message.chat_id) {
                None => out.push(format!(
                    "message {} references missing chat {}",
                    message.id, message.chat_id
                )),
                Some(chat) if message.created_at > chat.last_message_at => out.push(format!(
                    "message {} is newer than lastMessageAt of chat {}",
                    message.id, chat.id
                )),
                Some(_) => {}
            }
        }

        for model in self.models.values() {
            if let Err(e) = validate_name("name", &model.name) {
                out.push(format!("model {}: {e}", model.id));
            }
        }

        for prompt in self.quick_prompts.values() {
            if let Err(e) = validate_name("name", &prompt.name) {
                out.push(format!("quick prompt {}: {e}", prompt.id));
            }
            if let Err(e) = validate_name("chatName", &prompt.chat_name) {
                out.push(format!("quick prompt {}: {e}", prompt.id));
            }
        }

        let mut settings_owners = HashSet::new();
        for settings in self.user_settings.values() {
            if !self.users.contains_key(&settings.user_id) {
                out.push(format!(
                    "settings {} reference missing user {}",
                    settings.id, settings.user_id
                ));
            }
            if !settings_owners.insert(&settings.user_id) {
                out.push(format!("user {} has several settings rows", settings.user_id));
            }
        }

        let mut integration_keys = HashSet::new();
        for integration in self.integrations.values() {
            if !self.users.contains_key(&integration.user_id) {
                out.push(format!(
                    "integration {} references missing user {}",
                    integration.id, integration.user_id
                ));
            }
            if !integration_keys.insert((&integration.user_id, integration.integration_type)) {
                out.push(format!(
                    "user {} has several {} integrations",
                    integration.user_id, integration.integration_type
                ));
            }
        }

        check_timestamps(&mut out, EntityKind::User, &self.users);
        check_timestamps(&mut out, EntityKind::Project, &self.projects);
        check_timestamps(&mut out, EntityKind::Chat, &self.chats);
        check_timestamps(&mut out, EntityKind::Message, &self.messages);
        check_timestamps(&mut out, EntityKind::Model, &self.models);
        check_timestamps(&mut out, EntityKind::QuickPrompt, &self.quick_prompts);
        check_timestamps(&mut out, EntityKind::UserSettings, &self.user_settings);
        check_timestamps(&mut out, EntityKind::Integration, &self.integrations);

        out.sort();
        out
    }

    fn rebuild_message_index(&mut self) {
        let mut index: HashMap<ChatId, Vec<&Message>> = self
            .chats
            .keys()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        for message in self.messages.values() {
            index.entry(message.chat_id.clone()).or_default().push(message);
        }

        self.chat_messages = index
            .into_iter()
            .map(|(chat_id, mut messages)| {
                messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
                let ids: Vec<MessageId> = messages.into_iter().map(|m| m.id.clone()).collect();
                (chat_id, ids)
            })
            .collect();
    }

    fn restore_session(&mut self, session: SessionState) {
        self.is_sidebar_open = session.is_sidebar_open;
        self.current_user_id = session
            .current_user_id
            .filter(|id| keep_pointer(self.users.contains_key(id), "currentUserId", id));
        self.active_chat = session
            .active_chat
            .filter(|id| keep_pointer(self.chats.contains_key(id), "activeChat", id));
        self.active_project = session
            .active_project
            .filter(|id| keep_pointer(self.projects.contains_key(id), "activeProject", id));
    }
}

fn keep_pointer(exists: bool, field: &str, id: &impl Display) -> bool {
    if !exists {
        tracing::warn!(field, id = %id, "dropping session pointer to missing record");
    }
    exists
}

fn sorted_records<K, T>(map: &HashMap<K, T>) -> Vec<T>
where
    K: Ord,
    T: Clone + Timestamped,
{
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|(ka, a), (kb, b)| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| ka.cmp(kb))
    });
    entries.into_iter().map(|(_, record)| record.clone()).collect()
}

fn index_by<K, T>(records: Vec<T>, kind: EntityKind, key: impl Fn(&T) -> K) -> Result<HashMap<K, T>>
where
    K: Eq + Hash + Display,
{
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let id = key(&record);
        if map.contains_key(&id) {
            return Err(StoreError::InvalidSnapshot(format!("duplicate {kind} id {id}")));
        }
        map.insert(id, record);
    }
    Ok(map)
}

fn check_timestamps<K: Display, T: Timestamped>(
    out: &mut Vec<String>,
    kind: EntityKind,
    records: &HashMap<K, T>,
) {
    for (id, record) in records {
        if record.updated_at() < record.created_at() {
            out.push(format!("{kind} {id} has updatedAt before createdAt"));
        }
    }
}

/// A clock that issues instants after every timestamp already in the store.
fn clock_after(store: &AppStore) -> Clock {
    let mut clock = Clock::new();
    let latest = store
        .users
        .values()
        .map(Timestamped::updated_at)
        .chain(store.projects.values().map(Timestamped::updated_at))
        .chain(store.chats.values().map(|c| c.updated_at.max(c.last_message_at)))
        .chain(store.messages.values().map(Timestamped::updated_at))
        .chain(store.models.values().map(Timestamped::updated_at))
        .chain(store.quick_prompts.values().map(Timestamped::updated_at))
        .chain(store.user_settings.values().map(Timestamped::updated_at))
        .chain(store.integrations.values().map(Timestamped::updated_at))
        .max();
    if let Some(at) = latest {
        clock.observe(at);
    }
    clock
}
