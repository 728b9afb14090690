//! Chat actions.

use parley_shared::naming::{derive_chat_name, validate_name};
use parley_shared::{ChatId, EntityKind, ModelId, ProjectId, QuickPromptId, Role, UserId};

use crate::config::DeletePolicy;
use crate::error::{Result, StoreError};
use crate::models::{Chat, ChatUpdate, Timestamped};
use crate::store::AppStore;
use crate::views::ListFilter;

impl AppStore {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Start a chat for the current user on the given model.
    ///
    /// Seeding, in order of precedence:
    /// - `quick_prompt_id`: the chat takes the prompt's `chat_name` and its
    ///   `prompt_content` becomes the first (user) message;
    /// - `initial_message`: the chat is named after the message (whitespace
    ///   collapsed, cut at 90 characters) and the message is appended;
    /// - neither: the configured default name and no messages.
    ///
    /// A blank `initial_message` counts as absent. `last_message_at` is the
    /// creation instant, which is also the first message's `created_at`.
    pub fn create_chat(
        &mut self,
        model_id: &ModelId,
        initial_message: Option<&str>,
        project_id: Option<&ProjectId>,
        quick_prompt_id: Option<&QuickPromptId>,
    ) -> Result<ChatId> {
        let user_id = self.require_current_user()?;
        if !self.models.contains_key(model_id) {
            return Err(StoreError::not_found(EntityKind::Model, model_id));
        }

        let id = ChatId::new();
        if let Some(project_id) = project_id {
            self.check_project_owner(&id, project_id, &user_id)?;
        }

        let (name, first_message) = match quick_prompt_id {
            Some(prompt_id) => {
                let prompt = self.quick_prompt(prompt_id)?;
                (prompt.chat_name.clone(), Some(prompt.prompt_content.clone()))
            }
            None => match initial_message.and_then(|m| derive_chat_name(m).map(|n| (n, m))) {
                Some((name, message)) => (name, Some(message.to_string())),
                None => (self.config.default_chat_name.clone(), None),
            },
        };

        let now = self.now();
        let chat = Chat {
            id: id.clone(),
            user_id,
            project_id: project_id.cloned(),
            name,
            model_id: model_id.clone(),
            is_starred: false,
            is_archived: false,
            last_message_at: now,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!(
            chat_id = %id,
            model_id = %model_id,
            seeded = first_message.is_some(),
            "chat created"
        );
        self.chats.insert(id.clone(), chat);
        self.chat_messages.insert(id.clone(), Vec::new());

        if let Some(content) = first_message {
            self.append_message(&id, Role::User, content, now);
        }
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn chat(&self, id: &ChatId) -> Result<&Chat> {
        self.chats
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Chat, id))
    }

    /// Chats of a user, most recent activity first.
    pub fn chats_for_user(&self, user_id: &UserId, filter: ListFilter) -> Vec<&Chat> {
        let chats = self
            .chats
            .values()
            .filter(|c| &c.user_id == user_id && filter.admits(c.is_starred, c.is_archived))
            .collect();
        by_recent_activity(chats)
    }

    pub fn current_user_chats(&self, filter: ListFilter) -> Result<Vec<&Chat>> {
        let user_id = self.require_current_user()?;
        Ok(self.chats_for_user(&user_id, filter))
    }

    /// Chats filed under a project, archived ones included.
    pub fn chats_in_project(&self, project_id: &ProjectId) -> Result<Vec<&Chat>> {
        self.project(project_id)?;
        let chats = self
            .chats
            .values()
            .filter(|c| c.project_id.as_ref() == Some(project_id))
            .collect();
        Ok(by_recent_activity(chats))
    }

    /// The current user's chats that belong to no project.
    pub fn unfiled_chats(&self, filter: ListFilter) -> Result<Vec<&Chat>> {
        let user_id = self.require_current_user()?;
        let chats = self
            .chats
            .values()
            .filter(|c| {
                c.user_id == user_id
                    && c.project_id.is_none()
                    && filter.admits(c.is_starred, c.is_archived)
            })
            .collect();
        Ok(by_recent_activity(chats))
    }

    /// Up to `limit` non-archived chats of the current user, most recent first.
    pub fn recent_chats(&self, limit: usize) -> Result<Vec<&Chat>> {
        let mut chats = self.current_user_chats(ListFilter::default())?;
        chats.truncate(limit);
        Ok(chats)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Merge the provided fields into a chat and refresh `updated_at`.
    pub fn update_chat(&mut self, id: &ChatId, updates: ChatUpdate) -> Result<()> {
        if let Some(name) = &updates.name {
            validate_name("name", name)?;
        }
        if let Some(model_id) = &updates.model_id {
            if !self.models.contains_key(model_id) {
                return Err(StoreError::not_found(EntityKind::Model, model_id));
            }
        }

        let now = self.now();
        let chat = self.chat_mut(id)?;
        if let Some(name) = updates.name {
            chat.name = name;
        }
        if let Some(model_id) = updates.model_id {
            chat.model_id = model_id;
        }
        if let Some(starred) = updates.is_starred {
            chat.is_starred = starred;
        }
        if let Some(archived) = updates.is_archived {
            chat.is_archived = archived;
        }
        chat.touch(now);

        tracing::debug!(chat_id = %id, "chat updated");
        Ok(())
    }

    /// Flip `is_starred` and return the new value.
    pub fn toggle_chat_star(&mut self, id: &ChatId) -> Result<bool> {
        let now = self.now();
        let chat = self.chat_mut(id)?;
        chat.is_starred = !chat.is_starred;
        chat.touch(now);
        Ok(chat.is_starred)
    }

    /// Flip `is_archived` and return the new value.
    pub fn toggle_chat_archive(&mut self, id: &ChatId) -> Result<bool> {
        let now = self.now();
        let chat = self.chat_mut(id)?;
        chat.is_archived = !chat.is_archived;
        chat.touch(now);
        Ok(chat.is_archived)
    }

    /// File a chat under a project, or detach it with `None`.
    ///
    /// The target project must exist and belong to the chat's owner.
    pub fn move_chat(&mut self, chat_id: &ChatId, project_id: Option<&ProjectId>) -> Result<()> {
        let owner = self.chat(chat_id)?.user_id.clone();
        if let Some(project_id) = project_id {
            self.check_project_owner(chat_id, project_id, &owner)?;
        }

        let now = self.now();
        let chat = self.chat_mut(chat_id)?;
        chat.project_id = project_id.cloned();
        chat.touch(now);

        tracing::debug!(
            chat_id = %chat_id,
            project_id = ?project_id.map(ProjectId::as_str),
            "chat moved"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove a chat. Its messages go with it unless the store runs the
    /// restrict policy, in which case a chat with messages cannot be deleted.
    pub fn delete_chat(&mut self, id: &ChatId) -> Result<()> {
        self.chat(id)?;

        let dependents = self.chat_messages.get(id).map_or(0, Vec::len);
        if self.config.delete_policy == DeletePolicy::Restrict && dependents > 0 {
            return Err(StoreError::HasDependents {
                kind: EntityKind::Chat,
                id: id.to_string(),
                dependents,
            });
        }

        let removed = self.remove_chat(id);
        tracing::debug!(chat_id = %id, messages = removed, "chat deleted");
        Ok(())
    }

    /// Drop a chat and its messages unconditionally. Returns the number of
    /// messages removed.
    pub(crate) fn remove_chat(&mut self, id: &ChatId) -> usize {
        self.chats.remove(id);
        let message_ids = self.chat_messages.remove(id).unwrap_or_default();
        for message_id in &message_ids {
            self.messages.remove(message_id);
        }
        if self.active_chat.as_ref() == Some(id) {
            self.active_chat = None;
        }
        message_ids.len()
    }

    fn chat_mut(&mut self, id: &ChatId) -> Result<&mut Chat> {
        self.chats
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Chat, id))
    }

    fn check_project_owner(
        &self,
        chat_id: &ChatId,
        project_id: &ProjectId,
        owner: &UserId,
    ) -> Result<()> {
        let project = self.project(project_id)?;
        if &project.user_id != owner {
            return Err(StoreError::OwnershipMismatch {
                chat_id: chat_id.clone(),
                project_id: project_id.clone(),
            });
        }
        Ok(())
    }
}

fn by_recent_activity(mut chats: Vec<&Chat>) -> Vec<&Chat> {
    chats.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    chats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::testing::{fixture, fixture_with, new_user};

    #[test]
    fn test_create_chat_from_quick_prompt() {
        let mut fx = fixture();
        let id = fx
            .store
            .create_chat(&fx.model, None, None, Some(&fx.prompt))
            .unwrap();

        let chat = fx.store.chat(&id).unwrap();
        assert_eq!(chat.name, "Brainstorm");
        assert_eq!(chat.user_id, fx.user);

        let messages = fx.store.messages_for_chat(&id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Let's brainstorm");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(chat.last_message_at, messages[0].created_at);
    }

    #[test]
    fn test_quick_prompt_wins_over_initial_message() {
        let mut fx = fixture();
        let id = fx
            .store
            .create_chat(&fx.model, Some("ignored"), None, Some(&fx.prompt))
            .unwrap();
        assert_eq!(fx.store.chat(&id).unwrap().name, "Brainstorm");
        assert_eq!(fx.store.messages_for_chat(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_create_chat_from_initial_message() {
        let mut fx = fixture();
        let text = format!("Explain   borrowing\n{}", "in depth ".repeat(20));
        let id = fx.store.create_chat(&fx.model, Some(&text), None, None).unwrap();

        let chat = fx.store.chat(&id).unwrap();
        assert!(chat.name.starts_with("Explain borrowing in depth"));
        // Cut at 90 characters, then the trailing space is dropped.
        assert_eq!(chat.name.chars().count(), 89);
        assert!(chat.name.ends_with("depth"));
        assert_eq!(chat.created_at, chat.updated_at);
        assert_eq!(chat.last_message_at, chat.created_at);

        let messages = fx.store.messages_for_chat(&id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, text);
    }

    #[test]
    fn test_create_chat_without_seed() {
        let mut fx = fixture();
        let id = fx.store.create_chat(&fx.model, Some("  "), None, None).unwrap();
        assert_eq!(fx.store.chat(&id).unwrap().name, "New chat");
        assert!(fx.store.messages_for_chat(&id).unwrap().is_empty());
    }

    #[test]
    fn test_create_chat_validates_references() {
        let mut fx = fixture();
        let err = fx
            .store
            .create_chat(&ModelId::from("gpt-nope"), None, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::Model,
                ..
            }
        ));

        let err = fx
            .store
            .create_chat(&fx.model, None, None, Some(&QuickPromptId::from("missing")))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = fx
            .store
            .create_chat(&fx.model, None, Some(&ProjectId::from("missing")), None)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(fx.store.chats().is_empty());
    }

    #[test]
    fn test_create_chat_in_foreign_project_rejected() {
        let mut fx = fixture();
        let bob = fx
            .store
            .create_user(new_user("bob@example.com", "Bob Builder"))
            .unwrap();
        fx.store.set_current_user(bob);
        let bobs_project = fx.store.create_project("Bob's", "").unwrap();
        fx.store.set_current_user(fx.user.clone());

        let err = fx
            .store
            .create_chat(&fx.model, None, Some(&bobs_project), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::OwnershipMismatch { .. }));
    }

    #[test]
    fn test_update_chat() {
        let mut fx = fixture();
        let id = fx.store.create_chat(&fx.model, Some("hi"), None, None).unwrap();

        fx.store
            .update_chat(
                &id,
                ChatUpdate {
                    name: Some("Greetings".into()),
                    is_archived: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        let chat = fx.store.chat(&id).unwrap();
        assert_eq!(chat.name, "Greetings");
        assert!(chat.is_archived);
        assert!(chat.updated_at > chat.created_at);

        let err = fx
            .store
            .update_chat(
                &id,
                ChatUpdate {
                    name: Some("z".repeat(91)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = fx
            .store
            .update_chat(
                &id,
                ChatUpdate {
                    model_id: Some(ModelId::from("unknown")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_after_delete_is_not_found() {
        let mut fx = fixture();
        let id = fx.store.create_chat(&fx.model, Some("hi"), None, None).unwrap();
        fx.store.set_active_chat(Some(id.clone()));

        fx.store.delete_chat(&id).unwrap();

        let err = fx
            .store
            .update_chat(
                &id,
                ChatUpdate {
                    name: Some("again".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(fx.store.messages().is_empty());
        assert!(fx.store.active_chat().is_none());
        assert!(fx.store.delete_chat(&id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_chat_restricted() {
        let mut fx = fixture_with(StoreConfig {
            delete_policy: DeletePolicy::Restrict,
            ..Default::default()
        });
        let with_messages = fx.store.create_chat(&fx.model, Some("hi"), None, None).unwrap();
        let empty = fx.store.create_chat(&fx.model, None, None, None).unwrap();

        assert!(matches!(
            fx.store.delete_chat(&with_messages),
            Err(StoreError::HasDependents { dependents: 1, .. })
        ));
        fx.store.delete_chat(&empty).unwrap();
        assert!(fx.store.chat(&with_messages).is_ok());
    }

    #[test]
    fn test_move_chat_and_detach() {
        let mut fx = fixture();
        let project = fx.store.create_project("Work", "").unwrap();
        let chat = fx.store.create_chat(&fx.model, Some("hi"), None, None).unwrap();

        fx.store.move_chat(&chat, Some(&project)).unwrap();
        assert_eq!(fx.store.chat(&chat).unwrap().project_id.as_ref(), Some(&project));
        assert_eq!(fx.store.chats_in_project(&project).unwrap().len(), 1);
        assert!(fx.store.unfiled_chats(ListFilter::default()).unwrap().is_empty());

        fx.store.move_chat(&chat, None).unwrap();
        assert!(fx.store.chat(&chat).unwrap().project_id.is_none());
        assert!(fx.store.chats_in_project(&project).unwrap().is_empty());
        assert_eq!(fx.store.unfiled_chats(ListFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_move_chat_validates_target() {
        let mut fx = fixture();
        let chat = fx.store.create_chat(&fx.model, Some("hi"), None, None).unwrap();

        assert!(fx
            .store
            .move_chat(&chat, Some(&ProjectId::from("missing")))
            .unwrap_err()
            .is_not_found());
        assert!(fx
            .store
            .move_chat(&ChatId::from("missing"), None)
            .unwrap_err()
            .is_not_found());

        let bob = fx
            .store
            .create_user(new_user("bob@example.com", "Bob Builder"))
            .unwrap();
        fx.store.set_current_user(bob);
        let bobs_project = fx.store.create_project("Bob's", "").unwrap();

        let err = fx.store.move_chat(&chat, Some(&bobs_project)).unwrap_err();
        assert!(matches!(err, StoreError::OwnershipMismatch { .. }));
        assert!(fx.store.chat(&chat).unwrap().project_id.is_none());
    }

    #[test]
    fn test_chat_toggles() {
        let mut fx = fixture();
        let id = fx.store.create_chat(&fx.model, None, None, None).unwrap();
        assert!(fx.store.toggle_chat_star(&id).unwrap());
        assert!(fx.store.toggle_chat_archive(&id).unwrap());
        assert!(!fx.store.toggle_chat_archive(&id).unwrap());
        assert!(fx
            .store
            .toggle_chat_star(&ChatId::from("missing"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_recent_chats_order_and_limit() {
        let mut fx = fixture();
        let first = fx.store.create_chat(&fx.model, Some("one"), None, None).unwrap();
        let second = fx.store.create_chat(&fx.model, Some("two"), None, None).unwrap();
        let third = fx.store.create_chat(&fx.model, Some("three"), None, None).unwrap();
        fx.store.toggle_chat_archive(&third).unwrap();

        // Activity in the first chat bumps it to the top.
        fx.store.add_message(&first, Role::Assistant, "reply").unwrap();

        let recent: Vec<_> = fx
            .store
            .recent_chats(5)
            .unwrap()
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(recent, vec![first.clone(), second]);

        assert_eq!(fx.store.recent_chats(1).unwrap()[0].id, first);
    }
}
