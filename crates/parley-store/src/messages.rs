use chrono::{DateTime, Utc};
use parley_shared::{ChatId, EntityKind, MessageId, Role};

use crate::error::{Result, StoreError};
use crate::models::{Message, Timestamped};
use crate::store::AppStore;

impl AppStore {
    /// Append a message to a chat and return its id.
    ///
    /// The chat's `last_message_at` becomes the message's `created_at`. The
    /// role is taken as given; user/assistant alternation is not enforced.
    pub fn add_message(&mut self, chat_id: &ChatId, role: Role, content: &str) -> Result<MessageId> {
        self.chat(chat_id)?;
        let now = self.now();
        let id = self.append_message(chat_id, role, content.to_string(), now);
        tracing::debug!(chat_id = %chat_id, message_id = %id, role = %role, "message added");
        Ok(id)
    }

    pub fn message(&self, id: &MessageId) -> Result<&Message> {
        self.messages
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Message, id))
    }

    /// Messages of a chat, oldest first.
    pub fn messages_for_chat(&self, chat_id: &ChatId) -> Result<Vec<&Message>> {
        self.chat(chat_id)?;
        Ok(self
            .chat_messages
            .get(chat_id)
            .map(|ids| ids.iter().filter_map(|id| self.messages.get(id)).collect())
            .unwrap_or_default())
    }

    /// Newest message of a chat, if it has any.
    pub fn last_message(&self, chat_id: &ChatId) -> Option<&Message> {
        self.chat_messages
            .get(chat_id)
            .and_then(|ids| ids.last())
            .and_then(|id| self.messages.get(id))
    }

    /// Insert a message for an existing chat at `at` and bump the chat's
    /// activity. Callers check the chat exists.
    pub(crate) fn append_message(
        &mut self,
        chat_id: &ChatId,
        role: Role,
        content: String,
        at: DateTime<Utc>,
    ) -> MessageId {
        let message = Message {
            id: MessageId::new(),
            chat_id: chat_id.clone(),
            role,
            content,
            created_at: at,
            updated_at: at,
        };
        let id = message.id.clone();

        self.messages.insert(id.clone(), message);
        self.chat_messages
            .entry(chat_id.clone())
            .or_default()
            .push(id.clone());

        if let Some(chat) = self.chats.get_mut(chat_id) {
            if at > chat.last_message_at {
                chat.last_message_at = at;
            }
            chat.touch(at);
        }
        id
    }
}
