//! Read-side views derived from the entity maps. Nothing here is stored.

use chrono::{DateTime, Utc};
use parley_shared::{ChatId, ProjectId, UserId};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Chat, Project};
use crate::store::AppStore;

/// Which starred/archived records a listing returns.
///
/// The default hides archived records and does not filter on stars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub starred_only: bool,
    pub include_archived: bool,
}

impl ListFilter {
    pub fn admits(&self, is_starred: bool, is_archived: bool) -> bool {
        (!self.starred_only || is_starred) && (self.include_archived || !is_archived)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

/// A chat with its newest message and the project it is filed under.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatWithDetails {
    #[serde(flatten)]
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

/// A project with the number of chats filed under it and the latest
/// activity among them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithDetails {
    #[serde(flatten)]
    pub project: Project,
    pub chat_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl AppStore {
    pub fn chat_with_details(&self, id: &ChatId) -> Result<ChatWithDetails> {
        let chat = self.chat(id)?;
        Ok(self.detail_chat(chat))
    }

    pub fn project_with_details(&self, id: &ProjectId) -> Result<ProjectWithDetails> {
        let project = self.project(id)?;
        Ok(self.detail_project(project))
    }

    /// [`chats_for_user`](Self::chats_for_user) with details attached.
    pub fn chats_with_details_for_user(
        &self,
        user_id: &UserId,
        filter: ListFilter,
    ) -> Vec<ChatWithDetails> {
        self.chats_for_user(user_id, filter)
            .into_iter()
            .map(|chat| self.detail_chat(chat))
            .collect()
    }

    /// [`projects_for_user`](Self::projects_for_user) with details attached.
    pub fn projects_with_details_for_user(
        &self,
        user_id: &UserId,
        filter: ListFilter,
    ) -> Vec<ProjectWithDetails> {
        self.projects_for_user(user_id, filter)
            .into_iter()
            .map(|project| self.detail_project(project))
            .collect()
    }

    fn detail_chat(&self, chat: &Chat) -> ChatWithDetails {
        let last_message = self.last_message(&chat.id).map(|m| LastMessage {
            content: m.content.clone(),
            created_at: m.created_at,
        });
        let project = chat
            .project_id
            .as_ref()
            .and_then(|id| self.projects.get(id))
            .map(|p| ProjectSummary {
                id: p.id.clone(),
                name: p.name.clone(),
            });
        ChatWithDetails {
            chat: chat.clone(),
            last_message,
            project,
        }
    }

    fn detail_project(&self, project: &Project) -> ProjectWithDetails {
        let owned: Vec<&Chat> = self
            .chats
            .values()
            .filter(|c| c.project_id.as_ref() == Some(&project.id))
            .collect();
        ProjectWithDetails {
            project: project.clone(),
            chat_count: owned.len(),
            last_activity: owned.iter().map(|c| c.last_message_at).max(),
        }
    }
}
