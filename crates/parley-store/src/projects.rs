//! Project actions.

use parley_shared::naming::validate_name;
use parley_shared::{ChatId, EntityKind, ProjectId, UserId};

use crate::config::DeletePolicy;
use crate::error::{Result, StoreError};
use crate::models::{Project, ProjectUpdate, Timestamped};
use crate::store::AppStore;
use crate::views::ListFilter;

impl AppStore {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a project owned by the current user and return its id.
    ///
    /// Names longer than 90 characters are rejected, not truncated.
    pub fn create_project(&mut self, name: &str, description: &str) -> Result<ProjectId> {
        let user_id = self.require_current_user()?;
        validate_name("name", name)?;

        let now = self.now();
        let project = Project {
            id: ProjectId::new(),
            user_id,
            name: name.to_string(),
            description: description.to_string(),
            is_starred: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        let id = project.id.clone();

        tracing::debug!(project_id = %id, user_id = %project.user_id, "project created");
        self.projects.insert(id.clone(), project);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn project(&self, id: &ProjectId) -> Result<&Project> {
        self.projects
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))
    }

    /// Projects of a user, most recently updated first.
    pub fn projects_for_user(&self, user_id: &UserId, filter: ListFilter) -> Vec<&Project> {
        let mut projects: Vec<_> = self
            .projects
            .values()
            .filter(|p| &p.user_id == user_id && filter.admits(p.is_starred, p.is_archived))
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        projects
    }

    pub fn current_user_projects(&self, filter: ListFilter) -> Result<Vec<&Project>> {
        let user_id = self.require_current_user()?;
        Ok(self.projects_for_user(&user_id, filter))
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Merge the provided fields into a project and refresh `updated_at`.
    pub fn update_project(&mut self, id: &ProjectId, updates: ProjectUpdate) -> Result<()> {
        if let Some(name) = &updates.name {
            validate_name("name", name)?;
        }

        let now = self.now();
        let project = self.project_mut(id)?;
        if let Some(name) = updates.name {
            project.name = name;
        }
        if let Some(description) = updates.description {
            project.description = description;
        }
        if let Some(starred) = updates.is_starred {
            project.is_starred = starred;
        }
        if let Some(archived) = updates.is_archived {
            project.is_archived = archived;
        }
        project.touch(now);

        tracing::debug!(project_id = %id, "project updated");
        Ok(())
    }

    /// Flip `is_starred` and return the new value.
    pub fn toggle_project_star(&mut self, id: &ProjectId) -> Result<bool> {
        let now = self.now();
        let project = self.project_mut(id)?;
        project.is_starred = !project.is_starred;
        project.touch(now);
        Ok(project.is_starred)
    }

    /// Flip `is_archived` and return the new value.
    pub fn toggle_project_archive(&mut self, id: &ProjectId) -> Result<bool> {
        let now = self.now();
        let project = self.project_mut(id)?;
        project.is_archived = !project.is_archived;
        project.touch(now);
        Ok(project.is_archived)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove a project.
    ///
    /// Under [`DeletePolicy::Cascade`] its chats (and their messages) go with
    /// it; under [`DeletePolicy::Restrict`] the call fails while any chat is
    /// still filed in the project.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<()> {
        if !self.projects.contains_key(id) {
            return Err(StoreError::not_found(EntityKind::Project, id));
        }

        let chat_ids: Vec<ChatId> = self
            .chats
            .values()
            .filter(|c| c.project_id.as_ref() == Some(id))
            .map(|c| c.id.clone())
            .collect();

        if self.config.delete_policy == DeletePolicy::Restrict && !chat_ids.is_empty() {
            return Err(StoreError::HasDependents {
                kind: EntityKind::Project,
                id: id.to_string(),
                dependents: chat_ids.len(),
            });
        }

        let mut removed_messages = 0;
        for chat_id in &chat_ids {
            removed_messages += self.remove_chat(chat_id);
        }
        self.projects.remove(id);
        if self.active_project.as_ref() == Some(id) {
            self.active_project = None;
        }

        tracing::debug!(
            project_id = %id,
            chats = chat_ids.len(),
            messages = removed_messages,
            "project deleted"
        );
        Ok(())
    }

    fn project_mut(&mut self, id: &ProjectId) -> Result<&mut Project> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))
    }
}
