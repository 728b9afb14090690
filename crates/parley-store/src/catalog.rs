//! Models and quick prompts: the catalog a user picks from when starting a chat.

use parley_shared::naming::validate_name;
use parley_shared::{EntityKind, ModelId, PromptCategory, QuickPromptId};

use crate::error::{Result, StoreError};
use crate::models::{Model, NewModel, NewQuickPrompt, QuickPrompt, Timestamped};
use crate::store::AppStore;

impl AppStore {
    // ------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------

    /// Add a model. Registering it as default clears the flag on every other
    /// model, so at most one default exists.
    pub fn register_model(&mut self, new_model: NewModel) -> Result<ModelId> {
        let id = new_model.id.unwrap_or_default();
        if self.models.contains_key(&id) {
            return Err(StoreError::AlreadyExists {
                kind: EntityKind::Model,
                id: id.to_string(),
            });
        }
        validate_name("name", &new_model.name)?;

        let now = self.now();
        if new_model.is_default {
            self.clear_default_model(now);
        }
        let model = Model {
            id: id.clone(),
            name: new_model.name,
            description: new_model.description,
            is_default: new_model.is_default.then_some(true),
            created_at: now,
            updated_at: now,
        };

        tracing::debug!(model_id = %id, is_default = new_model.is_default, "model registered");
        self.models.insert(id.clone(), model);
        Ok(id)
    }

    pub fn model(&self, id: &ModelId) -> Result<&Model> {
        self.models
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Model, id))
    }

    /// All models, by name.
    pub fn list_models(&self) -> Vec<&Model> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        models
    }

    /// The model flagged as default. When an imported snapshot carries
    /// several, the oldest one wins.
    pub fn default_model(&self) -> Option<&Model> {
        self.models
            .values()
            .filter(|m| m.is_default())
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
    }

    /// Make `id` the only default model.
    pub fn set_default_model(&mut self, id: &ModelId) -> Result<()> {
        self.model(id)?;
        let now = self.now();
        self.clear_default_model(now);
        if let Some(model) = self.models.get_mut(id) {
            model.is_default = Some(true);
            model.touch(now);
        }
        tracing::debug!(model_id = %id, "default model set");
        Ok(())
    }

    fn clear_default_model(&mut self, now: chrono::DateTime<chrono::Utc>) {
        for model in self.models.values_mut().filter(|m| m.is_default()) {
            model.is_default = Some(false);
            model.touch(now);
        }
    }

    // ------------------------------------------------------------------
    // Quick prompts
    // ------------------------------------------------------------------

    pub fn register_quick_prompt(&mut self, new_prompt: NewQuickPrompt) -> Result<QuickPromptId> {
        let id = new_prompt.id.unwrap_or_default();
        if self.quick_prompts.contains_key(&id) {
            return Err(StoreError::AlreadyExists {
                kind: EntityKind::QuickPrompt,
                id: id.to_string(),
            });
        }
        validate_name("name", &new_prompt.name)?;
        validate_name("chatName", &new_prompt.chat_name)?;

        let now = self.now();
        let prompt = QuickPrompt {
            id: id.clone(),
            category: new_prompt.category,
            name: new_prompt.name,
            chat_name: new_prompt.chat_name,
            prompt_content: new_prompt.prompt_content,
            order: new_prompt.order,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!(prompt_id = %id, category = %prompt.category, "quick prompt registered");
        self.quick_prompts.insert(id.clone(), prompt);
        Ok(id)
    }

    pub fn quick_prompt(&self, id: &QuickPromptId) -> Result<&QuickPrompt> {
        self.quick_prompts
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::QuickPrompt, id))
    }

    /// Quick prompts in display order, optionally limited to one category.
    pub fn list_quick_prompts(&self, category: Option<PromptCategory>) -> Vec<&QuickPrompt> {
        let mut prompts: Vec<_> = self
            .quick_prompts
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .collect();
        prompts.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        prompts
    }
}
