//! User settings and third-party integrations.

use parley_shared::{EntityKind, IntegrationId, IntegrationType, SettingsId, UserId};

use crate::error::{Result, StoreError};
use crate::models::{
    non_empty, NewIntegration, Profile, SettingsUpdate, Timestamped, UserSettings,
    UserSettingsIntegration,
};
use crate::store::AppStore;

impl AppStore {
    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// The settings row of a user, if one exists.
    pub fn settings_for(&self, user_id: &UserId) -> Option<&UserSettings> {
        self.user_settings.values().find(|s| &s.user_id == user_id)
    }

    pub fn current_settings(&self) -> Result<&UserSettings> {
        let user_id = self.require_current_user()?;
        self.settings_for(&user_id)
            .ok_or(StoreError::SettingsMissing(user_id))
    }

    /// Create the settings row for a user that has none.
    pub fn create_settings(&mut self, user_id: &UserId, profile: Profile) -> Result<SettingsId> {
        self.user(user_id)?;
        if let Some(existing) = self.settings_for(user_id) {
            return Err(StoreError::AlreadyExists {
                kind: EntityKind::UserSettings,
                id: existing.id.to_string(),
            });
        }

        let now = self.now();
        let settings = UserSettings::new(user_id.clone(), profile, now);
        let id = settings.id.clone();
        tracing::debug!(user_id = %user_id, settings_id = %id, "settings created");
        self.user_settings.insert(id.clone(), settings);
        Ok(id)
    }

    /// Merge `updates` into the current user's settings and refresh `updated_at`.
    ///
    /// Fails with [`StoreError::SettingsMissing`] when the user has no row,
    /// unless `create_settings_on_write` is configured, in which case a
    /// default row is created first.
    pub fn update_user_settings(&mut self, updates: SettingsUpdate) -> Result<()> {
        let user_id = self.require_current_user()?;
        let settings_id = match self.settings_for(&user_id) {
            Some(settings) => settings.id.clone(),
            None if self.config.create_settings_on_write => {
                self.create_settings(&user_id, Profile::default())?
            }
            None => return Err(StoreError::SettingsMissing(user_id)),
        };

        let now = self.now();
        let settings = self
            .user_settings
            .get_mut(&settings_id)
            .ok_or_else(|| StoreError::SettingsMissing(user_id.clone()))?;

        if let Some(mode) = updates.color_mode {
            settings.color_mode = mode;
        }
        if let Some(font) = updates.chat_font {
            settings.chat_font = font;
        }
        if let Some(flag) = updates.use_location_metadata {
            settings.use_location_metadata = flag;
        }
        if let Some(full_name) = updates.full_name {
            settings.full_name = full_name;
        }
        if let Some(display_name) = updates.display_name {
            settings.display_name = display_name;
        }
        if updates.work_description.is_some() {
            settings.work_description = non_empty(updates.work_description);
        }
        if updates.custom_instructions.is_some() {
            settings.custom_instructions = non_empty(updates.custom_instructions);
        }
        if let Some(flag) = updates.artefacts {
            settings.artefacts = flag;
        }
        if let Some(flag) = updates.analysis_tool {
            settings.analysis_tool = flag;
        }
        settings.touch(now);

        tracing::debug!(user_id = %user_id, "settings updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Integrations
    // ------------------------------------------------------------------

    /// Add an integration for the current user. A user has at most one
    /// integration per type.
    pub fn add_integration(&mut self, new: NewIntegration) -> Result<IntegrationId> {
        let user_id = self.require_current_user()?;
        let kind = new.integration_type;
        if self
            .integrations
            .values()
            .any(|i| i.user_id == user_id && i.integration_type == kind)
        {
            return Err(StoreError::DuplicateIntegration { user_id, kind });
        }

        let now = self.now();
        let integration = UserSettingsIntegration {
            id: IntegrationId::new(),
            user_id,
            integration_type: kind,
            name: new
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| kind.display_name().to_string()),
            is_connected: new.is_connected,
            icon: new.icon.unwrap_or_else(|| kind.as_str().to_string()),
            created_at: now,
            updated_at: now,
        };
        let id = integration.id.clone();

        tracing::debug!(integration_id = %id, kind = %kind, "integration added");
        self.integrations.insert(id.clone(), integration);
        Ok(id)
    }

    pub fn integration(&self, id: &IntegrationId) -> Result<&UserSettingsIntegration> {
        self.integrations
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Integration, id))
    }

    /// A user's integrations in the fixed order of [`IntegrationType::ALL`].
    pub fn integrations_for(&self, user_id: &UserId) -> Vec<&UserSettingsIntegration> {
        let mut integrations: Vec<_> = self
            .integrations
            .values()
            .filter(|i| &i.user_id == user_id)
            .collect();
        integrations.sort_by_key(|i| type_rank(i.integration_type));
        integrations
    }

    pub fn set_integration_connected(&mut self, id: &IntegrationId, connected: bool) -> Result<()> {
        let now = self.now();
        let integration = self
            .integrations
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Integration, id))?;
        integration.is_connected = connected;
        integration.touch(now);
        tracing::debug!(integration_id = %id, connected, "integration connection changed");
        Ok(())
    }

    pub fn remove_integration(&mut self, id: &IntegrationId) -> Result<()> {
        self.integrations
            .remove(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Integration, id))?;
        tracing::debug!(integration_id = %id, "integration removed");
        Ok(())
    }
}

fn type_rank(kind: IntegrationType) -> usize {
    IntegrationType::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(usize::MAX)
}
