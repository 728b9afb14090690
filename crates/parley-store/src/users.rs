//! User accounts.

use parley_shared::naming::normalize_email;
use parley_shared::{EntityKind, UserId};

use crate::error::{Result, StoreError};
use crate::models::{NewUser, Timestamped, User, UserSettings};
use crate::store::AppStore;

impl AppStore {
    /// Register a user together with their settings row.
    ///
    /// The email is trimmed and lower-cased; it must not belong to another user.
    pub fn create_user(&mut self, new_user: NewUser) -> Result<UserId> {
        let email = normalize_email(&new_user.email)?;
        if self.user_by_email(&email).is_some() {
            return Err(StoreError::DuplicateEmail(email));
        }

        let now = self.now();
        let user = User {
            id: UserId::new(),
            email,
            created_at: now,
            updated_at: now,
        };
        let user_id = user.id.clone();
        let settings = UserSettings::new(user_id.clone(), new_user.profile, now);

        tracing::debug!(user_id = %user_id, "user created");
        self.users.insert(user_id.clone(), user);
        self.user_settings.insert(settings.id.clone(), settings);
        Ok(user_id)
    }

    pub fn user(&self, id: &UserId) -> Result<&User> {
        self.users
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::User, id))
    }

    /// Look a user up by email, ignoring case and surrounding whitespace.
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = email.trim().to_lowercase();
        self.users.values().find(|u| u.email == wanted)
    }

    pub fn current_user(&self) -> Result<&User> {
        let id = self.require_current_user()?;
        self.user(&id)
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Vec<&User> {
        let mut users: Vec<_> = self.users.values().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }

    pub fn update_user_email(&mut self, id: &UserId, email: &str) -> Result<()> {
        let email = normalize_email(email)?;
        if let Some(other) = self.user_by_email(&email) {
            if &other.id != id {
                return Err(StoreError::DuplicateEmail(email));
            }
        }
        if !self.users.contains_key(id) {
            return Err(StoreError::not_found(EntityKind::User, id));
        }

        let now = self.now();
        if let Some(user) = self.users.get_mut(id) {
            user.email = email;
            user.touch(now);
        }
        tracing::debug!(user_id = %id, "user email updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            profile: Profile {
                full_name: "Grace Hopper".into(),
                display_name: "Grace".into(),
                work_description: Some("Engineering".into()),
                custom_instructions: None,
            },
        }
    }

    #[test]
    fn test_create_user_creates_settings() {
        let mut store = AppStore::new();
        let id = store.create_user(new_user("grace@example.com")).unwrap();

        let user = store.user(&id).unwrap();
        assert_eq!(user.created_at, user.updated_at);

        let settings = store.settings_for(&id).unwrap();
        assert_eq!(settings.display_name, "Grace");
        assert_eq!(settings.work_description.as_deref(), Some("Engineering"));
        assert_eq!(settings.created_at, user.created_at);
    }

    #[test]
    fn test_emails_are_unique_ignoring_case() {
        let mut store = AppStore::new();
        store.create_user(new_user("grace@example.com")).unwrap();

        let err = store.create_user(new_user(" Grace@Example.com ")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(e) if e == "grace@example.com"));
        assert_eq!(store.users().len(), 1);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut store = AppStore::new();
        assert!(matches!(
            store.create_user(new_user("not-an-email")),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_update_email() {
        let mut store = AppStore::new();
        let grace = store.create_user(new_user("grace@example.com")).unwrap();
        let ada = store.create_user(new_user("ada@example.com")).unwrap();

        assert!(matches!(
            store.update_user_email(&ada, "GRACE@example.com"),
            Err(StoreError::DuplicateEmail(_))
        ));

        // Re-saving your own address is fine.
        store.update_user_email(&grace, "Grace@example.com").unwrap();
        store.update_user_email(&ada, "countess@example.com").unwrap();

        let ada_user = store.user(&ada).unwrap();
        assert_eq!(ada_user.email, "countess@example.com");
        assert!(ada_user.updated_at > ada_user.created_at);
        assert!(store.user_by_email("COUNTESS@example.com").is_some());

        assert!(store
            .update_user_email(&UserId::from("missing"), "x@example.com")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list_users_oldest_first() {
        let mut store = AppStore::new();
        let first = store.create_user(new_user("a@example.com")).unwrap();
        let second = store.create_user(new_user("b@example.com")).unwrap();
        let ids: Vec<_> = store.list_users().into_iter().map(|u| u.id.clone()).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
