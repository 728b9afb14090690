//! Human-readable report of a loaded store.

use std::fmt;

use anyhow::{bail, Result};
use chrono::SecondsFormat;
use parley_store::{AppStore, ListFilter, ProjectWithDetails, User};

/// Everything in a filter: archived records are part of a snapshot too.
const ALL: ListFilter = ListFilter {
    starred_only: false,
    include_archived: true,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    pub users: usize,
    pub projects: usize,
    pub chats: usize,
    pub messages: usize,
    pub models: usize,
    pub quick_prompts: usize,
    pub integrations: usize,
}

#[derive(Debug, Clone)]
pub struct UserSummary {
    pub email: String,
    pub display_name: Option<String>,
    pub projects: Vec<ProjectWithDetails>,
    pub unfiled_chats: usize,
    pub integrations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub counts: Counts,
    pub default_model: Option<String>,
    pub users: Vec<UserSummary>,
}

impl Summary {
    /// Summarize `store`, limited to the user with email `only` when given.
    pub fn build(store: &AppStore, only: Option<&str>) -> Result<Self> {
        let users: Vec<&User> = match only {
            Some(email) => match store.user_by_email(email) {
                Some(user) => vec![user],
                None => bail!("no user with email {email} in snapshot"),
            },
            None => store.list_users(),
        };

        let counts = Counts {
            users: store.users().len(),
            projects: store.projects().len(),
            chats: store.chats().len(),
            messages: store.messages().len(),
            models: store.models().len(),
            quick_prompts: store.quick_prompts().len(),
            integrations: store.integrations().len(),
        };

        Ok(Self {
            counts,
            default_model: store.default_model().map(|m| m.name.clone()),
            users: users.into_iter().map(|u| summarize_user(store, u)).collect(),
        })
    }
}

fn summarize_user(store: &AppStore, user: &User) -> UserSummary {
    let unfiled_chats = store
        .chats_for_user(&user.id, ALL)
        .iter()
        .filter(|c| c.project_id.is_none())
        .count();
    UserSummary {
        email: user.email.clone(),
        display_name: store.settings_for(&user.id).map(|s| s.display_name.clone()),
        projects: store.projects_with_details_for_user(&user.id, ALL),
        unfiled_chats,
        integrations: store
            .integrations_for(&user.id)
            .iter()
            .map(|i| {
                let state = if i.is_connected { "connected" } else { "disconnected" };
                format!("{} ({state})", i.name)
            })
            .collect(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "{} users, {} projects, {} chats, {} messages, {} models, {} quick prompts, {} integrations",
            c.users, c.projects, c.chats, c.messages, c.models, c.quick_prompts, c.integrations
        )?;
        writeln!(
            f,
            "default model: {}",
            self.default_model.as_deref().unwrap_or("none")
        )?;

        for user in &self.users {
            writeln!(f)?;
            match &user.display_name {
                Some(name) => writeln!(f, "{} <{}>", name, user.email)?,
                None => writeln!(f, "<{}> (no settings)", user.email)?,
            }
            for project in &user.projects {
                let mut flags = String::new();
                if project.project.is_starred {
                    flags.push_str(" *");
                }
                if project.project.is_archived {
                    flags.push_str(" [archived]");
                }
                let activity = project
                    .last_activity
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_else(|| "never".to_string());
                writeln!(
                    f,
                    "  {}{flags}: {} chats, last activity {activity}",
                    project.project.name, project.chat_count
                )?;
            }
            writeln!(f, "  unfiled: {} chats", user.unfiled_chats)?;
            if !user.integrations.is_empty() {
                writeln!(f, "  integrations: {}", user.integrations.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parley_store::{NewIntegration, NewModel, NewUser, Profile};
    use parley_shared::IntegrationType;

    use super::*;

    fn store() -> AppStore {
        let mut store = AppStore::new();
        let ada = store
            .create_user(NewUser {
                email: "ada@example.com".into(),
                profile: Profile {
                    full_name: "Ada Lovelace".into(),
                    display_name: "Ada".into(),
                    ..Default::default()
                },
            })
            .unwrap();
        store.set_current_user(ada);
        let model = store
            .register_model(NewModel {
                name: "Claude 3.7 Sonnet".into(),
                is_default: true,
                ..Default::default()
            })
            .unwrap();
        let project = store.create_project("Engines", "").unwrap();
        store.toggle_project_star(&project).unwrap();
        store.create_chat(&model, Some("Notes on the engine"), Some(&project), None).unwrap();
        store.create_chat(&model, Some("Poetry"), None, None).unwrap();
        store
            .add_integration(NewIntegration {
                integration_type: IntegrationType::Github,
                name: None,
                icon: None,
                is_connected: true,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_build_summary() {
        let summary = Summary::build(&store(), None).unwrap();
        assert_eq!(summary.counts.users, 1);
        assert_eq!(summary.counts.chats, 2);
        assert_eq!(summary.counts.messages, 2);
        assert_eq!(summary.default_model.as_deref(), Some("Claude 3.7 Sonnet"));

        let ada = &summary.users[0];
        assert_eq!(ada.display_name.as_deref(), Some("Ada"));
        assert_eq!(ada.projects.len(), 1);
        assert_eq!(ada.projects[0].chat_count, 1);
        assert_eq!(ada.unfiled_chats, 1);
        assert_eq!(ada.integrations, vec!["GitHub (connected)".to_string()]);
    }

    #[test]
    fn test_render() {
        let text = Summary::build(&store(), Some("ADA@example.com")).unwrap().to_string();
        assert!(text.starts_with("1 users, 1 projects, 2 chats"));
        assert!(text.contains("Ada <ada@example.com>"));
        assert!(text.contains("  Engines *: 1 chats, last activity "));
        assert!(text.contains("  unfiled: 1 chats"));
    }

    #[test]
    fn test_unknown_user() {
        let err = Summary::build(&store(), Some("nobody@example.com")).unwrap_err();
        assert!(err.to_string().contains("nobody@example.com"));
    }
}
