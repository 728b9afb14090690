//! Fixtures shared by the in-crate test modules.

use parley_shared::{ModelId, PromptCategory, QuickPromptId, UserId};

use crate::config::StoreConfig;
use crate::models::{NewModel, NewQuickPrompt, NewUser, Profile};
use crate::store::AppStore;

pub(crate) struct Fixture {
    pub store: AppStore,
    pub user: UserId,
    pub model: ModelId,
    pub prompt: QuickPromptId,
}

pub(crate) fn new_user(email: &str, name: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        profile: Profile {
            full_name: name.to_string(),
            display_name: name.split_whitespace().next().unwrap_or(name).to_string(),
            ..Default::default()
        },
    }
}

/// A store with one selected user, a default model and the "Brainstorm"
/// quick prompt.
pub(crate) fn fixture() -> Fixture {
    fixture_with(StoreConfig::default())
}

pub(crate) fn fixture_with(config: StoreConfig) -> Fixture {
    let mut store = AppStore::with_config(config);
    let user = store
        .create_user(new_user("ada@example.com", "Ada Lovelace"))
        .unwrap();
    store.set_current_user(user.clone());

    let model = store
        .register_model(NewModel {
            id: Some(ModelId::from("claude-3-7-sonnet")),
            name: "Claude 3.7 Sonnet".into(),
            description: Some("Our most intelligent model yet".into()),
            is_default: true,
        })
        .unwrap();

    let prompt = store
        .register_quick_prompt(NewQuickPrompt {
            id: None,
            category: PromptCategory::Write,
            name: "Brainstorm ideas".into(),
            chat_name: "Brainstorm".into(),
            prompt_content: "Let's brainstorm".into(),
            order: 10,
        })
        .unwrap();

    Fixture {
        store,
        user,
        model,
        prompt,
    }
}
