//! v1 -> v2: move the profile from `User` onto `UserSettings`.
//!
//! Version 1 kept `fullName`, `displayName`, `workDescription` and
//! `customInstructions` on each user. Version 2 keeps them on the user's
//! settings row, adds the `artefacts` and `analysisTool` toggles, and
//! introduces the `integrations` collection.

use parley_shared::SettingsId;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{Result, StoreError};

const PROFILE_FIELDS: [&str; 4] = [
    "fullName",
    "displayName",
    "workDescription",
    "customInstructions",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    id: String,
    full_name: String,
    display_name: String,
    #[serde(default)]
    work_description: Option<String>,
    #[serde(default)]
    custom_instructions: Option<String>,
    created_at: Value,
    updated_at: Value,
}

pub fn up(doc: &mut Value) -> Result<()> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::Migration("snapshot must be a JSON object".into()))?;

    let mut legacy = Vec::new();
    for (index, user) in array_mut(root, "users")?.iter_mut().enumerate() {
        let parsed = LegacyUser::deserialize(&*user)
            .map_err(|e| StoreError::Migration(format!("users[{index}] is not a v1 user: {e}")))?;
        if let Some(obj) = user.as_object_mut() {
            for field in PROFILE_FIELDS {
                obj.remove(field);
            }
        }
        legacy.push(parsed);
    }

    let settings = array_mut(root, "userSettings")?;
    let mut created = 0;
    for user in legacy {
        let existing = settings
            .iter()
            .position(|row| row.get("userId").and_then(Value::as_str) == Some(user.id.as_str()));
        match existing {
            Some(index) => {
                let obj = settings[index].as_object_mut().ok_or_else(|| {
                    StoreError::Migration(format!("settings of user {} is not an object", user.id))
                })?;
                if let Some(field) = PROFILE_FIELDS.iter().find(|f| obj.contains_key(**f)) {
                    return Err(StoreError::Migration(format!(
                        "settings of user {} already carry {field}; refusing to merge v1 and v2 shapes",
                        user.id
                    )));
                }
                write_profile(obj, &user);
            }
            None => {
                let mut row = json!({
                    "id": SettingsId::new(),
                    "userId": user.id.clone(),
                    "colorMode": "system",
                    "chatFont": "default",
                    "useLocationMetadata": false,
                    "createdAt": user.created_at.clone(),
                    "updatedAt": user.updated_at.clone(),
                });
                if let Some(obj) = row.as_object_mut() {
                    write_profile(obj, &user);
                }
                settings.push(row);
                created += 1;
            }
        }
    }

    for row in settings.iter_mut().filter_map(Value::as_object_mut) {
        row.entry("artefacts").or_insert(Value::Bool(false));
        row.entry("analysisTool").or_insert(Value::Bool(false));
    }

    root.entry("integrations").or_insert_with(|| json!([]));

    tracing::debug!(created_settings = created, "profile moved onto settings");
    Ok(())
}

fn write_profile(row: &mut Map<String, Value>, user: &LegacyUser) {
    row.insert("fullName".into(), Value::from(user.full_name.clone()));
    row.insert("displayName".into(), Value::from(user.display_name.clone()));
    if let Some(text) = user.work_description.as_ref().filter(|t| !t.trim().is_empty()) {
        row.insert("workDescription".into(), Value::from(text.clone()));
    }
    if let Some(text) = user.custom_instructions.as_ref().filter(|t| !t.trim().is_empty()) {
        row.insert("customInstructions".into(), Value::from(text.clone()));
    }
}

/// The array stored under `key`, created empty when absent.
fn array_mut<'a>(root: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>> {
    root.entry(key)
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| StoreError::Migration(format!("{key} must be an array")))
}
