//! Snapshot schema migrations.
//!
//! A snapshot records its shape in the top-level `schemaVersion` field. The
//! first release wrote no such field, so a missing version counts as 1.
//! Migrations operate on the raw JSON document before it is deserialized
//! into a [`Snapshot`](crate::Snapshot), each one taking the document one
//! version forward.

pub mod v002_profile_to_settings;

use parley_shared::constants::{MIN_SCHEMA_VERSION, SCHEMA_VERSION};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Name of the version field at the top of a snapshot.
pub const VERSION_FIELD: &str = "schemaVersion";

/// Schema version recorded in `doc`.
pub fn schema_version(doc: &Value) -> Result<u64> {
    match doc.get(VERSION_FIELD) {
        None | Some(Value::Null) => Ok(u64::from(MIN_SCHEMA_VERSION)),
        Some(value) => value.as_u64().ok_or_else(|| {
            StoreError::InvalidSnapshot(format!("{VERSION_FIELD} must be a positive integer"))
        }),
    }
}

/// Upgrade `doc` in place to [`SCHEMA_VERSION`] and return the version reached.
///
/// Documents newer than this build, or older than the oldest supported
/// shape, are refused with [`StoreError::UnsupportedSchemaVersion`].
pub fn run_migrations(doc: &mut Value) -> Result<u32> {
    if !doc.is_object() {
        return Err(StoreError::InvalidSnapshot(
            "snapshot must be a JSON object".into(),
        ));
    }

    let found = schema_version(doc)?;
    let current = u32::try_from(found)
        .ok()
        .filter(|v| (MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(v))
        .ok_or(StoreError::UnsupportedSchemaVersion {
            found,
            min: MIN_SCHEMA_VERSION,
            max: SCHEMA_VERSION,
        })?;

    tracing::info!(
        current_version = current,
        target_version = SCHEMA_VERSION,
        "checking snapshot migrations"
    );

    if current < 2 {
        tracing::info!("applying migration v002_profile_to_settings");
        v002_profile_to_settings::up(doc)?;
        set_version(doc, 2);
    }

    Ok(SCHEMA_VERSION)
}

fn set_version(doc: &mut Value, version: u32) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(VERSION_FIELD.to_string(), Value::from(version));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_version_is_v1() {
        assert_eq!(schema_version(&json!({})).unwrap(), 1);
        assert_eq!(schema_version(&json!({ "schemaVersion": 2 })).unwrap(), 2);
        assert!(matches!(
            schema_version(&json!({ "schemaVersion": "two" })),
            Err(StoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_current_version_is_untouched() {
        let mut doc = json!({ "schemaVersion": 2, "users": [] });
        let before = doc.clone();
        assert_eq!(run_migrations(&mut doc).unwrap(), 2);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_empty_v1_document_is_upgraded() {
        let mut doc = json!({});
        assert_eq!(run_migrations(&mut doc).unwrap(), 2);
        assert_eq!(doc["schemaVersion"], 2);
        assert_eq!(doc["integrations"], json!([]));
    }

    #[test]
    fn test_unsupported_versions_refused() {
        for version in [0, 3, 99] {
            let mut doc = json!({ "schemaVersion": version });
            let err = run_migrations(&mut doc).unwrap_err();
            assert!(
                matches!(err, StoreError::UnsupportedSchemaVersion { found, min: 1, max: 2 } if found == version),
                "version {version}: {err}"
            );
        }
    }

    #[test]
    fn test_non_object_refused() {
        let mut doc = json!([1, 2, 3]);
        assert!(matches!(
            run_migrations(&mut doc),
            Err(StoreError::InvalidSnapshot(_))
        ));
    }
}
