//! # parley-inspect
//!
//! Loads a Parley snapshot file, upgrades it to the current schema, checks
//! its invariants and prints a per-user summary. With `--output` the
//! upgraded snapshot is written back out.

mod summary;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use parley_shared::constants::{APP_NAME, SCHEMA_VERSION};
use parley_store::{AppStore, StoreConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::summary::Summary;

#[derive(Parser, Debug)]
#[command(name = "parley-inspect", version)]
#[command(about = "Upgrade a Parley snapshot and summarize its contents")]
struct Args {
    /// Snapshot file to read
    snapshot: PathBuf,

    /// Write the upgraded snapshot to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only summarize the user with this email
    #[arg(short, long)]
    user: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    info!("Starting {} snapshot inspector v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = StoreConfig::from_env();
    info!(?config, "Loaded configuration");

    let summary = run(&args, config)?;
    print!("{summary}");
    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "info,parley_store=debug,parley_inspect=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(args: &Args, config: StoreConfig) -> Result<Summary> {
    let path = &args.snapshot;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let store = AppStore::from_json(&raw, config)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;

    let summary = Summary::build(&store, args.user.as_deref())?;
    info!(
        users = summary.counts.users,
        projects = summary.counts.projects,
        chats = summary.counts.chats,
        messages = summary.counts.messages,
        "Snapshot loaded"
    );

    if let Some(output) = &args.output {
        let json = store.to_json().context("Failed to serialize snapshot")?;
        fs::write(output, json)
            .with_context(|| format!("Failed to write snapshot {}", output.display()))?;
        info!(
            path = %output.display(),
            schema_version = SCHEMA_VERSION,
            "Upgraded snapshot written"
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::{json, Value};

    use super::*;

    fn args(snapshot: &Path) -> Args {
        Args {
            snapshot: snapshot.to_path_buf(),
            output: None,
            user: None,
            verbose: false,
        }
    }

    fn v1_snapshot() -> Value {
        json!({
            "users": [{
                "id": "u1",
                "email": "ada@example.com",
                "fullName": "Ada Lovelace",
                "displayName": "Ada",
                "createdAt": "2024-03-01T10:00:00Z",
                "updatedAt": "2024-03-01T10:00:00Z",
            }],
            "projects": [{
                "id": "p1",
                "userId": "u1",
                "name": "Engines",
                "description": "",
                "isStarred": false,
                "isArchived": false,
                "createdAt": "2024-03-01T10:30:00Z",
                "updatedAt": "2024-03-01T10:30:00Z",
            }],
            "models": [{
                "id": "claude-3-7-sonnet",
                "name": "Claude 3.7 Sonnet",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z",
            }],
            "chats": [{
                "id": "c1",
                "userId": "u1",
                "projectId": "p1",
                "name": "Difference engine",
                "modelId": "claude-3-7-sonnet",
                "isStarred": false,
                "isArchived": false,
                "lastMessageAt": "2024-03-01T11:00:00Z",
                "createdAt": "2024-03-01T11:00:00Z",
                "updatedAt": "2024-03-01T11:00:00Z",
            }],
        })
    }

    #[test]
    fn test_run_upgrades_v1_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("v1.json");
        let output = dir.path().join("v2.json");
        fs::write(&input, v1_snapshot().to_string()).unwrap();

        let mut upgrade = args(&input);
        upgrade.output = Some(output.clone());
        let summary = run(&upgrade, StoreConfig::default()).unwrap();

        assert_eq!(summary.counts.users, 1);
        assert_eq!(summary.users[0].projects[0].chat_count, 1);

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["schemaVersion"], 2);
        assert_eq!(written["userSettings"][0]["displayName"], "Ada");
        assert!(written["users"][0].get("fullName").is_none());

        // The upgraded file loads again unchanged.
        let again = run(&args(&output), StoreConfig::default()).unwrap();
        assert_eq!(again.counts, summary.counts);
    }

    #[test]
    fn test_run_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&args(&dir.path().join("absent.json")), StoreConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }

    #[test]
    fn test_run_invalid_snapshot_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        let mut doc = v1_snapshot();
        doc["chats"][0]["modelId"] = json!("gone");
        fs::write(&input, doc.to_string()).unwrap();

        let err = run(&args(&input), StoreConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to load snapshot"));
        assert!(format!("{err:#}").contains("missing model gone"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["parley-inspect", "snap.json", "-o", "out.json", "-v"]);
        assert_eq!(args.snapshot, PathBuf::from("snap.json"));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(args.verbose);
        assert!(args.user.is_none());
    }
}
