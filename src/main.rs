//! Recordstore CLI
//!
//! Inspect and edit a record store from the shell. The backend comes from
//! `KV_URL` (see [`recordstore::config`]); without it every invocation
//! starts from an empty in-memory store, which is mostly useful for trying
//! out commands. A `KV_URL` that is not a Postgres URL is an error.

use clap::{Parser, Subcommand};
use recordstore::{config, Filter, ObjectStore, StoreConfig};
use serde::Serialize;
use serde_json::Value;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "recordstore";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// CLI
// =============================================================================

/// Recordstore - schema-less object store over key-value storage
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Schema-less object store over key-value storage")]
#[command(
    after_help = "Storage: set KV_URL=postgres://... (build with --features postgres). \
                  Unset KV_URL runs in memory; other schemes are rejected. \
                  KV_PREFIXES=collection=prefix,... overrides record key prefixes."
)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a record from a JSON object
    Create {
        collection: String,
        /// Record body, e.g. '{"name": "Alex"}'
        data: String,
    },
    /// Print one record
    Get { collection: String, id: String },
    /// Print every record of a collection
    List {
        collection: String,
        /// Equality constraint, repeatable
        #[arg(short, long = "filter", value_name = "FIELD=VALUE", value_parser = parse_constraint)]
        filters: Vec<(String, Value)>,
    },
    /// Merge a JSON object into a record
    Update {
        collection: String,
        id: String,
        /// Fields to set
        patch: String,
    },
    /// Delete a record
    Delete { collection: String, id: String },
    /// Count records of a collection
    Count {
        collection: String,
        /// Equality constraint, repeatable
        #[arg(short, long = "filter", value_name = "FIELD=VALUE", value_parser = parse_constraint)]
        filters: Vec<(String, Value)>,
    },
    /// Print child records linked to a parent
    Related {
        parent_collection: String,
        parent_id: String,
        child_collection: String,
    },
    /// List collections that have an index
    Collections,
}

/// Parse `field=value`; the value is read as JSON, falling back to a string.
fn parse_constraint(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
    if field.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn parse_object(raw: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(raw)?;
    anyhow::ensure!(value.is_object(), "expected a JSON object, got {raw}");
    Ok(value)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,recordstore=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Recordstore v{}", APP_VERSION);

    let config = StoreConfig::from_env()?;
    let store = config::open(&config).await?;

    run(&store, cli.command).await
}

async fn run(store: &ObjectStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Create { collection, data } => {
            let record = store.create(&collection, parse_object(&data)?).await?;
            print_json(&record)
        }
        Command::Get { collection, id } => match store.get(&collection, &id).await? {
            Some(record) => print_json(&record),
            None => anyhow::bail!("{collection}/{id} not found"),
        },
        Command::List {
            collection,
            filters,
        } => {
            let filter: Filter = filters.into_iter().collect();
            let records = store.get_all(&collection, Some(&filter)).await?;
            print_json(&records)
        }
        Command::Update {
            collection,
            id,
            patch,
        } => match store.update(&collection, &id, parse_object(&patch)?).await? {
            Some(record) => print_json(&record),
            None => anyhow::bail!("{collection}/{id} not found"),
        },
        Command::Delete { collection, id } => {
            store.delete(&collection, &id).await?;
            tracing::info!(%collection, %id, "deleted");
            Ok(())
        }
        Command::Count {
            collection,
            filters,
        } => {
            let filter: Filter = filters.into_iter().collect();
            println!("{}", store.count(&collection, Some(&filter)).await?);
            Ok(())
        }
        Command::Related {
            parent_collection,
            parent_id,
            child_collection,
        } => {
            let records = store
                .get_related(&parent_collection, &parent_id, &child_collection)
                .await?;
            print_json(&records)
        }
        Command::Collections => print_json(&store.collections().await?),
    }
}
