use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use media_storage::{
    ClientConfig, ListParams, MediaStorage, StaticTokenProvider, config::ConnectionArgs,
};
use serde::Serialize;
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tokio::fs::File;
use tracing_subscriber::EnvFilter;

/// Command-line client for the media storage service.
#[derive(Parser, Debug)]
#[command(author, version, about = "Media storage client")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a JPEG file
    Upload { path: PathBuf },
    /// Download media content into a file
    Download { id: String, output: PathBuf },
    /// List media, or search when --filter is given
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        after: Option<String>,
        #[arg(long)]
        before: Option<String>,
        /// Search query as JSON; anything else is sent as a plain string
        #[arg(long)]
        filter: Option<String>,
    },
    /// Delete media
    Delete { id: String },
    /// Show media info
    Info { id: String },
    /// Show metadata; optionally one field (exif, gpano, user, user.<key>)
    Meta { id: String, field: Option<String> },
    /// Attach user metadata given as user.<key>=<value>
    AddMeta {
        id: String,
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Remove one user.<key> entry, or all user metadata with "user"
    RemoveMeta { id: String, key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = ClientConfig::from_env_and_args(&cli.connection)?;
    tracing::debug!("Using endpoint {}", cfg.endpoint);

    let token = cfg
        .access_token
        .clone()
        .context("an access token is required (--token or MEDIA_STORAGE_TOKEN)")?;
    let storage = MediaStorage::with_config(Arc::new(StaticTokenProvider::new(token)), &cfg)?;
    storage.connect().await?;

    match cli.command {
        Command::Upload { path } => {
            let file = File::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            let info = storage.upload_reader(file).await?;
            tracing::info!("Uploaded {} as {}", path.display(), info.id);
            print_json(&info)?;
        }
        Command::Download { id, output } => {
            let content = storage.download(&id).await?;
            let mut reader = content.into_async_read();
            let mut file = File::create(&output)
                .await
                .with_context(|| format!("creating {}", output.display()))?;
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            tracing::info!("Wrote {} bytes to {}", written, output.display());
        }
        Command::List {
            limit,
            after,
            before,
            filter,
        } => {
            let filter = filter.map(parse_filter);
            let params = ListParams {
                limit,
                after,
                before,
                filter,
            };
            let page = storage.list(Some(&params)).await?;
            print_json(&page)?;
        }
        Command::Delete { id } => {
            storage.delete(&id).await?;
            tracing::info!("Deleted {}", id);
        }
        Command::Info { id } => print_json(&storage.info(&id).await?)?,
        Command::Meta { id, field: None } => print_json(&storage.meta(&id).await?)?,
        Command::Meta {
            id,
            field: Some(field),
        } => print_json(&storage.meta_field(&id, &field).await?)?,
        Command::AddMeta { id, entries } => {
            let pairs = entries
                .iter()
                .map(|entry| {
                    entry
                        .split_once('=')
                        .with_context(|| format!("expected user.<key>=<value>, got `{}`", entry))
                })
                .collect::<Result<Vec<_>>>()?;
            storage.add_meta(&id, pairs).await?;
            tracing::info!("Stored {} metadata entries on {}", entries.len(), id);
        }
        Command::RemoveMeta { id, key } => {
            storage.remove_meta(&id, &key).await?;
            tracing::info!("Removed {} from {}", key, id);
        }
    }

    Ok(())
}

/// Accept a JSON query, falling back to the raw text as a string query.
fn parse_filter(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
