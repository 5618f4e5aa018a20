//! Quill CLI: drive upload sessions against the configured storage backend.
//!
//! The backend is chosen with STORAGE_BACKEND (s3, local or memory); see
//! `quill_core::Config` for the other variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quill_cli::{init_tracing, read_upload_file, FileArg};
use quill_core::{AssetClass, AssetValidator, Config, EntityType, ErrorMetadata, SessionMode};
use quill_sessions::{open_session, TemporarySession};
use quill_storage::{create_storage, Storage, StorageGateway, TempAsset};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quill", about = "Entity upload session tool")]
struct Cli {
    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file against an asset class without uploading it
    Validate {
        /// Path to the file
        file: PathBuf,
        /// Asset class: avatar, banner, featured, inline, brief, logo
        #[arg(long)]
        class: AssetClass,
    },
    /// Upload files for a new entity, then commit (or cancel with --cancel)
    Create {
        /// Entity type: article, author, brief, company, bullroom
        #[arg(long)]
        entity: EntityType,
        /// File to upload as `[role=]path`; repeatable
        #[arg(long = "file", required = true)]
        files: Vec<FileArg>,
        /// Cancel the form instead of committing
        #[arg(long)]
        cancel: bool,
    },
    /// Upload files for an existing entity, then commit (or cancel with --cancel)
    Edit {
        #[arg(long)]
        entity: EntityType,
        /// Id of the persisted entity
        #[arg(long)]
        id: String,
        #[arg(long = "file", required = true)]
        files: Vec<FileArg>,
        #[arg(long)]
        cancel: bool,
    },
    /// Stage a file under a temporary session, then move it or clean it up
    Stage {
        file: PathBuf,
        /// Asset: featured, avatar, banner, logo
        #[arg(long, default_value = "featured")]
        asset: TempAsset,
        /// Entity id to move the staged file to; without it the session is cleaned up
        #[arg(long)]
        move_to: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn gateway_from_env() -> anyhow::Result<StorageGateway> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        environment = %config.environment(),
        "Storage backend ready"
    );

    Ok(StorageGateway::from_config(storage, &config))
}

async fn run_entity_session(
    gateway: StorageGateway,
    entity: EntityType,
    mode: SessionMode,
    existing_id: Option<&str>,
    files: Vec<FileArg>,
    cancel: bool,
) -> anyhow::Result<()> {
    let handle = open_session(gateway, entity, mode, existing_id)?;
    let entity_id = handle.entity_id();

    for arg in files {
        let file = read_upload_file(&arg.path).await?;
        if let Err(e) = handle.upload(&file, arg.role).await {
            let report = handle.cleanup().await;
            print_json(&serde_json::json!({
                "entity_id": entity_id,
                "error": e.error_code(),
                "message": e.client_message(),
                "cleanup": report,
            }))?;
            return Err(e).with_context(|| format!("Upload of {} failed", arg.path.display()));
        }
    }

    if cancel {
        let report = handle.cleanup().await;
        print_json(&serde_json::json!({
            "entity_id": entity_id,
            "status": handle.status(),
            "cleanup": report,
        }))
    } else {
        let committed = handle.commit().unwrap_or_default();
        print_json(&serde_json::json!({
            "entity_id": entity_id,
            "status": handle.status(),
            "files": committed,
        }))
    }
}

async fn run_stage(
    gateway: StorageGateway,
    path: PathBuf,
    asset: TempAsset,
    move_to: Option<String>,
) -> anyhow::Result<()> {
    let session = TemporarySession::new(gateway);
    let file = read_upload_file(&path).await?;
    let staged = session.upload_temporary(&file, asset).await?;

    let Some(entity_id) = move_to else {
        let report = session.cleanup_session().await;
        return print_json(&serde_json::json!({
            "session_id": session.session_id(),
            "staged_path": staged.path,
            "cleanup": report,
        }));
    };

    let moved = session
        .move_to_permanent(asset.entry().bucket, &staged.path, &entity_id)
        .await;
    let url = match moved {
        Ok(url) => url,
        Err(e) => {
            session.cleanup_session().await;
            return Err(e).context("Failed to move staged file");
        }
    };
    let unmoved = session.commit_session();

    print_json(&serde_json::json!({
        "session_id": session.session_id(),
        "entity_id": entity_id,
        "url": url,
        "unmoved": unmoved,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Validate { file, class } => {
            let upload = read_upload_file(&file).await?;
            let result = AssetValidator::new(class).validate(&upload);
            let (width, height) = class.recommended_dimensions();
            print_json(&serde_json::json!({
                "asset_class": class,
                "max_bytes": class.max_bytes(),
                "recommended_dimensions": { "width": width, "height": height },
                "result": result,
            }))?;
        }
        Commands::Create {
            entity,
            files,
            cancel,
        } => {
            let gateway = gateway_from_env().await?;
            run_entity_session(gateway, entity, SessionMode::Create, None, files, cancel).await?;
        }
        Commands::Edit {
            entity,
            id,
            files,
            cancel,
        } => {
            let gateway = gateway_from_env().await?;
            run_entity_session(gateway, entity, SessionMode::Edit, Some(&id), files, cancel)
                .await?;
        }
        Commands::Stage {
            file,
            asset,
            move_to,
        } => {
            let gateway = gateway_from_env().await?;
            run_stage(gateway, file, asset, move_to).await?;
        }
    }

    Ok(())
}
