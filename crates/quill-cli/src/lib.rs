use anyhow::Context;
use quill_core::{FileRole, UploadFile};
use quill_storage::keys;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// A `--file` argument: `[role=]path`, role defaulting to primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArg {
    pub role: FileRole,
    pub path: PathBuf,
}

impl FromStr for FileArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, path) = match s.split_once('=') {
            Some((role, path)) => (role.parse::<FileRole>()?, path),
            None => (FileRole::Primary, s),
        };
        if path.is_empty() {
            anyhow::bail!("Missing file path in '{}'", s);
        }
        Ok(FileArg {
            role,
            path: PathBuf::from(path),
        })
    }
}

/// Read a file from disk, guessing its content type from the extension.
pub async fn read_upload_file(path: &Path) -> anyhow::Result<UploadFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;

    Ok(UploadFile::new(
        name,
        keys::content_type_for_path(name),
        data,
    ))
}

/// Initialize tracing for the CLI. Logs go to stderr; stdout carries JSON results.
pub fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
