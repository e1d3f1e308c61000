use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use super::{init_store, print_json};
use crate::import::ImportRequest;
use crate::jobs::ImportQueue;
use crate::types::JobStatus;

pub struct ImportOptions {
    pub user_id: String,
    pub project_id: Option<String>,
    pub keep_duplicates: bool,
    pub update_existing: bool,
    pub workers: Option<usize>,
}

/// Queue a CSV file for import, wait for it, and print the job record.
pub async fn run_import(
    data_dir: String,
    file: PathBuf,
    options: ImportOptions,
) -> anyhow::Result<()> {
    let (mut config, store) = init_store(&data_dir)?;
    if let Some(workers) = options.workers {
        config.workers = workers;
        config.validate()?;
    }

    let bytes = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let mut request = ImportRequest::from_bytes(file_name, &bytes, options.user_id);
    request.project_id = options.project_id;
    request.skip_duplicates = !options.keep_duplicates;
    request.update_existing = options.update_existing;

    let queue = ImportQueue::start(store, &config);
    let submitted = queue.submit(request)?;
    let job = queue.wait(&submitted.id).await?;
    queue.shutdown().await;

    print_json(&job)?;

    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "Import job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
