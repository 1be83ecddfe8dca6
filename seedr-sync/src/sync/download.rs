use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::model::{DownloadOutcome, FileTask, TaskRecord};
use super::paths::{PathError, check_name, local_target_for};
use super::store::RemoteStore;
use super::transfer::{TransferClient, TransferError};
use crate::progress::TransferProgress;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("could not resolve download link: {0}")]
    Resolve(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("path error: {0}")]
    Path(#[from] PathError),
    #[error("{0:?} is already the target of another remote file")]
    TargetClaimed(PathBuf),
    #[error("could not create {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
    #[error("concurrency limiter is closed")]
    ConcurrencyClosed,
}

/// Pulls remote files down under `output_root`, at most `concurrency` at once.
pub struct Downloader {
    transfer: TransferClient,
    output_root: PathBuf,
    limit: Semaphore,
    progress: TransferProgress,
}

impl Downloader {
    pub fn new(
        transfer: TransferClient,
        output_root: impl Into<PathBuf>,
        concurrency: usize,
    ) -> Self {
        Self {
            transfer,
            output_root: output_root.into(),
            limit: Semaphore::new(concurrency.max(1)),
            progress: TransferProgress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: TransferProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Attempts every task once and returns only after all of them settled,
    /// one record per task in input order.
    ///
    /// Local targets are resolved up front. A task whose target is unusable,
    /// or already claimed by an earlier task, is recorded as failed without
    /// being fetched, so its remote copy survives cleanup.
    pub async fn download_all<S: RemoteStore>(
        &self,
        store: &S,
        tasks: Vec<FileTask>,
    ) -> Vec<TaskRecord> {
        let planned = self.plan_targets(tasks);
        let attempts = planned.into_iter().map(move |(task, target)| async move {
            let mut record = TaskRecord::pending(task);
            let outcome = match target {
                Ok(target) => self.download_to(store, &record.task, &target).await,
                Err(err) => {
                    warn!(path = %record.task.relative_path, error = %err, "not downloading");
                    DownloadOutcome::Failed
                }
            };
            record.record(outcome);
            record
        });
        join_all(attempts).await
    }

    pub async fn download<S: RemoteStore>(&self, store: &S, task: &FileTask) -> DownloadOutcome {
        match self.target_for(task) {
            Ok(target) => self.download_to(store, task, &target).await,
            Err(err) => {
                warn!(path = %task.relative_path, error = %err, "not downloading");
                DownloadOutcome::Failed
            }
        }
    }

    fn plan_targets(
        &self,
        tasks: Vec<FileTask>,
    ) -> Vec<(FileTask, Result<PathBuf, DownloadError>)> {
        let mut claimed = HashSet::new();
        tasks
            .into_iter()
            .map(|task| {
                let target = match self.target_for(&task) {
                    Ok(target) if claimed.insert(target.clone()) => Ok(target),
                    Ok(target) => Err(DownloadError::TargetClaimed(target)),
                    Err(err) => Err(err),
                };
                (task, target)
            })
            .collect()
    }

    fn target_for(&self, task: &FileTask) -> Result<PathBuf, DownloadError> {
        check_name(&task.name)?;
        Ok(local_target_for(&self.output_root, &task.relative_path)?)
    }

    async fn download_to<S: RemoteStore>(
        &self,
        store: &S,
        task: &FileTask,
        target: &Path,
    ) -> DownloadOutcome {
        match self.try_download(store, task, target).await {
            Ok(bytes) => {
                info!(path = %task.relative_path, bytes, "downloaded");
                DownloadOutcome::Succeeded
            }
            Err(err) => {
                warn!(
                    path = %task.relative_path,
                    id = %task.remote_id,
                    error = %err,
                    "download failed"
                );
                DownloadOutcome::Failed
            }
        }
    }

    async fn try_download<S: RemoteStore>(
        &self,
        store: &S,
        task: &FileTask,
        target: &Path,
    ) -> Result<u64, DownloadError> {
        let _permit = self
            .limit
            .acquire()
            .await
            .map_err(|_| DownloadError::ConcurrencyClosed)?;

        let link = store
            .fetch_file(&task.remote_id)
            .await
            .map_err(|err| DownloadError::Resolve(Box::new(err)))?;
        debug!(path = %task.relative_path, url = %link.url, "resolved download link");

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let bar = self.progress.file_bar(&task.relative_path, task.size);
        let result = self
            .transfer
            .download_to_path(&link.url, target, &bar)
            .await;
        bar.finish_and_clear();
        Ok(result?)
    }
}
