use futures_util::future::join_all;
use seedr_core::FolderId;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::model::{FolderRef, TaskRecord};
use super::store::RemoteStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeletionSummary {
    pub deleted: usize,
    /// Tasks whose download did not succeed; their remote copy is kept.
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneSummary {
    pub pruned: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Deletes the remote copy of every task whose download succeeded. Errors
/// are logged and counted.
pub async fn delete_succeeded<S: RemoteStore>(
    store: &S,
    records: &[TaskRecord],
    concurrency: usize,
) -> DeletionSummary {
    let limit = Semaphore::new(concurrency.max(1));
    let limit = &limit;
    let mut summary = DeletionSummary::default();

    let mut deletions = Vec::new();
    for record in records {
        if !record.outcome().is_succeeded() {
            debug!(path = %record.task.relative_path, "keeping remote copy of failed download");
            summary.skipped += 1;
            continue;
        }
        deletions.push(async move {
            let Ok(_permit) = limit.acquire().await else {
                return false;
            };
            match store.delete_file(&record.task.remote_id).await {
                Ok(()) => {
                    debug!(path = %record.task.relative_path, "deleted remote file");
                    true
                }
                Err(err) => {
                    warn!(
                        path = %record.task.relative_path,
                        id = %record.task.remote_id,
                        error = %err,
                        "failed to delete remote file"
                    );
                    false
                }
            }
        });
    }

    for deleted in join_all(deletions).await {
        if deleted {
            summary.deleted += 1;
        } else {
            summary.failed += 1;
        }
    }
    summary
}

/// Deletes direct children of `root` that a fresh listing reports as empty.
/// Deeper folders are left alone.
pub async fn prune_top_level<S: RemoteStore>(store: &S, root: &FolderId) -> PruneSummary {
    let mut summary = PruneSummary::default();

    let top_level: Vec<FolderRef> = match store.list_folder(root).await {
        Ok(contents) => contents.folders.into_iter().map(FolderRef::from).collect(),
        Err(err) => {
            warn!(folder = %root, error = %err, "could not list folders to prune");
            summary.failed += 1;
            return summary;
        }
    };

    for folder in top_level {
        let id = FolderId::Id(folder.id.clone());
        let contents = match store.list_folder(&id).await {
            Ok(contents) => contents,
            Err(err) => {
                warn!(folder = %folder.name, error = %err, "could not re-list folder");
                summary.failed += 1;
                continue;
            }
        };
        if !contents.is_empty() {
            debug!(
                folder = %folder.name,
                files = contents.files.len(),
                folders = contents.folders.len(),
                "folder still has content"
            );
            summary.kept += 1;
            continue;
        }
        match store.delete_folder(&folder.id).await {
            Ok(()) => {
                info!(folder = %folder.name, "pruned empty folder");
                summary.pruned += 1;
            }
            Err(err) => {
                warn!(folder = %folder.name, error = %err, "failed to delete empty folder");
                summary.failed += 1;
            }
        }
    }
    summary
}
