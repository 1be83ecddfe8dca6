use seedr_core::{FolderId, SeedrError};
use thiserror::Error;
use tracing::{debug, info};

use super::cleanup::{DeletionSummary, PruneSummary, delete_succeeded, prune_top_level};
use super::download::Downloader;
use super::lister::{ListError, list_all};
use super::store::RemoteStore;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Listing(#[from] ListError),
}

impl SyncError {
    /// The remote side refused the session's credentials.
    pub fn is_auth(&self) -> bool {
        match self {
            SyncError::Listing(err) => err
                .source
                .downcast_ref::<SeedrError>()
                .is_some_and(SeedrError::is_auth),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Listing,
    Downloading,
    Cleanup,
    Done,
    Aborted,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub files_listed: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub deletion: DeletionSummary,
    pub prune: PruneSummary,
}

/// Runs list, download and cleanup strictly one after another. Each phase
/// starts only once the previous one has fully finished.
pub struct SyncDriver<S> {
    store: S,
    downloader: Downloader,
    root: FolderId,
    delete_concurrency: usize,
    phase: SyncPhase,
}

impl<S: RemoteStore> SyncDriver<S> {
    pub fn new(store: S, downloader: Downloader, delete_concurrency: usize) -> Self {
        Self {
            store,
            downloader,
            root: FolderId::Root,
            delete_concurrency,
            phase: SyncPhase::Listing,
        }
    }

    pub fn with_root(mut self, root: FolderId) -> Self {
        self.root = root;
        self
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&mut self) -> Result<SyncReport, SyncError> {
        self.enter(SyncPhase::Listing);
        info!(root = %self.root, "retrieving remote file list");
        let tasks = match list_all(&self.store, &self.root).await {
            Ok(tasks) => tasks,
            Err(err) => {
                self.enter(SyncPhase::Aborted);
                return Err(err.into());
            }
        };

        let mut report = SyncReport {
            files_listed: tasks.len(),
            ..SyncReport::default()
        };

        self.enter(SyncPhase::Downloading);
        info!(
            files = tasks.len(),
            output = %self.downloader.output_root().display(),
            "starting downloads"
        );
        let records = self.downloader.download_all(&self.store, tasks).await;
        report.downloaded = records
            .iter()
            .filter(|r| r.outcome().is_succeeded())
            .count();
        report.failed = records.len() - report.downloaded;

        self.enter(SyncPhase::Cleanup);
        report.deletion = delete_succeeded(&self.store, &records, self.delete_concurrency).await;
        report.prune = prune_top_level(&self.store, &self.root).await;

        self.enter(SyncPhase::Done);
        info!(
            downloaded = report.downloaded,
            failed = report.failed,
            "all files have been downloaded and processed"
        );
        Ok(report)
    }

    fn enter(&mut self, phase: SyncPhase) {
        debug!(from = ?self.phase, to = ?phase, "sync phase");
        self.phase = phase;
    }
}
