use std::sync::Arc;

use seedr_core::{FileLink, FolderContents, FolderId, RemoteId};
use thiserror::Error;
use tokio::sync::Semaphore;

use super::store::RemoteStore;

/// A remote client whose calls block the calling thread.
pub trait BlockingRemoteStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_folder(&self, folder: &FolderId) -> Result<FolderContents, Self::Error>;
    fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, Self::Error>;
    fn delete_file(&self, id: &RemoteId) -> Result<(), Self::Error>;
    fn delete_folder(&self, id: &RemoteId) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum OffloadError<E> {
    #[error(transparent)]
    Store(E),
    #[error("blocking worker pool is closed")]
    PoolClosed,
    #[error("blocking call did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs every call of a [`BlockingRemoteStore`] on the blocking thread pool,
/// at most `workers` at a time, so downloads in flight keep making progress.
///
/// This is how a synchronous client is plugged into
/// [`SyncDriver`](super::driver::SyncDriver); the async [`SeedrClient`]
/// implements [`RemoteStore`] directly and does not need it.
///
/// [`SeedrClient`]: seedr_core::SeedrClient
///
/// ```no_run
/// use seedr_core::{FileLink, FolderContents, FolderId, RemoteId};
/// use seedr_sync::sync::blocking::{BlockingRemoteStore, Offloaded};
/// use seedr_sync::sync::store::RemoteStore;
///
/// struct EmptyAccount;
///
/// impl BlockingRemoteStore for EmptyAccount {
///     type Error = std::io::Error;
///
///     fn list_folder(&self, _folder: &FolderId) -> Result<FolderContents, Self::Error> {
///         Ok(FolderContents::default())
///     }
///     fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, Self::Error> {
///         Err(std::io::Error::other(format!("no file {id}")))
///     }
///     fn delete_file(&self, _id: &RemoteId) -> Result<(), Self::Error> {
///         Ok(())
///     }
///     fn delete_folder(&self, _id: &RemoteId) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// # async fn run() {
/// let store = Offloaded::new(EmptyAccount, 2);
/// let root = store.list_folder(&FolderId::Root).await.unwrap();
/// assert!(root.is_empty());
/// # }
/// ```
pub struct Offloaded<T> {
    inner: Arc<T>,
    workers: Arc<Semaphore>,
}

impl<T: BlockingRemoteStore> Offloaded<T> {
    pub fn new(inner: T, workers: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    async fn run<R, F>(&self, call: F) -> Result<R, OffloadError<T::Error>>
    where
        F: FnOnce(&T) -> Result<R, T::Error> + Send + 'static,
        R: Send + 'static,
    {
        let _permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| OffloadError::PoolClosed)?;
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || call(&inner))
            .await?
            .map_err(OffloadError::Store)
    }
}

impl<T: BlockingRemoteStore> RemoteStore for Offloaded<T> {
    type Error = OffloadError<T::Error>;

    async fn list_folder(&self, folder: &FolderId) -> Result<FolderContents, Self::Error> {
        let folder = folder.clone();
        self.run(move |store| store.list_folder(&folder)).await
    }

    async fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, Self::Error> {
        let id = id.clone();
        self.run(move |store| store.fetch_file(&id)).await
    }

    async fn delete_file(&self, id: &RemoteId) -> Result<(), Self::Error> {
        let id = id.clone();
        self.run(move |store| store.delete_file(&id)).await
    }

    async fn delete_folder(&self, id: &RemoteId) -> Result<(), Self::Error> {
        let id = id.clone();
        self.run(move |store| store.delete_folder(&id)).await
    }
}
