use std::future::Future;

use seedr_core::{FileLink, FolderContents, FolderId, RemoteId, SeedrClient, SeedrError};

/// The remote account operations the sync pipeline depends on.
pub trait RemoteStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_folder(
        &self,
        folder: &FolderId,
    ) -> impl Future<Output = Result<FolderContents, Self::Error>> + Send;

    /// Resolves a short-lived download link for a file.
    fn fetch_file(
        &self,
        id: &RemoteId,
    ) -> impl Future<Output = Result<FileLink, Self::Error>> + Send;

    fn delete_file(&self, id: &RemoteId) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn delete_folder(
        &self,
        id: &RemoteId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl RemoteStore for SeedrClient {
    type Error = SeedrError;

    async fn list_folder(&self, folder: &FolderId) -> Result<FolderContents, SeedrError> {
        SeedrClient::list_folder(self, folder).await
    }

    async fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, SeedrError> {
        SeedrClient::fetch_file(self, id).await
    }

    async fn delete_file(&self, id: &RemoteId) -> Result<(), SeedrError> {
        SeedrClient::delete_file(self, id).await
    }

    async fn delete_folder(&self, id: &RemoteId) -> Result<(), SeedrError> {
        SeedrClient::delete_folder(self, id).await
    }
}
