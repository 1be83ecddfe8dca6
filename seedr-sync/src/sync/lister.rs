use seedr_core::FolderId;
use thiserror::Error;
use tracing::debug;

use super::model::FileTask;
use super::paths::join_relative;
use super::store::RemoteStore;

#[derive(Debug, Error)]
#[error("listing folder {folder} failed: {source}")]
pub struct ListError {
    pub folder: FolderId,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Walks the remote tree under `root` and flattens every file into a
/// [`FileTask`]. Order is depth-first with a folder's own files ahead of its
/// subfolders. Any listing error aborts the walk.
pub async fn list_all<S: RemoteStore>(
    store: &S,
    root: &FolderId,
) -> Result<Vec<FileTask>, ListError> {
    let mut tasks = Vec::new();
    let mut pending = vec![(root.clone(), String::new())];

    while let Some((folder, prefix)) = pending.pop() {
        let contents = store
            .list_folder(&folder)
            .await
            .map_err(|err| ListError {
                folder: folder.clone(),
                source: Box::new(err),
            })?;
        debug!(
            folder = %folder,
            files = contents.files.len(),
            folders = contents.folders.len(),
            "listed remote folder"
        );

        for file in contents.files {
            tasks.push(FileTask {
                remote_id: file.folder_file_id,
                relative_path: join_relative(&prefix, &file.name),
                name: file.name,
                size: file.size,
            });
        }
        // Reversed so the first subfolder is popped next.
        for sub in contents.folders.into_iter().rev() {
            let sub_prefix = join_relative(&prefix, &sub.name);
            pending.push((FolderId::Id(sub.id), sub_prefix));
        }
    }

    Ok(tasks)
}
