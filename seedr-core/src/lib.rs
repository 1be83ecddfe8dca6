mod auth;
mod client;

pub use auth::{AccessToken, AuthClient, AuthError};
pub use client::{
    ApiErrorClass, DEFAULT_API_TIMEOUT, FileEntry, FileLink, FolderContents, FolderEntry, FolderId, RemoteId,
    SeedrClient, SeedrError,
};
