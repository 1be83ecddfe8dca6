//! In-memory remote store for exercising the sync phases.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use seedr_core::{FileEntry, FileLink, FolderContents, FolderEntry, FolderId, RemoteId};
use thiserror::Error;
use url::Url;

use super::store::RemoteStore;

#[derive(Debug, Error)]
#[error("fake store: {0}")]
pub(crate) struct FakeError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(FolderId),
    Fetch(RemoteId),
    DeleteFile(RemoteId),
    DeleteFolder(RemoteId),
}

#[derive(Default)]
struct State {
    folders: HashMap<FolderId, FolderContents>,
    download_base: Option<Url>,
    failing_lists: HashSet<FolderId>,
    failing_fetches: HashSet<RemoteId>,
    failing_deletes: HashSet<RemoteId>,
    delete_delay: Option<Duration>,
    calls: Vec<(Instant, Call)>,
}

pub(crate) struct FakeStore {
    state: Mutex<State>,
    deletes_in_flight: AtomicUsize,
    peak_deletes: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        let mut state = State::default();
        state.folders.insert(FolderId::Root, FolderContents::default());
        Self {
            state: Mutex::new(state),
            deletes_in_flight: AtomicUsize::new(0),
            peak_deletes: AtomicUsize::new(0),
        }
    }

    /// Fetch links resolve to `{base}/files/{id}`.
    pub(crate) fn serve_from(&self, base: &str) {
        self.state.lock().unwrap().download_base = Some(Url::parse(base).unwrap());
    }

    pub(crate) fn add_folder(&self, parent: &FolderId, id: u64, name: &str) -> FolderId {
        let mut state = self.state.lock().unwrap();
        let id = RemoteId::from(id);
        state
            .folders
            .get_mut(parent)
            .expect("parent folder exists")
            .folders
            .push(FolderEntry {
                id: id.clone(),
                name: name.to_string(),
                size: None,
            });
        let folder = FolderId::Id(id);
        state
            .folders
            .insert(folder.clone(), FolderContents::default());
        folder
    }

    pub(crate) fn add_file(&self, parent: &FolderId, id: u64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .folders
            .get_mut(parent)
            .expect("parent folder exists")
            .files
            .push(FileEntry {
                folder_file_id: RemoteId::from(id),
                name: name.to_string(),
                size: None,
            });
    }

    pub(crate) fn fail_listing(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        state.failing_lists.insert(FolderId::Id(RemoteId::from(id)));
    }

    pub(crate) fn fail_root_listing(&self) {
        self.state.lock().unwrap().failing_lists.insert(FolderId::Root);
    }

    pub(crate) fn fail_fetch(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        state.failing_fetches.insert(RemoteId::from(id));
    }

    pub(crate) fn fail_delete(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        state.failing_deletes.insert(RemoteId::from(id));
    }

    /// Every delete call stays in flight for `delay` before it takes effect.
    pub(crate) fn slow_deletes(&self, delay: Duration) {
        self.state.lock().unwrap().delete_delay = Some(delay);
    }

    /// Most delete calls that were ever in flight at the same time.
    pub(crate) fn peak_deletes(&self) -> usize {
        self.peak_deletes.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        let state = self.state.lock().unwrap();
        state.calls.iter().map(|(_, call)| call.clone()).collect()
    }

    pub(crate) fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn deleted_files(&self) -> Vec<RemoteId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteFile(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn deleted_folders(&self) -> Vec<RemoteId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteFolder(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn holds_file(&self, id: u64) -> bool {
        let id = RemoteId::from(id);
        let state = self.state.lock().unwrap();
        state
            .folders
            .values()
            .any(|contents| contents.files.iter().any(|f| f.folder_file_id == id))
    }

    pub(crate) fn holds_folder(&self, id: u64) -> bool {
        let state = self.state.lock().unwrap();
        state
            .folders
            .contains_key(&FolderId::Id(RemoteId::from(id)))
    }
}

impl FakeStore {
    async fn begin_delete(&self, call: Call) {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((Instant::now(), call));
            state.delete_delay
        };
        let Some(delay) = delay else {
            return;
        };
        let now = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_deletes.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemoteStore for FakeStore {
    type Error = FakeError;

    async fn list_folder(&self, folder: &FolderId) -> Result<FolderContents, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Instant::now(), Call::List(folder.clone())));
        if state.failing_lists.contains(folder) {
            return Err(FakeError(format!("cannot list {folder}")));
        }
        state
            .folders
            .get(folder)
            .cloned()
            .ok_or_else(|| FakeError(format!("no folder {folder}")))
    }

    async fn fetch_file(&self, id: &RemoteId) -> Result<FileLink, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Instant::now(), Call::Fetch(id.clone())));
        if state.failing_fetches.contains(id) {
            return Err(FakeError(format!("cannot fetch {id}")));
        }
        let base = state
            .download_base
            .clone()
            .ok_or_else(|| FakeError("no download server".to_string()))?;
        let url = base
            .join(&format!("/files/{id}"))
            .map_err(|err| FakeError(err.to_string()))?;
        Ok(FileLink { url, name: None })
    }

    async fn delete_file(&self, id: &RemoteId) -> Result<(), FakeError> {
        self.begin_delete(Call::DeleteFile(id.clone())).await;
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(id) {
            return Err(FakeError(format!("cannot delete file {id}")));
        }
        for contents in state.folders.values_mut() {
            contents.files.retain(|f| &f.folder_file_id != id);
        }
        Ok(())
    }

    async fn delete_folder(&self, id: &RemoteId) -> Result<(), FakeError> {
        self.begin_delete(Call::DeleteFolder(id.clone())).await;
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(id) {
            return Err(FakeError(format!("cannot delete folder {id}")));
        }
        state.folders.remove(&FolderId::Id(id.clone()));
        for contents in state.folders.values_mut() {
            contents.folders.retain(|f| &f.id != id);
        }
        Ok(())
    }
}
