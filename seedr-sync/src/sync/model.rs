use seedr_core::{FolderEntry, RemoteId};

/// One remote file to pull down and, if that works, remove from the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub remote_id: RemoteId,
    /// Ancestor folder names from the root down to `name`, joined with `/`.
    pub relative_path: String,
    pub name: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    NotAttempted,
    Succeeded,
    Failed,
}

impl DownloadOutcome {
    pub fn is_succeeded(self) -> bool {
        self == DownloadOutcome::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task: FileTask,
    outcome: DownloadOutcome,
}

impl TaskRecord {
    pub fn pending(task: FileTask) -> Self {
        Self {
            task,
            outcome: DownloadOutcome::NotAttempted,
        }
    }

    pub fn outcome(&self) -> DownloadOutcome {
        self.outcome
    }

    /// Settles the outcome. Returns `false` and leaves the record untouched
    /// if an outcome was already recorded.
    pub fn record(&mut self, outcome: DownloadOutcome) -> bool {
        if self.outcome != DownloadOutcome::NotAttempted
            || outcome == DownloadOutcome::NotAttempted
        {
            return false;
        }
        self.outcome = outcome;
        true
    }
}

/// A direct child folder of the root, considered for pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub id: RemoteId,
    pub name: String,
}

impl From<FolderEntry> for FolderRef {
    fn from(entry: FolderEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> FileTask {
        FileTask {
            remote_id: RemoteId::from(1),
            relative_path: "docs/a.pdf".to_string(),
            name: "a.pdf".to_string(),
            size: None,
        }
    }

    #[test]
    fn outcome_is_recorded_once() {
        let mut record = TaskRecord::pending(task());
        assert_eq!(record.outcome(), DownloadOutcome::NotAttempted);

        assert!(record.record(DownloadOutcome::Failed));
        assert!(!record.record(DownloadOutcome::Succeeded));
        assert_eq!(record.outcome(), DownloadOutcome::Failed);
    }

    #[test]
    fn recording_not_attempted_is_refused() {
        let mut record = TaskRecord::pending(task());
        assert!(!record.record(DownloadOutcome::NotAttempted));
        assert!(record.record(DownloadOutcome::Succeeded));
        assert!(record.outcome().is_succeeded());
    }
}
