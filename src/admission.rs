//! Admission/queue policy: the only way Progress moves `PENDING` → `QUEUED`.
//!
//! Both operations are synchronous, invoked from HTTP handlers, and each is
//! a single transaction against the Store.

use spacesaver_common::EntryId;
use spacesaver_db::{Entry, ProgressUpdate, Status, Store};

/// Outcome of an admission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    NotFound,
    AlreadyQueued,
    AlreadyInProgress,
    QueueActive,
    NoCandidates,
}

impl AdmissionError {
    /// Short human-readable string for the `{error}` HTTP body.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "entry not found",
            Self::AlreadyQueued => "already queued",
            Self::AlreadyInProgress => "already in progress",
            Self::QueueActive => "queue already active",
            Self::NoCandidates => "no pending candidates",
        }
    }
}

/// Queue the entry with `uuid`. `DONE` and `OPTIMUM` entries are
/// re-enqueueable; `QUEUED`/`IN_PROGRESS` entries are not.
pub fn enqueue(store: &Store, uuid: EntryId) -> Result<(), AdmissionError> {
    let entry = store
        .get_entry_by_uuid(uuid)
        .map_err(|_| AdmissionError::NotFound)?
        .ok_or(AdmissionError::NotFound)?;
    let _ = entry;

    let progress = store
        .get_progress(uuid)
        .map_err(|_| AdmissionError::NotFound)?
        .ok_or(AdmissionError::NotFound)?;

    match progress.status {
        Status::Queued => return Err(AdmissionError::AlreadyQueued),
        Status::InProgress => return Err(AdmissionError::AlreadyInProgress),
        Status::Pending | Status::Done | Status::Optimum => {}
    }

    store
        .update_progress(uuid, &ProgressUpdate { status: Some(Status::Queued), ..Default::default() })
        .map_err(|_| AdmissionError::NotFound)?;
    Ok(())
}

/// Queue the largest `PENDING` entry, if the queue isn't already active.
pub fn enqueue_best(store: &Store) -> Result<Entry, AdmissionError> {
    if store.has_active_queue().unwrap_or(false) {
        return Err(AdmissionError::QueueActive);
    }

    let entry = store
        .query_best_candidate()
        .map_err(|_| AdmissionError::NoCandidates)?
        .ok_or(AdmissionError::NoCandidates)?;

    store
        .set_status(entry.uuid, Status::Queued)
        .map_err(|_| AdmissionError::NoCandidates)?;

    Ok(entry)
}
