use parking_lot::Mutex;
use parley_core::{ProfileRecord, SessionId};
use parley_extract::RecordCache;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of offering a record to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The session already holds a record; the first one stays.
    AlreadyResolved,
    /// The offer belongs to a session that is no longer current.
    StaleSession,
}

#[derive(Default)]
struct SlotState {
    session_id: Option<SessionId>,
    record: Option<ProfileRecord>,
}

/// The resolved-record slot of the current session.
///
/// Shared between the controller and running extraction so the cache check
/// sees records that land late. Every write is check-and-discard: an offer
/// for a stale session or an already resolved one is dropped.
#[derive(Clone, Default)]
pub struct ProfileSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ProfileSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `session_id` current and drop any record from before.
    pub fn reset(&self, session_id: SessionId) {
        let mut state = self.inner.lock();
        state.session_id = Some(session_id);
        state.record = None;
    }

    pub fn commit(&self, session_id: &SessionId, record: ProfileRecord) -> CommitOutcome {
        let mut state = self.inner.lock();
        if state.session_id.as_ref() != Some(session_id) {
            debug!(session_id = %session_id, "Discarding record for stale session");
            return CommitOutcome::StaleSession;
        }
        if state.record.is_some() {
            debug!(session_id = %session_id, "Session already resolved, keeping first record");
            return CommitOutcome::AlreadyResolved;
        }
        info!(session_id = %session_id, record_id = %record.id, "Profile resolved");
        state.record = Some(record);
        CommitOutcome::Committed
    }

    pub fn current(&self) -> Option<ProfileRecord> {
        self.inner.lock().record.clone()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session_id.clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.lock().record.is_some()
    }
}

impl RecordCache for ProfileSlot {
    fn cached(&self, session_id: &SessionId) -> Option<ProfileRecord> {
        let state = self.inner.lock();
        if state.session_id.as_ref() == Some(session_id) {
            state.record.clone()
        } else {
            None
        }
    }
}
