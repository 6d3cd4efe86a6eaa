use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stencil_shared::{JobId, LibraryItemId, Target, UploadId};

use crate::error::{ClientError, Result};
use crate::state::SessionState;

/// Identifies the entity a mutating action targets. At most one action per
/// key runs at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    CreateUpload(String),
    Convert(UploadId, Target),
    Promote(JobId),
    DeleteUpload(UploadId),
    DeleteLibraryItem(LibraryItemId),
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKey::CreateUpload(title) => write!(f, "Upload of \"{title}\""),
            ActionKey::Convert(upload, target) => {
                write!(f, "{} conversion of upload {upload}", target.label())
            }
            ActionKey::Promote(job) => write!(f, "Adding job {job} to the library"),
            ActionKey::DeleteUpload(id) => write!(f, "Deletion of upload {id}"),
            ActionKey::DeleteLibraryItem(id) => write!(f, "Deletion of library item {id}"),
        }
    }
}

pub(crate) fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a key as in flight until dropped.
pub(crate) struct InFlightGuard {
    state: Arc<Mutex<SessionState>>,
    key: ActionKey,
}

impl InFlightGuard {
    pub fn acquire(state: &Arc<Mutex<SessionState>>, key: ActionKey) -> Result<Self> {
        if !lock(state).in_flight.insert(key.clone()) {
            return Err(ClientError::InFlight(key.to_string()));
        }
        Ok(Self {
            state: Arc::clone(state),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.state).in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive_per_key() {
        let state = Arc::new(Mutex::new(SessionState::new()));
        let upload = UploadId::new();

        let first = InFlightGuard::acquire(&state, ActionKey::Convert(upload, Target::Django)).unwrap();
        assert!(matches!(
            InFlightGuard::acquire(&state, ActionKey::Convert(upload, Target::Django)),
            Err(ClientError::InFlight(_))
        ));
        // other target, other key
        let other = InFlightGuard::acquire(&state, ActionKey::Convert(upload, Target::Nextjs));
        assert!(other.is_ok());

        drop(first);
        assert!(InFlightGuard::acquire(&state, ActionKey::Convert(upload, Target::Django)).is_ok());
    }
}
