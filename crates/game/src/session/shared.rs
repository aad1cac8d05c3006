use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Session;

/// Handle to a session shared between the tick loop and the transport
/// handlers. Intent application and tick iteration never overlap.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// A panic while holding the lock leaves the session usable; entity data
    /// is plain and every operation re-validates ids.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock())
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
