//! Process-wide backend handle
//!
//! Engines and input containers hold a [`BackendHandle`]. The first
//! acquisition constructs the shared backend state; dropping the last
//! handle releases it. The registry only keeps a weak reference, so no
//! state outlives its users.
//!
//! The backend owns the scratch byte buffer used by the byte-stream codec.
//! Its capacity grows to the largest record seen and is cleared, never
//! freed, between uses.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

// =============================================================================
// Backend Registry
// =============================================================================

static BACKEND: Lazy<Mutex<Weak<Backend>>> = Lazy::new(|| Mutex::new(Weak::new()));

struct Backend {
    scratch: Mutex<Vec<u8>>,
}

impl Drop for Backend {
    fn drop(&mut self) {
        debug!(
            scratch_capacity = self.scratch.get_mut().capacity(),
            "Released container backend"
        );
    }
}

/// Shared handle to the container backend
#[derive(Clone)]
pub struct BackendHandle {
    backend: Arc<Backend>,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("users", &Arc::strong_count(&self.backend))
            .finish()
    }
}

impl BackendHandle {
    /// Acquire the backend, constructing it if no handle is alive
    pub fn acquire() -> Self {
        let mut slot = BACKEND.lock();
        if let Some(backend) = slot.upgrade() {
            return BackendHandle { backend };
        }
        let backend = Arc::new(Backend {
            scratch: Mutex::new(Vec::new()),
        });
        *slot = Arc::downgrade(&backend);
        debug!("Initialized container backend");
        BackendHandle { backend }
    }

    /// True if some handle is currently alive in this process
    pub fn is_active() -> bool {
        BACKEND.lock().strong_count() > 0
    }

    /// True if both handles share one backend
    pub fn same_backend(&self, other: &BackendHandle) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    /// Run `f` with the cleared scratch buffer
    ///
    /// Calls must not nest; the buffer is locked for the duration of `f`.
    pub fn with_scratch<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        let mut scratch = self.backend.scratch.lock();
        scratch.clear();
        f(&mut scratch)
    }

    /// Current capacity of the scratch buffer
    pub fn scratch_capacity(&self) -> usize {
        self.backend.scratch.lock().capacity()
    }
}
