use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "a line transfer is outstanding" flag.
///
/// The emulation core sets it right before enqueuing a `DrawLine` and spins
/// on it before the next one; the transfer-completion handler clears it.
/// It is the only cross-core mutual exclusion in the pipeline.
#[derive(Clone, Debug, Default)]
pub struct BusyFlag {
    inner: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn clear(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Spins until the flag is clear. Returns `true` if it had to wait.
    pub fn wait_clear(&self) -> bool {
        if !self.is_set() {
            return false;
        }
        while self.is_set() {
            std::hint::spin_loop();
        }
        true
    }
}
