//! Lazy single-flight provisioning
//!
//! The backing database and collection are created on first use, at most once
//! per adapter instance. Concurrent first callers share a single in-flight
//! initialization; success is memoized for the adapter's lifetime. A failed
//! attempt is not cached: the error surfaces to the caller that drove the
//! attempt, and a caller that was waiting on the failed attempt does not
//! receive that error second-hand; it runs a fresh attempt of its own, as
//! does any later call.

use std::future::Future;

use tokio::sync::OnceCell;

use crate::error::StoreResult;

/// One-time, thread-safe initializer for a provisioned collection handle.
///
/// Wraps `tokio::sync::OnceCell` so every operation goes through the same
/// single-flight path: one computation, the result shared with all waiters,
/// and the handle immutable afterward.
pub(crate) struct LazyCollectionProvisioner<T> {
    cell: OnceCell<T>,
}

impl<T> LazyCollectionProvisioner<T> {
    /// Create an empty, unprovisioned cell
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the memoized handle, running `init` first if no attempt has
    /// succeeded yet. Concurrent callers block on the same in-flight attempt.
    pub async fn ensure_ready<F, Fut>(&self, init: F) -> StoreResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.cell.get_or_try_init(init).await
    }
}
