//! Optimistic-transaction helper for request/response exchanges.
//!
//! User intent is applied to local state immediately, before the matching
//! engine request resolves; the snapshot taken at that moment is what a
//! failed request rolls back to.  One helper covers every such exchange in
//! the session so the snapshot/commit/rollback discipline is uniform.

/// One in-flight optimistic exchange over a single state slot.
#[derive(Debug)]
pub struct Txn<T> {
    prior: T,
}

impl<T> Txn<T> {
    /// Snapshot `*slot` and optimistically replace it with `next`.
    pub fn apply(slot: &mut T, next: T) -> Self {
        Self {
            prior: std::mem::replace(slot, next),
        }
    }

    /// The request succeeded; the optimistic value stands.
    pub fn commit(self) {}

    /// The request failed; restore the snapshot.
    pub fn rollback(self, slot: &mut T) {
        *slot = self.prior;
    }

    /// The last known-good value this exchange would roll back to.
    pub fn prior(&self) -> &T {
        &self.prior
    }
}
