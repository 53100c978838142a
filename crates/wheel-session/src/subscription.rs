//! Push-event subscription bookkeeping.
//!
//! The session establishes a fixed set of named subscriptions once at
//! startup, each backed by one forwarder task.  Cancellation consumes the
//! handle, so a double-unsubscribe is unrepresentable; the set guarantees
//! the shutdown path tears every subscription down exactly once.

use std::future::Future;

use tokio::task::AbortHandle;
use tracing::debug;

/// A single active push subscription.
pub struct Subscription {
    name: &'static str,
    handle: AbortHandle,
}

impl Subscription {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tear the subscription down, consuming the handle.
    pub fn cancel(self) {
        debug!("unsubscribing from '{}'", self.name);
        self.handle.abort();
    }
}

/// Owned collection of every subscription this session holds.
#[derive(Default)]
pub struct SubscriptionSet {
    subs: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a forwarder task and track it under `name`.
    pub fn spawn<F>(&mut self, name: &'static str, forwarder: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(forwarder);
        self.subs.push(Subscription {
            name,
            handle: handle.abort_handle(),
        });
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Cancel every tracked subscription.  Calling this again later is a
    /// no-op: the set is drained on the first pass.
    pub fn shutdown(&mut self) {
        for sub in self.subs.drain(..) {
            sub.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    /// Sends on its channel when dropped — observes task teardown.
    struct DropProbe(mpsc::UnboundedSender<&'static str>);

    impl Drop for DropProbe {
        fn drop(&mut self) {
            let _ = self.0.send("dropped");
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_each_subscription_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = SubscriptionSet::new();

        for name in ["slot-list", "roll-stopped"] {
            let probe = DropProbe(tx.clone());
            set.spawn(name, async move {
                let _probe = probe;
                std::future::pending::<()>().await;
            });
        }
        drop(tx);
        assert_eq!(set.len(), 2);

        set.shutdown();
        assert!(set.is_empty());

        // Exactly one drop per forwarder, then the channel closes.
        assert_eq!(rx.recv().await, Some("dropped"));
        assert_eq!(rx.recv().await, Some("dropped"));
        assert_eq!(rx.recv().await, None);

        // Second shutdown has nothing left to touch.
        set.shutdown();
        assert!(set.is_empty());
    }
}
