//! Subscribable events with independent listeners.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by a subscription, used to unsubscribe.
///
/// Unique across every event in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An event with 0..N listeners of type `F` (usually a `dyn Fn`).
pub struct Event<F: ?Sized> {
    name: &'static str,
    listeners: RwLock<Vec<(ListenerId, Arc<F>)>>,
}

impl<F: ?Sized> Event<F> {
    /// Create an event with no listeners. `name` is used in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Add a listener.
    pub fn subscribe(&self, listener: Arc<F>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener. Returns true if it was subscribed to this event.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Check if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener through `call`, in subscription order.
    ///
    /// Listeners are snapshotted first, so a listener may subscribe or
    /// unsubscribe without deadlocking. A panicking listener is logged and
    /// skipped; the remaining listeners still run and the panic never leaves
    /// this function. Returns the number of listeners that completed.
    pub fn emit(&self, mut call: impl FnMut(&F)) -> usize {
        let snapshot: Vec<Arc<F>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let mut completed = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| call(&*listener))) {
                Ok(()) => completed += 1,
                Err(_) => log::error!("{} listener panicked; continuing", self.name),
            }
        }
        completed
    }
}
