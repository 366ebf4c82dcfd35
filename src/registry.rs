//! Reverse lookup from context tokens to live adapters.
//!
//! The native layer can only carry one opaque pointer back into a callback.
//! Adapters register themselves here under a [`ContextToken`], hand the token
//! to the native open call, and the trampolines resolve it back to the adapter.

use std::collections::HashMap;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Stable key correlating native callbacks with one adapter instance.
///
/// Allocated from a monotonically increasing counter and never reused, so a
/// stale token from a torn-down adapter cannot alias a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(usize);

impl ContextToken {
    /// Encode as the opaque client-data pointer passed to the native layer.
    pub fn as_client_data(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    /// Decode a client-data pointer received in a callback.
    pub fn from_client_data(client_data: *mut c_void) -> Self {
        Self(client_data as usize)
    }

    /// Get the raw token value.
    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// Lock-protected map from token to adapter.
///
/// Entries hold `Weak` references: the registry never keeps an adapter alive,
/// so a callback arriving during teardown cannot resurrect it.
pub struct CallbackRegistry<T> {
    next: AtomicUsize,
    entries: Mutex<HashMap<usize, Weak<T>>>,
}

impl<T> CallbackRegistry<T> {
    /// Create an empty registry. Tokens start at 1; 0 is never handed out.
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register an adapter and return its fresh token.
    pub fn register(&self, target: &Arc<T>) -> ContextToken {
        let token = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(token, Arc::downgrade(target));
        ContextToken(token)
    }

    /// Resolve a token to its adapter.
    ///
    /// Returns `None` if the token was never issued, was unregistered, or the
    /// adapter is already being dropped.
    pub fn lookup(&self, token: ContextToken) -> Option<Arc<T>> {
        self.entries.lock().get(&token.0).and_then(Weak::upgrade)
    }

    /// Remove a token. Returns true if it was still registered.
    pub fn unregister(&self, token: ContextToken) -> bool {
        self.entries.lock().remove(&token.0).is_some()
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if no tokens are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
