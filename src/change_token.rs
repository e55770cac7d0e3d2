//! # Change Tokens
//!
//! A change token is a one-shot invalidation signal. Data sources hand one
//! out with their endpoint list; once it fires, anything derived from that
//! list is stale and must be recomputed against a fresh token.
//!
//! Callbacks registered on a token run synchronously on the thread that
//! fires it. Registering on a token that already fired runs the callback
//! immediately. Dropping a [`ChangeTokenRegistration`] unregisters its
//! callback.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked when a token fires.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

pub trait ChangeToken: Send + Sync + fmt::Debug {
    fn has_changed(&self) -> bool;

    /// Register `callback` to run when the token fires.
    fn register(&self, callback: ChangeCallback) -> ChangeTokenRegistration;
}

/// Handle for a registered callback. Dropping it unregisters the callback.
#[must_use = "dropping the registration unregisters the callback"]
pub struct ChangeTokenRegistration {
    unregister: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ChangeTokenRegistration {
    /// A registration with nothing to undo.
    pub fn empty() -> Self {
        Self { unregister: None }
    }

    fn new(unregister: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unregister: Some(Box::new(unregister)),
        }
    }

    fn from_many(registrations: Vec<ChangeTokenRegistration>) -> Self {
        Self::new(move || drop(registrations))
    }

    pub fn dispose(mut self) {
        self.unregister_now();
    }

    fn unregister_now(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl Drop for ChangeTokenRegistration {
    fn drop(&mut self) {
        self.unregister_now();
    }
}

impl fmt::Debug for ChangeTokenRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTokenRegistration")
            .field("active", &self.unregister.is_some())
            .finish()
    }
}

#[derive(Default)]
struct TokenState {
    fired: AtomicBool,
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, ChangeCallback)>>,
}

impl TokenState {
    fn fire(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        // Run outside the lock: callbacks may register on other tokens or
        // fire this one again.
        let callbacks = std::mem::take(&mut *self.callbacks.lock());
        for (_, callback) in callbacks {
            callback();
        }
    }
}

/// Token fired by its [`ChangeTokenSource`].
#[derive(Clone)]
pub struct CancellationChangeToken {
    state: Arc<TokenState>,
}

impl ChangeToken for CancellationChangeToken {
    fn has_changed(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }

    fn register(&self, callback: ChangeCallback) -> ChangeTokenRegistration {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut callbacks = self.state.callbacks.lock();
            if !self.state.fired.load(Ordering::Acquire) {
                callbacks.push((id, callback));
                let weak: Weak<TokenState> = Arc::downgrade(&self.state);
                return ChangeTokenRegistration::new(move || {
                    if let Some(state) = weak.upgrade() {
                        state.callbacks.lock().retain(|(other, _)| *other != id);
                    }
                });
            }
        }
        callback();
        ChangeTokenRegistration::empty()
    }
}

impl fmt::Debug for CancellationChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationChangeToken")
            .field("has_changed", &self.has_changed())
            .finish()
    }
}

/// Owner side of a [`CancellationChangeToken`].
#[derive(Clone, Default)]
pub struct ChangeTokenSource {
    state: Arc<TokenState>,
}

impl ChangeTokenSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token(&self) -> Arc<dyn ChangeToken> {
        Arc::new(CancellationChangeToken {
            state: Arc::clone(&self.state),
        })
    }

    /// Fire the token. Only the first call runs callbacks.
    pub fn fire(&self) {
        self.state.fire();
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ChangeTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTokenSource")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// Token that never fires, for sources that never change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChangeToken;

impl ChangeToken for NullChangeToken {
    fn has_changed(&self) -> bool {
        false
    }

    fn register(&self, _callback: ChangeCallback) -> ChangeTokenRegistration {
        ChangeTokenRegistration::empty()
    }
}

/// Fires when any of its children fires. A registered callback runs at most once.
#[derive(Debug, Clone)]
pub struct CompositeChangeToken {
    tokens: Vec<Arc<dyn ChangeToken>>,
}

impl CompositeChangeToken {
    #[must_use]
    pub fn new(tokens: Vec<Arc<dyn ChangeToken>>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Arc<dyn ChangeToken>] {
        &self.tokens
    }
}

impl ChangeToken for CompositeChangeToken {
    fn has_changed(&self) -> bool {
        self.tokens.iter().any(|t| t.has_changed())
    }

    fn register(&self, callback: ChangeCallback) -> ChangeTokenRegistration {
        let once = Arc::new(AtomicBool::new(false));
        let registrations = self
            .tokens
            .iter()
            .map(|token| {
                let once = Arc::clone(&once);
                let callback = Arc::clone(&callback);
                token.register(Arc::new(move || {
                    if !once.swap(true, Ordering::AcqRel) {
                        callback();
                    }
                }))
            })
            .collect();
        ChangeTokenRegistration::from_many(registrations)
    }
}
