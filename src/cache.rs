//! # Data-Source-Dependent Cache
//!
//! [`DataSourceDependentCache`] holds a value derived from a data source's
//! endpoints (the request matcher, the link index) and keeps it current:
//!
//! - The first [`ensure_initialized`](DataSourceDependentCache::ensure_initialized)
//!   builds the value under a lock, so at most one build is in flight.
//! - The build subscribes to the data source's change token. When it fires,
//!   the cache rebuilds synchronously, swaps the new value in atomically and
//!   subscribes to the new token.
//! - Readers load the current value without locking. During a rebuild they
//!   keep seeing the previous value until the swap.
//! - A failed rebuild clears the value, so the next `ensure_initialized`
//!   retries and reports the error to its caller.
//! - [`dispose`](DataSourceDependentCache::dispose) unregisters the callback;
//!   a change that races with disposal does not re-register.
//!
//! The lock is re-entrant because registering on a token that already fired
//! runs the callback on the registering thread.

use crate::change_token::ChangeTokenRegistration;
use crate::data_source::EndpointDataSource;
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use arc_swap::ArcSwapOption;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error};

type Factory<T> = dyn Fn(&[Arc<Endpoint>]) -> Result<T, RouteError> + Send + Sync;

#[derive(Default)]
struct CacheState {
    registration: Option<ChangeTokenRegistration>,
    generation: u64,
}

struct CacheInner<T> {
    data_source: Arc<dyn EndpointDataSource>,
    factory: Box<Factory<T>>,
    value: ArcSwapOption<T>,
    lock: ReentrantMutex<RefCell<CacheState>>,
    disposed: AtomicBool,
}

impl<T: Send + Sync + 'static> CacheInner<T> {
    /// Build a new value and subscribe to the token it was built against.
    /// Must be called with `lock` held.
    fn refresh(self: &Arc<Self>, state: &RefCell<CacheState>) -> Result<Arc<T>, RouteError> {
        let (generation, stale) = {
            let mut state = state.borrow_mut();
            state.generation += 1;
            (state.generation, state.registration.take())
        };
        drop(stale);

        // Take the token before reading endpoints so a change made during the
        // build is not missed.
        let token = self.data_source.change_token();
        let value = match self
            .data_source
            .endpoints()
            .and_then(|endpoints| (self.factory)(endpoints.as_slice()))
        {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.value.store(None);
                return Err(e);
            }
        };
        self.value.store(Some(Arc::clone(&value)));

        let weak: Weak<Self> = Arc::downgrade(self);
        let registration = token.register(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_change();
            }
        }));

        let unused = {
            let mut state = state.borrow_mut();
            if state.generation == generation && !self.disposed.load(Ordering::Acquire) {
                state.registration = Some(registration);
                None
            } else {
                // A nested refresh already ran and subscribed.
                Some(registration)
            }
        };
        drop(unused);

        Ok(self.value.load_full().unwrap_or(value))
    }

    fn on_change(self: &Arc<Self>) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let guard = self.lock.lock();
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        debug!("Endpoint data source changed, rebuilding cached value");
        if let Err(e) = self.refresh(&guard) {
            error!(error = %e, "Failed to rebuild cached routing state after endpoint change");
        }
    }
}

/// Value derived from a data source's endpoints, rebuilt when they change.
pub struct DataSourceDependentCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T: Send + Sync + 'static> DataSourceDependentCache<T> {
    pub fn new(
        data_source: Arc<dyn EndpointDataSource>,
        factory: impl Fn(&[Arc<Endpoint>]) -> Result<T, RouteError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                data_source,
                factory: Box::new(factory),
                value: ArcSwapOption::empty(),
                lock: ReentrantMutex::new(RefCell::new(CacheState::default())),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The current value, building it on first use.
    ///
    /// # Errors
    ///
    /// Whatever the data source or the factory reports. The error is not
    /// cached; the next call tries again.
    pub fn ensure_initialized(&self) -> Result<Arc<T>, RouteError> {
        if let Some(value) = self.inner.value.load_full() {
            return Ok(value);
        }
        let guard = self.inner.lock.lock();
        if let Some(value) = self.inner.value.load_full() {
            return Ok(value);
        }
        self.inner.refresh(&guard)
    }

    /// The current value without building it.
    #[must_use]
    pub fn value(&self) -> Option<Arc<T>> {
        self.inner.value.load_full()
    }

    #[must_use]
    pub fn data_source(&self) -> &Arc<dyn EndpointDataSource> {
        &self.inner.data_source
    }

    /// Stop listening for changes.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        let guard = self.inner.lock.lock();
        let registration = guard.borrow_mut().registration.take();
        drop(guard);
        drop(registration);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl<T> std::fmt::Debug for DataSourceDependentCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceDependentCache")
            .field("initialized", &self.inner.value.load().is_some())
            .field("disposed", &self.inner.disposed.load(Ordering::Acquire))
            .finish()
    }
}
