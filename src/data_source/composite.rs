use super::{EndpointDataSource, EndpointList, RouteGroupContext};
use crate::change_token::{ChangeToken, ChangeTokenRegistration, ChangeTokenSource};
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Default)]
struct CompositeState {
    endpoints: Option<EndpointList>,
    token: ChangeTokenSource,
    subscriptions: Vec<ChangeTokenRegistration>,
    generation: u64,
}

struct CompositeInner {
    sources: RwLock<Vec<Arc<dyn EndpointDataSource>>>,
    state: Mutex<CompositeState>,
}

impl CompositeInner {
    /// Drop the cached list, resubscribe to every child's current token and
    /// fire our own token.
    fn handle_change(self: &Arc<Self>) {
        let (generation, stale, previous) = {
            let mut state = self.state.lock();
            state.endpoints = None;
            state.generation += 1;
            let stale = std::mem::take(&mut state.subscriptions);
            let previous = std::mem::take(&mut state.token);
            (state.generation, stale, previous)
        };
        drop(stale);

        let subscriptions = self.subscribe();
        {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.subscriptions = subscriptions;
            }
        }

        debug!(generation, "Composite endpoint data source changed");
        previous.fire();
    }

    fn subscribe(self: &Arc<Self>) -> Vec<ChangeTokenRegistration> {
        let tokens: Vec<Arc<dyn ChangeToken>> =
            self.sources.read().iter().map(|s| s.change_token()).collect();
        tokens
            .into_iter()
            .map(|token| {
                let weak: Weak<Self> = Arc::downgrade(self);
                token.register(Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_change();
                    }
                }))
            })
            .collect()
    }
}

/// Concatenation of several data sources.
///
/// The composite keeps its own change token. It fires when any child's token
/// fires or when a child is added; at that point every child subscription is
/// rebuilt against the children's current tokens.
#[derive(Clone)]
pub struct CompositeEndpointDataSource {
    inner: Arc<CompositeInner>,
}

impl CompositeEndpointDataSource {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn EndpointDataSource>>) -> Self {
        let inner = Arc::new(CompositeInner {
            sources: RwLock::new(sources),
            state: Mutex::new(CompositeState::default()),
        });
        let subscriptions = inner.subscribe();
        inner.state.lock().subscriptions.extend(subscriptions);
        Self { inner }
    }

    /// Add a child source and fire the change token.
    pub fn add_source(&self, source: Arc<dyn EndpointDataSource>) {
        self.inner.sources.write().push(source);
        self.inner.handle_change();
    }

    #[must_use]
    pub fn sources(&self) -> Vec<Arc<dyn EndpointDataSource>> {
        self.inner.sources.read().clone()
    }
}

impl std::fmt::Debug for CompositeEndpointDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeEndpointDataSource")
            .field("sources", &self.inner.sources.read().len())
            .finish()
    }
}

impl EndpointDataSource for CompositeEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, RouteError> {
        let mut state = self.inner.state.lock();
        if let Some(endpoints) = &state.endpoints {
            return Ok(Arc::clone(endpoints));
        }
        let mut all: Vec<Arc<Endpoint>> = Vec::new();
        for source in self.inner.sources.read().iter() {
            all.extend(source.endpoints()?.iter().cloned());
        }
        let all = Arc::new(all);
        state.endpoints = Some(Arc::clone(&all));
        Ok(all)
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        self.inner.state.lock().token.token()
    }

    fn grouped_endpoints(
        &self,
        context: &RouteGroupContext,
    ) -> Result<Vec<Arc<Endpoint>>, RouteError> {
        let mut all = Vec::new();
        for source in self.inner.sources.read().iter() {
            all.extend(source.grouped_endpoints(context)?);
        }
        Ok(all)
    }
}
