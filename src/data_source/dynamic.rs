use super::{EndpointDataSource, EndpointList};
use crate::change_token::{ChangeToken, ChangeTokenSource};
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Replaceable endpoint list.
///
/// Each replacement publishes the new list, installs a fresh change token and
/// then fires the previous one, so callbacks that re-register see the new
/// token.
pub struct DynamicEndpointDataSource {
    endpoints: ArcSwap<Vec<Arc<Endpoint>>>,
    token: Mutex<ChangeTokenSource>,
}

impl DynamicEndpointDataSource {
    #[must_use]
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            endpoints: ArcSwap::from_pointee(endpoints.into_iter().map(Arc::new).collect()),
            token: Mutex::new(ChangeTokenSource::new()),
        }
    }

    /// Replace every endpoint.
    pub fn set_endpoints(&self, endpoints: impl IntoIterator<Item = Endpoint>) {
        let endpoints: Vec<Arc<Endpoint>> = endpoints.into_iter().map(Arc::new).collect();
        debug!(endpoints_count = endpoints.len(), "Replacing dynamic endpoints");
        self.endpoints.store(Arc::new(endpoints));
        self.notify();
    }

    pub fn add_endpoint(&self, endpoint: Endpoint) {
        let endpoint = Arc::new(endpoint);
        self.endpoints.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&endpoint));
            next
        });
        self.notify();
    }

    fn notify(&self) {
        let previous = std::mem::take(&mut *self.token.lock());
        previous.fire();
    }
}

impl std::fmt::Debug for DynamicEndpointDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicEndpointDataSource")
            .field("endpoints", &self.endpoints.load().len())
            .finish()
    }
}

impl EndpointDataSource for DynamicEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, RouteError> {
        Ok(self.endpoints.load_full())
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        self.token.lock().token()
    }
}
