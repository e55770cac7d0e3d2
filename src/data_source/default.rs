use super::{EndpointDataSource, EndpointList};
use crate::change_token::{ChangeToken, NullChangeToken};
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use std::sync::Arc;

/// Fixed endpoint list. Every read returns the same `Arc`.
#[derive(Debug, Clone, Default)]
pub struct DefaultEndpointDataSource {
    endpoints: EndpointList,
}

impl DefaultEndpointDataSource {
    #[must_use]
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            endpoints: Arc::new(endpoints.into_iter().map(Arc::new).collect()),
        }
    }

    #[must_use]
    pub fn from_shared(endpoints: Vec<Arc<Endpoint>>) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
        }
    }
}

impl EndpointDataSource for DefaultEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, RouteError> {
        Ok(Arc::clone(&self.endpoints))
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        Arc::new(NullChangeToken)
    }
}
