use super::metadata::{
    EndpointMetadataCollection, EndpointNameMetadata, Metadata, RouteNameMetadata,
};
use crate::error::RouteError;
use crate::pattern::{self, RoutePattern};
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique endpoint identity.
///
/// Every built endpoint gets a fresh id, including endpoints re-derived by a
/// route group, so per-endpoint caches never confuse two builds.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct EndpointId(u64);

impl EndpointId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for EndpointId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Pattern and order of a routable endpoint.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub pattern: Arc<RoutePattern>,
    /// Lower sorts first
    pub order: i32,
}

/// A routable destination.
///
/// Endpoints built by [`RouteEndpointBuilder`] carry a [`RouteInfo`]; custom
/// endpoints created with [`Endpoint::new`] do not, and are ignored by the
/// request matcher and by link generation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    id: EndpointId,
    display_name: Option<String>,
    metadata: EndpointMetadataCollection,
    handler_name: Option<Arc<str>>,
    route: Option<RouteInfo>,
}

impl Endpoint {
    /// Create an endpoint without a route pattern.
    #[must_use]
    pub fn new(
        display_name: Option<String>,
        metadata: EndpointMetadataCollection,
        handler_name: Option<Arc<str>>,
    ) -> Self {
        Self {
            id: EndpointId::next(),
            display_name,
            metadata,
            handler_name,
            route: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> EndpointId {
        self.id
    }

    /// The display name, falling back to the raw template, then to the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.display_name, &self.route) {
            (Some(name), _) => name.clone(),
            (None, Some(route)) => route.pattern.raw_text().to_string(),
            (None, None) => self.id.to_string(),
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &EndpointMetadataCollection {
        &self.metadata
    }

    /// Opaque name of the handler invoked on a match.
    #[must_use]
    pub fn handler_name(&self) -> Option<&str> {
        self.handler_name.as_deref()
    }

    #[must_use]
    pub fn route(&self) -> Option<&RouteInfo> {
        self.route.as_ref()
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&Arc<RoutePattern>> {
        self.route.as_ref().map(|r| &r.pattern)
    }

    #[must_use]
    pub fn order(&self) -> i32 {
        self.route.as_ref().map_or(0, |r| r.order)
    }

    /// Name used for link generation by name: the endpoint name when
    /// present, otherwise the route name.
    #[must_use]
    pub fn link_name(&self) -> Option<&str> {
        self.metadata
            .get::<EndpointNameMetadata>()
            .map(|m| m.0.as_str())
            .or_else(|| self.metadata.get::<RouteNameMetadata>().map(|m| m.0.as_str()))
    }
}

/// Mutation applied to a builder before it is built. Group conventions run
/// before entry-specific ones.
pub type Convention = Arc<dyn Fn(&mut RouteEndpointBuilder) + Send + Sync>;

/// Mutable description of a route endpoint.
#[derive(Debug, Clone)]
pub struct RouteEndpointBuilder {
    pub pattern: RoutePattern,
    pub order: i32,
    pub display_name: Option<String>,
    pub handler_name: Option<Arc<str>>,
    pub metadata: Vec<Arc<dyn Metadata>>,
}

impl RouteEndpointBuilder {
    #[must_use]
    pub fn new(pattern: RoutePattern, order: i32) -> Self {
        Self {
            pattern,
            order,
            display_name: None,
            handler_name: None,
            metadata: Vec::new(),
        }
    }

    /// Parse `template` and start a builder for it.
    ///
    /// # Errors
    ///
    /// Any parse error from [`pattern::parse`].
    pub fn parse(template: &str, order: i32) -> Result<Self, RouteError> {
        Ok(Self::new(pattern::parse(template)?, order))
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn handler(mut self, name: impl Into<Arc<str>>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, item: impl Metadata) -> Self {
        self.metadata.push(Arc::new(item));
        self
    }

    pub fn add_metadata(&mut self, item: impl Metadata) {
        self.metadata.push(Arc::new(item));
    }

    pub fn apply(&mut self, conventions: &[Convention]) {
        for convention in conventions {
            convention(self);
        }
    }

    #[must_use]
    pub fn build(self) -> Endpoint {
        Endpoint {
            id: EndpointId::next(),
            display_name: self.display_name,
            metadata: EndpointMetadataCollection::new(self.metadata),
            handler_name: self.handler_name,
            route: Some(RouteInfo {
                pattern: Arc::new(self.pattern),
                order: self.order,
            }),
        }
    }

    /// Rebuild a builder from an existing route endpoint, keeping its metadata.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnsupportedEndpoint`] when `endpoint` has no route pattern.
    pub fn from_endpoint(endpoint: &Endpoint) -> Result<Self, RouteError> {
        let route = endpoint
            .route
            .as_ref()
            .ok_or_else(|| RouteError::UnsupportedEndpoint {
                display_name: endpoint.display_name(),
            })?;
        Ok(Self {
            pattern: (*route.pattern).clone(),
            order: route.order,
            display_name: endpoint.display_name.clone(),
            handler_name: endpoint.handler_name.clone(),
            metadata: endpoint.metadata.iter().cloned().collect(),
        })
    }
}
