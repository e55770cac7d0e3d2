use http::Method;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Anything attachable to an endpoint.
///
/// Implemented for every `Debug + Send + Sync + 'static` type, so plain
/// structs work as metadata without ceremony.
pub trait Metadata: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Metadata for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered, append-only list of typed metadata.
///
/// Single-value lookups ([`get`](Self::get)) return the **last** item of the
/// requested type, so entry-specific metadata added after group metadata
/// wins. [`ordered`](Self::ordered) returns every item in registration order.
#[derive(Clone, Default)]
pub struct EndpointMetadataCollection {
    items: Arc<[Arc<dyn Metadata>]>,
}

impl EndpointMetadataCollection {
    #[must_use]
    pub fn new(items: Vec<Arc<dyn Metadata>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    #[must_use]
    pub fn get<T: Metadata>(&self) -> Option<&T> {
        self.items
            .iter()
            .rev()
            .find_map(|item| (**item).as_any().downcast_ref::<T>())
    }

    pub fn ordered<T: Metadata>(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .filter_map(|item| (**item).as_any().downcast_ref::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Metadata>> {
        self.items.iter()
    }
}

impl fmt::Debug for EndpointMetadataCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl FromIterator<Arc<dyn Metadata>> for EndpointMetadataCollection {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Metadata>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// HTTP methods an endpoint accepts. An empty list accepts any method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodMetadata {
    pub methods: Vec<Method>,
    /// Match CORS preflight requests against the requested method
    pub accept_cors_preflight: bool,
}

impl HttpMethodMetadata {
    #[must_use]
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            accept_cors_preflight: false,
        }
    }

    #[must_use]
    pub fn with_cors_preflight(mut self, accept: bool) -> Self {
        self.accept_cors_preflight = accept;
        self
    }
}

/// Hosts an endpoint accepts: `example.com`, `*.example.com`,
/// `example.com:8080` or `*:8080`. An empty list accepts any host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMetadata {
    pub hosts: Vec<String>,
}

impl HostMetadata {
    #[must_use]
    pub fn new<S: Into<String>>(hosts: impl IntoIterator<Item = S>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMatchMode {
    #[default]
    Exact,
    Prefix,
}

/// Require a request header. With no values, presence is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMetadata {
    pub name: String,
    pub values: Vec<String>,
    pub mode: HeaderMatchMode,
    pub case_sensitive: bool,
}

impl HeaderMetadata {
    #[must_use]
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            mode: HeaderMatchMode::Exact,
            case_sensitive: false,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: HeaderMatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }
}

/// Route name used for link generation by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNameMetadata(pub String);

/// Endpoint name; takes priority over [`RouteNameMetadata`] when both exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointNameMetadata(pub String);

/// Exclude the endpoint from link generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressLinkGenerationMetadata(pub bool);

/// Exclude the endpoint from request matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressMatchingMetadata(pub bool);

/// Marks a catch-everything endpoint; link generation tries it last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackMetadata;
