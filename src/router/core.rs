//! Router core - request matching over the cached decision tree.

use super::dfa::DfaMatcher;
use super::policy::{HeaderPolicy, HostPolicy, HttpMethodPolicy, MatcherPolicy};
use crate::cache::DataSourceDependentCache;
use crate::constraints::ConstraintResolver;
use crate::data_source::EndpointDataSource;
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use crate::runtime_config::RoutingOptions;
use crate::template::split_path;
use crate::values::RouteValueDictionary;
use http::header::{HeaderName, HeaderValue, HOST};
use http::{HeaderMap, Method};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The policies every [`Router`] starts with: HTTP method, host and header.
#[must_use]
pub fn default_policies() -> Vec<Arc<dyn MatcherPolicy>> {
    vec![
        Arc::new(HttpMethodPolicy),
        Arc::new(HostPolicy),
        Arc::new(HeaderPolicy),
    ]
}

/// Per-request state read by the matcher and written on a successful match.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Request path, without query string
    pub path: String,
    /// `Host` header value, including any port
    pub host: Option<String>,
    pub headers: HeaderMap,
    /// Route values of the selected endpoint
    pub route_values: RouteValueDictionary,
    /// The selected endpoint, if any
    pub endpoint: Option<Arc<Endpoint>>,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            host: None,
            headers: HeaderMap::new(),
            route_values: RouteValueDictionary::new(),
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a header. Names or values that are not valid HTTP are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Build a context from an HTTP request. The host comes from the `Host`
    /// header, falling back to the URI authority.
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        let host = request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()));
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            host,
            headers: request.headers().clone(),
            route_values: RouteValueDictionary::new(),
            endpoint: None,
        }
    }
}

/// Result of successfully matching a request to an endpoint
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub endpoint: Arc<Endpoint>,
    /// Captured parameters plus pattern defaults
    pub values: RouteValueDictionary,
}

impl RouteMatch {
    /// Route value by name, rendered as text
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.values.get_str(name)
    }

    #[must_use]
    pub fn handler_name(&self) -> Option<&str> {
        self.endpoint.handler_name()
    }

    /// Raw template of the matched endpoint
    #[must_use]
    pub fn route_pattern(&self) -> &str {
        self.endpoint.pattern().map_or("", |p| p.raw_text())
    }
}

/// Matches requests against the endpoints of a data source.
///
/// The decision tree is built on first use and rebuilt whenever the data
/// source's change token fires. Matching reads an immutable snapshot, so a
/// rebuild never blocks in-flight requests.
pub struct Router {
    matcher: DataSourceDependentCache<DfaMatcher>,
    options: RoutingOptions,
    policies: Vec<Arc<dyn MatcherPolicy>>,
}

impl Router {
    /// Create a router over `data_source`.
    ///
    /// # Arguments
    ///
    /// * `data_source` - Endpoint provider; its change token drives rebuilds
    /// * `resolver` - Resolves inline constraints of every pattern
    /// * `options` - Global routing options (slow-match threshold)
    #[must_use]
    pub fn new(
        data_source: Arc<dyn EndpointDataSource>,
        resolver: ConstraintResolver,
        options: RoutingOptions,
    ) -> Self {
        let matcher = DataSourceDependentCache::new(data_source, move |endpoints| {
            let matcher = DfaMatcher::build(endpoints, &resolver)?;
            if matcher.is_empty() {
                info!(endpoints_count = 0, "Routing table loaded with no routes");
            } else {
                let routes_summary: Vec<String> =
                    matcher.endpoints().take(10).map(|e| e.display_name()).collect();
                info!(
                    endpoints_count = matcher.len(),
                    node_count = matcher.node_count(),
                    routes_summary = ?routes_summary,
                    routing_algorithm = "decision_tree",
                    "Routing table loaded"
                );
            }
            Ok(matcher)
        });
        Self {
            matcher,
            options,
            policies: default_policies(),
        }
    }

    /// Add a policy after the default ones.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn MatcherPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    #[must_use]
    pub fn options(&self) -> &RoutingOptions {
        &self.options
    }

    #[must_use]
    pub fn data_source(&self) -> &Arc<dyn EndpointDataSource> {
        self.matcher.data_source()
    }

    /// Match a request and record the result on the context.
    ///
    /// Candidates are tried in ascending order, then ascending inbound
    /// precedence, then registration order. The first one whose pattern,
    /// constraints and policies all accept the request wins.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RouteMatch))` - the selected endpoint; `context.endpoint`
    ///   and `context.route_values` are set
    /// * `Ok(None)` - no endpoint matched; the context is left untouched
    ///
    /// # Errors
    ///
    /// Only when the matcher cannot be built from the current endpoints.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut ctx = RequestContext::new(Method::GET, "/users/123");
    /// if let Some(m) = router.route(&mut ctx)? {
    ///     println!("Handler: {:?}", m.handler_name());
    ///     println!("User ID: {:?}", m.get("id"));
    /// }
    /// ```
    pub fn route(&self, context: &mut RequestContext) -> Result<Option<RouteMatch>, RouteError> {
        debug!(
            method = %context.method,
            path = %context.path,
            algorithm = "decision_tree",
            "Route match attempt"
        );

        let matcher = self.matcher.ensure_initialized()?;
        let match_start = Instant::now();
        let segments = split_path(&context.path);
        let result = matcher.select(&segments, context, &self.policies);
        let match_duration = match_start.elapsed();

        let Some((endpoint, values)) = result else {
            debug!(
                method = %context.method,
                path = %context.path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            );
            return Ok(None);
        };

        let threshold = Duration::from_micros(self.options.slow_match_threshold_us);
        let display_name = endpoint.display_name();
        if match_duration > threshold {
            warn!(
                method = %context.method,
                path = %context.path,
                endpoint = %display_name,
                route_values = ?values,
                duration_us = match_duration.as_micros(),
                threshold_us = self.options.slow_match_threshold_us,
                "Slow route matching detected"
            );
        } else {
            info!(
                method = %context.method,
                path = %context.path,
                route_pattern = %endpoint.pattern().map_or("", |p| p.raw_text()),
                endpoint = %display_name,
                endpoint_id = %endpoint.id(),
                route_values = ?values,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        context.endpoint = Some(Arc::clone(&endpoint));
        context.route_values = values.clone();
        Ok(Some(RouteMatch { endpoint, values }))
    }

    /// Match a `method` + `path` pair without headers or host.
    ///
    /// # Errors
    ///
    /// See [`route`](Self::route).
    pub fn match_path(&self, method: Method, path: &str) -> Result<Option<RouteMatch>, RouteError> {
        let mut context = RequestContext::new(method, path);
        self.route(&mut context)
    }

    /// Same result as [`route`](Self::route) but trying every candidate in
    /// priority order instead of walking the tree.
    #[cfg(test)]
    pub(crate) fn route_linear(
        &self,
        context: &RequestContext,
    ) -> Result<Option<RouteMatch>, RouteError> {
        let matcher = self.matcher.ensure_initialized()?;
        let segments = split_path(&context.path);
        Ok(matcher
            .select_linear(&segments, context, &self.policies)
            .map(|(endpoint, values)| RouteMatch { endpoint, values }))
    }

    /// Matchable endpoints in the order they are tried.
    ///
    /// # Errors
    ///
    /// When the matcher cannot be built.
    pub fn endpoints_in_order(&self) -> Result<Vec<Arc<Endpoint>>, RouteError> {
        let matcher = self.matcher.ensure_initialized()?;
        Ok(matcher.endpoints().cloned().collect())
    }

    /// Print the routing table to stdout in match order.
    ///
    /// # Errors
    ///
    /// When the matcher cannot be built.
    pub fn dump_routes(&self) -> Result<(), RouteError> {
        let endpoints = self.endpoints_in_order()?;
        println!("[routes] count={}", endpoints.len());
        for endpoint in &endpoints {
            println!(
                "[route] order={} {} -> {}",
                endpoint.order(),
                endpoint.pattern().map_or("", |p| p.raw_text()),
                endpoint.handler_name().unwrap_or("-")
            );
        }
        Ok(())
    }

    /// Stop following data source changes. The current matcher stays usable.
    pub fn dispose(&self) {
        self.matcher.dispose();
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policies: Vec<&str> = self.policies.iter().map(|p| p.name()).collect();
        f.debug_struct("Router")
            .field("matcher", &self.matcher)
            .field("options", &self.options)
            .field("policies", &policies)
            .finish()
    }
}
