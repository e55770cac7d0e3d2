//! # Endpoint Data Sources
//!
//! A data source provides the current endpoint list plus a change token that
//! fires when the list is replaced. Everything derived from endpoints (the
//! request matcher, link indexes) is cached against a data source through
//! [`DataSourceDependentCache`](crate::cache::DataSourceDependentCache).
//!
//! ## Variants
//!
//! | Source | Endpoints | Change token |
//! |--------|-----------|--------------|
//! | [`DefaultEndpointDataSource`] | fixed list, same `Arc` on every read | never fires |
//! | [`DynamicEndpointDataSource`] | replaceable list | fires on every replacement |
//! | [`CompositeEndpointDataSource`] | concatenation of children | fires when a child fires or a child is added |
//! | [`RouteGroupBuilder`] | children re-derived under a prefix with group conventions | fires when a child fires or the group is mutated |
//!
//! ## Groups
//!
//! A group combines its prefix with each child pattern
//! ([`pattern::combine`](crate::pattern::combine)) and rebuilds every child
//! endpoint: group conventions run first, the endpoint's own metadata is
//! appended after them (so it wins single-value lookups), and "finally"
//! conventions run last. Groups nest; the outer prefix and conventions apply
//! before the inner ones.

mod composite;
mod default;
mod dynamic;
mod group;

use crate::change_token::ChangeToken;
use crate::endpoint::{Convention, Endpoint, RouteEndpointBuilder};
use crate::error::RouteError;
use crate::pattern::{self, RoutePattern};
use std::sync::Arc;

pub use composite::CompositeEndpointDataSource;
pub use default::DefaultEndpointDataSource;
pub use dynamic::DynamicEndpointDataSource;
pub use group::RouteGroupBuilder;

/// Endpoint list shared between a data source and its readers.
pub type EndpointList = Arc<Vec<Arc<Endpoint>>>;

/// Prefix and conventions handed down from enclosing route groups.
#[derive(Clone)]
pub struct RouteGroupContext {
    pub prefix: RoutePattern,
    /// Applied before the endpoint's own metadata
    pub conventions: Vec<Convention>,
    /// Applied after the endpoint's own metadata
    pub finally_conventions: Vec<Convention>,
}

impl std::fmt::Debug for RouteGroupContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGroupContext")
            .field("prefix", &self.prefix.raw_text())
            .field("conventions", &self.conventions.len())
            .field("finally_conventions", &self.finally_conventions.len())
            .finish()
    }
}

/// Provider of endpoints and change notifications.
pub trait EndpointDataSource: Send + Sync {
    /// The current endpoint list.
    ///
    /// # Errors
    ///
    /// Configuration errors from re-deriving grouped endpoints.
    fn endpoints(&self) -> Result<EndpointList, RouteError>;

    /// Token that fires when [`endpoints`](Self::endpoints) would return a
    /// different list.
    fn change_token(&self) -> Arc<dyn ChangeToken>;

    /// Endpoints re-derived for an enclosing route group.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnsupportedEndpoint`] for endpoints without a route
    /// pattern, and any error from combining the patterns.
    fn grouped_endpoints(
        &self,
        context: &RouteGroupContext,
    ) -> Result<Vec<Arc<Endpoint>>, RouteError> {
        let endpoints = self.endpoints()?;
        endpoints
            .iter()
            .map(|endpoint| regroup(endpoint, context).map(Arc::new))
            .collect()
    }
}

/// Rebuild `endpoint` under the group's prefix and conventions.
pub(crate) fn regroup(
    endpoint: &Endpoint,
    context: &RouteGroupContext,
) -> Result<Endpoint, RouteError> {
    let original = RouteEndpointBuilder::from_endpoint(endpoint)?;
    let pattern = pattern::combine(Some(&context.prefix), &original.pattern)?;

    let mut builder = RouteEndpointBuilder::new(pattern, original.order);
    builder.display_name = original.display_name;
    builder.handler_name = original.handler_name;
    builder.apply(&context.conventions);
    builder.metadata.extend(original.metadata);
    builder.apply(&context.finally_conventions);
    Ok(builder.build())
}
