//! # Router Module
//!
//! Request matching: given the endpoints of an [`EndpointDataSource`], pick
//! the single best endpoint for a request and extract its route values.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Building a decision tree from the current endpoint snapshot
//! - Rebuilding it when the data source's change token fires
//! - Matching requests, including constraint checks and endpoint policies
//!   (HTTP method, host, header)
//! - Recording the selected endpoint and values on the [`RequestContext`]
//!
//! ## Architecture
//!
//! 1. **Compilation**: endpoints are sorted by (order, inbound precedence,
//!    registration order) and indexed in a tree keyed on literal segments.
//!    The tree lives in a [`DataSourceDependentCache`](crate::cache::DataSourceDependentCache)
//!    and is swapped atomically on rebuild.
//!
//! 2. **Matching**: a request path walks one branch of the tree and ends at
//!    a priority-ordered candidate list. Each candidate is confirmed by its
//!    template matcher, constraints and policies; the first success wins.
//!
//! ## Example
//!
//! ```rust
//! use brrtrouting::constraints::ConstraintResolver;
//! use brrtrouting::data_source::DefaultEndpointDataSource;
//! use brrtrouting::endpoint::RouteEndpointBuilder;
//! use brrtrouting::router::Router;
//! use brrtrouting::runtime_config::RoutingOptions;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let source = DefaultEndpointDataSource::new([
//!     RouteEndpointBuilder::parse("/users/{id:int}", 0).unwrap().build(),
//! ]);
//! let router = Router::new(
//!     Arc::new(source),
//!     ConstraintResolver::default(),
//!     RoutingOptions::default(),
//! );
//!
//! let m = router.match_path(Method::GET, "/users/42").unwrap().unwrap();
//! assert_eq!(m.get("id").as_deref(), Some("42"));
//! assert!(router.match_path(Method::GET, "/users/abc").unwrap().is_none());
//! ```
//!
//! [`EndpointDataSource`]: crate::data_source::EndpointDataSource

mod core;
mod dfa;
mod policy;

pub use core::{default_policies, RequestContext, RouteMatch, Router};
pub use dfa::DfaMatcher;
pub use policy::{HeaderPolicy, HostPolicy, HttpMethodPolicy, MatcherPolicy};
