//! # brrtrouting
//!
//! **brrtrouting** is an endpoint routing engine: it parses route templates,
//! matches request paths to endpoints through a precomputed decision tree, and
//! generates (or parses) URLs for endpoints from route values.
//!
//! ## Overview
//!
//! Endpoints are described once and used in both directions:
//!
//! - **Inbound** - a [`router::Router`] selects the endpoint for a request
//!   (method, host, headers, path) and extracts its route values.
//! - **Outbound** - a [`linking::LinkGenerator`] produces a path or absolute
//!   URI for an address (endpoint name, route values, or a custom address),
//!   and a [`linking::LinkParser`] maps a path back to values.
//!
//! Both sides read from an [`data_source::EndpointDataSource`] and cache their
//! derived state in a [`cache::DataSourceDependentCache`], so replacing the
//! endpoints of a dynamic source (for example from [`hot_reload`]) rebuilds
//! the matcher and link index on the next use.
//!
//! ## Architecture
//!
//! - **[`values`]** - Route values and the case-insensitive value dictionary
//! - **[`pattern`]** - Template parsing, combination and precedence
//! - **[`constraints`]** - Inline constraint resolution and evaluation
//! - **[`template`]** - Per-pattern path matching and URL binding
//! - **[`endpoint`]** - Endpoints, typed metadata and the endpoint builder
//! - **[`change_token`]** - Change notification primitives
//! - **[`data_source`]** - Default, dynamic, composite and group endpoint sources
//! - **[`cache`]** - Values derived from a data source, rebuilt on change
//! - **[`router`]** - Decision-tree matcher and request policies
//! - **[`linking`]** - Link generation, parsing and address schemes
//! - **[`manifest`]** - TOML/JSON endpoint manifests
//! - **[`hot_reload`]** - Manifest watching
//! - **[`runtime_config`]** - Routing and link options
//! - **[`cli`]** - Command-line inspection tools
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant Router
//!     participant Cache as DataSourceDependentCache
//!     participant Source as EndpointDataSource
//!     participant Dfa as DfaMatcher
//!
//!     Host->>Router: route(&mut RequestContext)
//!     Router->>Cache: ensure_initialized()
//!     Cache->>Source: endpoints() (first use or after change)
//!     Source-->>Cache: Vec<Arc<Endpoint>>
//!     Cache->>Dfa: build(endpoints)
//!     Cache-->>Router: Arc<DfaMatcher>
//!     Router->>Dfa: select(context, policies)
//!     Dfa-->>Router: RouteMatch (endpoint + values)
//!     Router-->>Host: Option<RouteMatch>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtrouting::constraints::ConstraintResolver;
//! use brrtrouting::data_source::DefaultEndpointDataSource;
//! use brrtrouting::endpoint::{RouteEndpointBuilder, RouteNameMetadata};
//! use brrtrouting::linking::LinkGenerator;
//! use brrtrouting::router::Router;
//! use brrtrouting::runtime_config::RoutingOptions;
//! use brrtrouting::values::RouteValueDictionary;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let source = Arc::new(DefaultEndpointDataSource::new([
//!     RouteEndpointBuilder::parse("/users/{id:int}", 0)
//!         .unwrap()
//!         .with_metadata(RouteNameMetadata("user".to_string()))
//!         .build(),
//! ]));
//!
//! let router = Router::new(source.clone(), ConstraintResolver::default(), RoutingOptions::default());
//! let matched = router.match_path(Method::GET, "/users/42").unwrap().unwrap();
//! assert_eq!(matched.get("id").as_deref(), Some("42"));
//!
//! let links = LinkGenerator::new(source, ConstraintResolver::default(), RoutingOptions::default());
//! let path = links.get_path_by_name("user", &RouteValueDictionary::from([("id", 7)])).unwrap();
//! assert_eq!(path.as_deref(), Some("/users/7"));
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems (bad templates, unknown constraints, duplicate link
//! names) are reported as [`error::RouteError`]. A request that matches no
//! endpoint, or values that cannot produce a link, are `Ok(None)`.

pub mod cache;
pub mod change_token;
pub mod cli;
pub mod constraints;
pub mod data_source;
pub mod endpoint;
pub mod error;
pub mod hot_reload;
pub mod linking;
pub mod manifest;
pub mod pattern;
pub mod router;
pub mod runtime_config;
pub mod template;
pub mod values;

pub use error::RouteError;
pub use router::{RequestContext, RouteMatch, Router};
pub use values::{RouteValue, RouteValueDictionary};
