//! # Link Generation
//!
//! Outbound routing: produce a path (or absolute URI) for an *address* plus
//! route values, and parse a path back into values for the same address.
//!
//! ## Addresses
//!
//! | Address                  | Candidates                                               |
//! |--------------------------|----------------------------------------------------------|
//! | [`EndpointName`]         | the endpoint whose endpoint/route name matches (any case)|
//! | [`RouteValuesAddress`]   | the named endpoint, or the required-values decision tree |
//! | custom `A`               | any [`AddressScheme<A>`] registered on the generator     |
//!
//! Candidates are tried in order; for each, the [`TemplateBinder`] merges
//! explicit, ambient and default values, checks constraints and renders the
//! template. The first endpoint that produces a URL wins. No candidate
//! succeeding is an ordinary `Ok(None)`.
//!
//! ## Eligibility
//!
//! Only endpoints with a name or with required values are indexed, and
//! [`SuppressLinkGenerationMetadata`] removes an endpoint entirely. Two
//! eligible endpoints with the same name fail the index build with
//! [`RouteError::DuplicateEndpointName`].
//!
//! ## Example
//!
//! ```rust
//! use brrtrouting::constraints::ConstraintResolver;
//! use brrtrouting::data_source::DefaultEndpointDataSource;
//! use brrtrouting::endpoint::{RouteEndpointBuilder, RouteNameMetadata};
//! use brrtrouting::linking::LinkGenerator;
//! use brrtrouting::runtime_config::RoutingOptions;
//! use brrtrouting::values::RouteValueDictionary;
//! use std::sync::Arc;
//!
//! let source = DefaultEndpointDataSource::new([RouteEndpointBuilder::parse("/users/{id:int}", 0)
//!     .unwrap()
//!     .with_metadata(RouteNameMetadata("user".to_string()))
//!     .build()]);
//! let links = LinkGenerator::new(Arc::new(source), ConstraintResolver::default(), RoutingOptions::default());
//!
//! let path = links.get_path_by_name("user", &RouteValueDictionary::from([("id", 5)])).unwrap();
//! assert_eq!(path.as_deref(), Some("/users/5"));
//!
//! let values = links.parser().parse_path_by_endpoint_name("user", "/users/5").unwrap().unwrap();
//! assert_eq!(values.get_str("id").as_deref(), Some("5"));
//! ```
//!
//! [`TemplateBinder`]: crate::template::TemplateBinder
//! [`SuppressLinkGenerationMetadata`]: crate::endpoint::SuppressLinkGenerationMetadata
//! [`RouteError::DuplicateEndpointName`]: crate::error::RouteError::DuplicateEndpointName

mod address;
mod decision_tree;
mod generator;
mod index;
mod parser;
#[cfg(test)]
mod tests;

pub use address::{
    AddressScheme, AddressSchemeRegistry, EndpointName, EndpointNameAddressScheme,
    RouteValuesAddress, RouteValuesAddressScheme,
};
pub use generator::{LinkContext, LinkGenerator};
pub use index::LinkIndex;
pub use parser::LinkParser;
