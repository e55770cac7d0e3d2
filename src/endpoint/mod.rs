//! # Endpoints
//!
//! An [`Endpoint`] is a routable destination: an opaque handler name, a
//! [`RoutePattern`](crate::pattern::RoutePattern) with an order, and a list of
//! typed metadata. Endpoints are immutable once built; a
//! [`RouteEndpointBuilder`] collects the pieces and conventions adjust it
//! before [`RouteEndpointBuilder::build`].
//!
//! ## Metadata
//!
//! Metadata is any `Debug + Send + Sync` value. The router and the link
//! generator understand these types:
//!
//! | Type | Effect |
//! |------|--------|
//! | [`HttpMethodMetadata`] | request method filter (with optional CORS preflight) |
//! | [`HostMetadata`] | request host filter |
//! | [`HeaderMetadata`] | request header filter |
//! | [`RouteNameMetadata`] / [`EndpointNameMetadata`] | link generation by name |
//! | [`SuppressMatchingMetadata`] | hide from the request matcher |
//! | [`SuppressLinkGenerationMetadata`] | hide from link generation |
//! | [`FallbackMetadata`] | link generation tries it last |
//!
//! The last item of a type wins for single-value lookups.

mod core;
mod metadata;

pub use core::{Convention, Endpoint, EndpointId, RouteEndpointBuilder, RouteInfo};
pub use metadata::{
    EndpointMetadataCollection, EndpointNameMetadata, FallbackMetadata, HeaderMatchMode,
    HeaderMetadata, HostMetadata, HttpMethodMetadata, Metadata, RouteNameMetadata,
    SuppressLinkGenerationMetadata, SuppressMatchingMetadata,
};
