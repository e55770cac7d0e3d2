//! # Template Matching and Binding
//!
//! [`TemplateMatcher`] matches a request path against one [`RoutePattern`]
//! and extracts route values. [`TemplateBinder`] runs the other direction:
//! given explicit and ambient values it decides which values a link uses,
//! checks constraints, and renders the path and query string.
//!
//! For any pattern `P` and values that bind to `/x`, matching `/x` against
//! `P` yields those values back (after defaults are applied).
//!
//! [`RoutePattern`]: crate::pattern::RoutePattern

mod binder;
mod matcher;
#[cfg(test)]
mod tests;

pub use binder::{BoundUrl, RejectedConstraint, TemplateBinder, TemplateValuesResult};
pub(crate) use matcher::{decode, split_path, PathSegments};
pub use matcher::TemplateMatcher;
