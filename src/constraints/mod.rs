//! # Route Constraints
//!
//! Constraints validate route values, both for incoming requests (after a
//! pattern has matched the path) and for link generation (before a URL is
//! rendered).
//!
//! Inline constraint text from a template (`int`, `range(1,10)`,
//! `regex(^\d+$)`) is turned into instances by the [`ConstraintResolver`],
//! which looks the key up in a [`ConstraintMap`]. Applications can register
//! their own keys, including constraints whose constructors need services.
//!
//! ## Built-in keys
//!
//! `int`, `long`, `bool`, `decimal`, `double`, `float`, `guid`, `alpha`,
//! `minlength(n)`, `maxlength(n)`, `length(n)`, `length(min,max)`, `min(n)`,
//! `max(n)`, `range(min,max)`, `regex(pattern)`, `required`, `file`, `nonfile`.

pub mod builtin;
mod matcher;
mod resolver;
#[cfg(test)]
mod tests;

use crate::values::RouteValueDictionary;
use std::fmt;

pub use matcher::{build_constraints, ConstraintSet, RouteConstraintMatcher};
pub use resolver::{
    ConstraintConstructor, ConstraintMap, ConstraintResolver, NoServices, Service,
    ServiceCollection, ServiceProvider,
};

/// Which operation a constraint is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDirection {
    /// Matching an incoming request path.
    IncomingRequest,
    /// Generating a URL.
    UrlGeneration,
}

/// A predicate over one route value.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    /// Check the value stored under `key` in `values`.
    fn matches(&self, key: &str, values: &RouteValueDictionary, direction: RouteDirection) -> bool;
}
