//! # Route Patterns
//!
//! Parsing and modelling of route templates such as
//! `/api/{controller=Home}/{action}/{id:int?}`.
//!
//! ## Template language
//!
//! | Syntax              | Meaning                                              |
//! |---------------------|------------------------------------------------------|
//! | `text`              | literal, matched case-insensitively                  |
//! | `{name}`            | parameter                                            |
//! | `{name:int}`        | parameter with an inline constraint (repeatable)     |
//! | `{name:range(1,9)}` | constraint with arguments (balanced parentheses)     |
//! | `{name=default}`    | parameter with a default value                       |
//! | `{name?}`           | optional parameter                                   |
//! | `{*name}`           | catch-all (slashes in values are encoded on output)  |
//! | `{**name}`          | catch-all (slashes in values are kept on output)     |
//! | `{{` / `}}`         | literal `{` / `}`                                    |
//!
//! A template may start with `/` or `~/`. A segment can mix literals and
//! parameters (`{file}.{ext}`), but two parameters may never touch, and an
//! optional parameter in such a segment must be last and preceded by `.`.
//!
//! ## Example
//!
//! ```rust
//! use brrtrouting::pattern;
//!
//! let p = pattern::parse("/users/{id:int}/{*rest}").unwrap();
//! assert_eq!(p.parameters().len(), 2);
//! assert!(p.catch_all().is_some());
//!
//! let group = pattern::parse("/api").unwrap();
//! let combined = pattern::combine(Some(&group), &p).unwrap();
//! assert_eq!(combined.raw_text(), "/api/users/{id:int}/{*rest}");
//! ```

mod core;
mod factory;
mod parser;
pub mod precedence;
#[cfg(test)]
mod tests;

pub use core::{
    ParameterKind, ParameterPolicyReference, RoutePattern, RoutePatternParameterPart,
    RoutePatternPart, RoutePatternPathSegment,
};
pub use factory::{combine, parse, parse_with, PolicyMap};
