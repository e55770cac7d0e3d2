//! Built-in route constraints.
//!
//! Every constraint looks at the invariant string form of the value under its
//! key. Unless noted otherwise a missing value fails the constraint.

use super::{RouteConstraint, RouteDirection};
use crate::values::{RouteValue, RouteValueDictionary};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::sync::Arc;

fn value_str<'a>(values: &'a RouteValueDictionary, key: &str) -> Option<Cow<'a, str>> {
    values
        .get(key)
        .filter(|v| !v.is_null())
        .map(RouteValue::as_invariant_str)
}

macro_rules! parse_constraint {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl RouteConstraint for $name {
            fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
                value_str(values, key).is_some_and(|v| v.parse::<$ty>().is_ok())
            }
        }
    };
}

parse_constraint!(
    /// `int`: a 32-bit signed integer.
    IntRouteConstraint,
    i32
);
parse_constraint!(
    /// `long`: a 64-bit signed integer.
    LongRouteConstraint,
    i64
);
parse_constraint!(
    /// `double`
    DoubleRouteConstraint,
    f64
);
parse_constraint!(
    /// `float`
    FloatRouteConstraint,
    f32
);

/// `decimal`: a finite number.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalRouteConstraint;

impl RouteConstraint for DecimalRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.parse::<f64>().is_ok_and(f64::is_finite))
    }
}

/// `bool`: `true` or `false`, any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolRouteConstraint;

impl RouteConstraint for BoolRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    }
}

/// `guid`: any text form `uuid` accepts (hyphenated, simple, braced, urn).
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidRouteConstraint;

impl RouteConstraint for GuidRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| uuid::Uuid::parse_str(&v).is_ok())
    }
}

/// `alpha`: ASCII letters only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaRouteConstraint;

impl RouteConstraint for AlphaRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.chars().all(|c| c.is_ascii_alphabetic()))
    }
}

/// `length(n)` and `length(min,max)`, counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct LengthRouteConstraint {
    min: usize,
    max: usize,
}

impl LengthRouteConstraint {
    #[must_use]
    pub fn exact(length: usize) -> Self {
        Self {
            min: length,
            max: length,
        }
    }

    /// # Errors
    ///
    /// When `min > max`.
    pub fn between(min: usize, max: usize) -> Result<Self, String> {
        if min > max {
            return Err(format!(
                "The value for argument 'minLength' should be less than or equal to the value for the argument 'maxLength' ({min} > {max})."
            ));
        }
        Ok(Self { min, max })
    }
}

impl RouteConstraint for LengthRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| {
            let length = v.chars().count();
            length >= self.min && length <= self.max
        })
    }
}

/// `minlength(n)`
#[derive(Debug, Clone, Copy)]
pub struct MinLengthRouteConstraint(pub usize);

impl RouteConstraint for MinLengthRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.chars().count() >= self.0)
    }
}

/// `maxlength(n)`
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthRouteConstraint(pub usize);

impl RouteConstraint for MaxLengthRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.chars().count() <= self.0)
    }
}

/// `min(n)`: an integer no smaller than `n`.
#[derive(Debug, Clone, Copy)]
pub struct MinRouteConstraint(pub i64);

impl RouteConstraint for MinRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.parse::<i64>().is_ok_and(|n| n >= self.0))
    }
}

/// `max(n)`: an integer no larger than `n`.
#[derive(Debug, Clone, Copy)]
pub struct MaxRouteConstraint(pub i64);

impl RouteConstraint for MaxRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| v.parse::<i64>().is_ok_and(|n| n <= self.0))
    }
}

/// `range(min,max)`: an integer within the inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct RangeRouteConstraint {
    min: i64,
    max: i64,
}

impl RangeRouteConstraint {
    /// # Errors
    ///
    /// When `min > max`.
    pub fn new(min: i64, max: i64) -> Result<Self, String> {
        if min > max {
            return Err(format!(
                "The value for argument 'min' should be less than or equal to the value for the argument 'max' ({min} > {max})."
            ));
        }
        Ok(Self { min, max })
    }
}

impl RouteConstraint for RangeRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key)
            .is_some_and(|v| v.parse::<i64>().is_ok_and(|n| n >= self.min && n <= self.max))
    }
}

/// `regex(pattern)`: case-insensitive and unanchored. A missing value is
/// tested as the empty string.
#[derive(Debug, Clone)]
pub struct RegexRouteConstraint {
    regex: Regex,
}

impl RegexRouteConstraint {
    /// # Errors
    ///
    /// When the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, String> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { regex })
    }

    /// A constraint that must match the whole value: `^(pattern)$`.
    ///
    /// # Errors
    ///
    /// When the pattern does not compile.
    pub fn anchored(pattern: &str) -> Result<Self, String> {
        Self::new(&format!("^({pattern})$"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl RouteConstraint for RegexRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        match value_str(values, key) {
            Some(v) => self.regex.is_match(&v),
            None => self.regex.is_match(""),
        }
    }
}

/// `required`: present and not empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredRouteConstraint;

impl RouteConstraint for RequiredRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| !v.is_empty())
    }
}

/// The last path component contains a `.` that is not its final character.
pub(crate) fn is_file_name(value: &str) -> bool {
    let last = value.rsplit('/').next().unwrap_or(value);
    match last.rfind('.') {
        Some(dot) => dot + 1 < last.len(),
        None => false,
    }
}

/// `file`: the value's last path component looks like a file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNameRouteConstraint;

impl RouteConstraint for FileNameRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_some_and(|v| is_file_name(&v))
    }
}

/// `nonfile`: the inverse of `file`. A missing value passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonFileNameRouteConstraint;

impl RouteConstraint for NonFileNameRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        value_str(values, key).is_none_or(|v| !is_file_name(&v))
    }
}

/// All inner constraints must pass.
#[derive(Debug, Clone)]
pub struct CompositeRouteConstraint {
    constraints: Vec<Arc<dyn RouteConstraint>>,
}

impl CompositeRouteConstraint {
    #[must_use]
    pub fn new(constraints: Vec<Arc<dyn RouteConstraint>>) -> Self {
        Self { constraints }
    }
}

impl RouteConstraint for CompositeRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, direction: RouteDirection) -> bool {
        self.constraints
            .iter()
            .all(|c| c.matches(key, values, direction))
    }
}

/// Wraps the constraints of an optional parameter: an absent value passes.
#[derive(Debug, Clone)]
pub struct OptionalRouteConstraint {
    inner: Arc<dyn RouteConstraint>,
}

impl OptionalRouteConstraint {
    #[must_use]
    pub fn new(inner: Arc<dyn RouteConstraint>) -> Self {
        Self { inner }
    }
}

impl RouteConstraint for OptionalRouteConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, direction: RouteDirection) -> bool {
        match values.get(key) {
            None | Some(RouteValue::Null) => true,
            Some(_) => self.inner.matches(key, values, direction),
        }
    }
}
