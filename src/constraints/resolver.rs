//! Inline constraint resolution.
//!
//! A [`ConstraintMap`] maps constraint keys (`int`, `range`, ...) to one or more
//! [`ConstraintConstructor`]s. Each constructor declares how many positional
//! arguments it takes and which named services it needs from a
//! [`ServiceProvider`].
//!
//! Resolution of `key(args)`:
//!
//! 1. Look up `key` (case-insensitively). Unknown keys resolve to `None`.
//! 2. If the key has exactly one constructor and it takes one argument, the
//!    whole argument text is passed verbatim, commas included. Otherwise the
//!    text is split on top-level commas and each piece trimmed.
//! 3. Keep constructors whose arity matches and whose services are all
//!    available; the one needing the most services wins. A tie is an error.

use super::builtin::{
    AlphaRouteConstraint, BoolRouteConstraint, DecimalRouteConstraint, DoubleRouteConstraint,
    FileNameRouteConstraint, FloatRouteConstraint, GuidRouteConstraint, IntRouteConstraint,
    LengthRouteConstraint, LongRouteConstraint, MaxLengthRouteConstraint, MaxRouteConstraint,
    MinLengthRouteConstraint, MinRouteConstraint, NonFileNameRouteConstraint,
    RangeRouteConstraint, RegexRouteConstraint, RequiredRouteConstraint,
};
use super::RouteConstraint;
use crate::error::RouteError;
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased service handed to constraint constructors.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Looks up services by name for constraint constructors.
pub trait ServiceProvider: Send + Sync {
    fn get_service(&self, name: &str) -> Option<Service>;
}

/// A provider with no services.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServices;

impl ServiceProvider for NoServices {
    fn get_service(&self, _name: &str) -> Option<Service> {
        None
    }
}

/// A name → service map.
#[derive(Default, Clone)]
pub struct ServiceCollection {
    services: HashMap<String, Service>,
}

impl ServiceCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, service: Service) {
        self.services.insert(name.into(), service);
    }
}

impl ServiceProvider for ServiceCollection {
    fn get_service(&self, name: &str) -> Option<Service> {
        self.services.get(name).cloned()
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

type BuildFn =
    dyn Fn(&[&str], &[Service]) -> Result<Arc<dyn RouteConstraint>, String> + Send + Sync;

/// One way of constructing a constraint.
#[derive(Clone)]
pub struct ConstraintConstructor {
    arity: usize,
    services: Vec<String>,
    build: Arc<BuildFn>,
}

impl ConstraintConstructor {
    /// A constructor taking `arity` positional arguments and no services.
    pub fn new<F>(arity: usize, build: F) -> Self
    where
        F: Fn(&[&str]) -> Result<Arc<dyn RouteConstraint>, String> + Send + Sync + 'static,
    {
        Self {
            arity,
            services: Vec::new(),
            build: Arc::new(move |args, _| build(args)),
        }
    }

    /// A constructor that also needs the named services, passed in the same order.
    pub fn with_services<F>(arity: usize, services: &[&str], build: F) -> Self
    where
        F: Fn(&[&str], &[Service]) -> Result<Arc<dyn RouteConstraint>, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            arity,
            services: services.iter().map(|s| (*s).to_string()).collect(),
            build: Arc::new(build),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }
}

impl fmt::Debug for ConstraintConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintConstructor")
            .field("arity", &self.arity)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

/// Constraint key → constructors. Keys are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ConstraintMap {
    entries: HashMap<String, Vec<ConstraintConstructor>>,
}

impl ConstraintMap {
    /// An empty map without the built-in constraints.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in constraint set.
    #[must_use]
    pub fn with_defaults() -> Self {
        DEFAULT_CONSTRAINT_MAP.clone()
    }

    /// Register (or replace) a constraint key.
    pub fn insert(&mut self, key: &str, constructors: Vec<ConstraintConstructor>) {
        self.entries.insert(key.to_ascii_lowercase(), constructors);
    }

    /// Register a constraint that takes no arguments.
    pub fn insert_simple<C>(&mut self, key: &str, make: fn() -> C)
    where
        C: RouteConstraint + 'static,
    {
        self.insert(
            key,
            vec![ConstraintConstructor::new(0, move |_| {
                Ok(Arc::new(make()) as Arc<dyn RouteConstraint>)
            })],
        );
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[ConstraintConstructor]> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_ascii_lowercase())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn boxed<C: RouteConstraint + 'static>(c: C) -> Arc<dyn RouteConstraint> {
    Arc::new(c)
}

fn parse_arg<T: std::str::FromStr>(text: &str) -> Result<T, String> {
    text.trim()
        .parse::<T>()
        .map_err(|_| format!("'{text}' is not a valid argument"))
}

static DEFAULT_CONSTRAINT_MAP: Lazy<ConstraintMap> = Lazy::new(|| {
    let mut map = ConstraintMap::empty();
    map.insert_simple("int", || IntRouteConstraint);
    map.insert_simple("long", || LongRouteConstraint);
    map.insert_simple("bool", || BoolRouteConstraint);
    map.insert_simple("decimal", || DecimalRouteConstraint);
    map.insert_simple("double", || DoubleRouteConstraint);
    map.insert_simple("float", || FloatRouteConstraint);
    map.insert_simple("guid", || GuidRouteConstraint);
    map.insert_simple("alpha", || AlphaRouteConstraint);
    map.insert_simple("required", || RequiredRouteConstraint);
    map.insert_simple("file", || FileNameRouteConstraint);
    map.insert_simple("nonfile", || NonFileNameRouteConstraint);

    map.insert(
        "minlength",
        vec![ConstraintConstructor::new(1, |args| {
            Ok(boxed(MinLengthRouteConstraint(parse_arg(args[0])?)))
        })],
    );
    map.insert(
        "maxlength",
        vec![ConstraintConstructor::new(1, |args| {
            Ok(boxed(MaxLengthRouteConstraint(parse_arg(args[0])?)))
        })],
    );
    map.insert(
        "length",
        vec![
            ConstraintConstructor::new(1, |args| {
                Ok(boxed(LengthRouteConstraint::exact(parse_arg(args[0])?)))
            }),
            ConstraintConstructor::new(2, |args| {
                Ok(boxed(LengthRouteConstraint::between(
                    parse_arg(args[0])?,
                    parse_arg(args[1])?,
                )?))
            }),
        ],
    );
    map.insert(
        "min",
        vec![ConstraintConstructor::new(1, |args| {
            Ok(boxed(MinRouteConstraint(parse_arg(args[0])?)))
        })],
    );
    map.insert(
        "max",
        vec![ConstraintConstructor::new(1, |args| {
            Ok(boxed(MaxRouteConstraint(parse_arg(args[0])?)))
        })],
    );
    map.insert(
        "range",
        vec![ConstraintConstructor::new(2, |args| {
            Ok(boxed(RangeRouteConstraint::new(
                parse_arg(args[0])?,
                parse_arg(args[1])?,
            )?))
        })],
    );
    map.insert(
        "regex",
        vec![ConstraintConstructor::new(1, |args| {
            Ok(boxed(RegexRouteConstraint::new(args[0])?))
        })],
    );
    map
});

/// Split `key(args)` into the key and the raw argument text.
fn split_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.find('(') {
        Some(open) if spec.ends_with(')') => (&spec[..open], Some(&spec[open + 1..spec.len() - 1])),
        _ => (spec, None),
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(args[start..].trim());
    pieces
}

/// Resolves inline constraint text into constraint instances.
#[derive(Clone)]
pub struct ConstraintResolver {
    map: Arc<ConstraintMap>,
    services: Arc<dyn ServiceProvider>,
}

impl ConstraintResolver {
    #[must_use]
    pub fn new(map: Arc<ConstraintMap>, services: Arc<dyn ServiceProvider>) -> Self {
        Self { map, services }
    }

    #[must_use]
    pub fn map(&self) -> &ConstraintMap {
        &self.map
    }

    /// Resolve `key` or `key(args)`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the key is not registered.
    ///
    /// # Errors
    ///
    /// [`RouteError::AmbiguousConstraint`] when several constructors tie,
    /// [`RouteError::ConstraintConstruction`] when no constructor fits the
    /// arguments or the chosen one rejects them.
    pub fn resolve(&self, spec: &str) -> Result<Option<Arc<dyn RouteConstraint>>, RouteError> {
        let (key, args) = split_spec(spec.trim());
        let Some(constructors) = self.map.get(key) else {
            return Ok(None);
        };

        let arguments: Vec<&str> = match args {
            None => Vec::new(),
            Some(text) if constructors.len() == 1 && constructors[0].arity == 1 => vec![text],
            Some(text) => split_top_level(text),
        };

        let mut best: Option<(&ConstraintConstructor, Vec<Service>)> = None;
        let mut tied = false;
        for constructor in constructors.iter().filter(|c| c.arity == arguments.len()) {
            let Some(services) = constructor
                .services
                .iter()
                .map(|name| self.services.get_service(name))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };
            match &best {
                Some((current, _)) if current.services.len() > services.len() => {}
                Some((current, _)) if current.services.len() == services.len() => tied = true,
                _ => {
                    tied = false;
                    best = Some((constructor, services));
                }
            }
        }

        let Some((constructor, services)) = best else {
            return Err(RouteError::ConstraintConstruction {
                constraint: spec.to_string(),
                message: format!(
                    "no constructor of '{key}' accepts {} argument(s) with the available services",
                    arguments.len()
                ),
            });
        };
        if tied {
            return Err(RouteError::AmbiguousConstraint {
                constraint: key.to_string(),
                arity: arguments.len(),
                services: constructor.services.len(),
            });
        }

        (constructor.build)(&arguments, &services)
            .map(Some)
            .map_err(|message| RouteError::ConstraintConstruction {
                constraint: spec.to_string(),
                message,
            })
    }
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new(Arc::new(ConstraintMap::with_defaults()), Arc::new(NoServices))
    }
}

impl fmt::Debug for ConstraintResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintResolver")
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}
