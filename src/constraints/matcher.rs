//! Constraint evaluation and per-pattern constraint building.

use super::builtin::{CompositeRouteConstraint, OptionalRouteConstraint};
use super::{ConstraintResolver, RouteConstraint, RouteDirection};
use crate::error::RouteError;
use crate::pattern::{ParameterPolicyReference, RoutePattern};
use crate::values::RouteValueDictionary;
use std::sync::Arc;
use tracing::debug;

/// Resolved constraints for one pattern, keyed by parameter (or filter) name.
pub type ConstraintSet = Vec<(String, Arc<dyn RouteConstraint>)>;

/// Evaluates a [`ConstraintSet`] against route values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteConstraintMatcher;

impl RouteConstraintMatcher {
    /// True when every constraint passes. An empty set always passes; the
    /// first failure stops evaluation.
    #[must_use]
    pub fn matches(
        constraints: &[(String, Arc<dyn RouteConstraint>)],
        values: &RouteValueDictionary,
        direction: RouteDirection,
    ) -> bool {
        for (key, constraint) in constraints {
            if !constraint.matches(key, values, direction) {
                debug!(
                    parameter = %key,
                    value = ?values.get(key),
                    constraint = ?constraint,
                    direction = ?direction,
                    "Route value rejected by constraint"
                );
                return false;
            }
        }
        true
    }
}

/// Resolve every policy on `pattern` into a [`ConstraintSet`].
///
/// Several constraints on one key are combined into a composite; constraints
/// on an optional parameter are wrapped so an absent value passes.
///
/// # Errors
///
/// [`RouteError::UnknownConstraint`] for an unregistered key, plus anything
/// [`ConstraintResolver::resolve`] reports.
pub fn build_constraints(
    pattern: &RoutePattern,
    resolver: &ConstraintResolver,
) -> Result<ConstraintSet, RouteError> {
    let mut set = ConstraintSet::with_capacity(pattern.parameter_policies().len());

    for (key, references) in pattern.parameter_policies() {
        let mut resolved: Vec<Arc<dyn RouteConstraint>> = Vec::with_capacity(references.len());
        for reference in references {
            match reference {
                ParameterPolicyReference::Constraint(constraint) => {
                    resolved.push(Arc::clone(constraint));
                }
                ParameterPolicyReference::Content(text) => match resolver.resolve(text)? {
                    Some(constraint) => resolved.push(constraint),
                    None => {
                        return Err(RouteError::UnknownConstraint {
                            parameter: key.clone(),
                            constraint: text.clone(),
                        })
                    }
                },
            }
        }

        let mut constraint = match resolved.len() {
            0 => continue,
            1 => resolved.remove(0),
            _ => Arc::new(CompositeRouteConstraint::new(resolved)) as Arc<dyn RouteConstraint>,
        };

        if pattern
            .get_parameter(key)
            .is_some_and(|p| p.is_optional())
        {
            constraint = Arc::new(OptionalRouteConstraint::new(constraint));
        }

        set.push((key.clone(), constraint));
    }

    Ok(set)
}
