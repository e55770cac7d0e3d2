//! Pattern construction: parsing with out-of-line data, and combining.

use super::core::{
    ParameterPolicyReference, RoutePattern, RoutePatternParameterPart, RoutePatternPart,
    RoutePatternPathSegment,
};
use super::parser;
use super::precedence;
use crate::error::RouteError;
use crate::values::{route_value_eq, RouteValueDictionary};

/// Out-of-line parameter policies keyed by parameter name.
pub type PolicyMap = Vec<(String, Vec<ParameterPolicyReference>)>;

/// Parse a route template.
///
/// # Errors
///
/// Returns [`RouteError::Template`] for malformed templates,
/// [`RouteError::DuplicateParameter`] when a parameter name repeats and
/// [`RouteError::OptionalWithDefault`] for `{p=x?}`.
pub fn parse(template: &str) -> Result<RoutePattern, RouteError> {
    parse_with(
        template,
        &RouteValueDictionary::new(),
        &[],
        &RouteValueDictionary::new(),
    )
}

/// Parse a route template and merge out-of-line defaults, policies and
/// required values into it.
///
/// Out-of-line defaults and policies for names that are not parameters are
/// kept on the pattern (they act as filters during link generation).
///
/// # Errors
///
/// Everything [`parse`] reports, plus [`RouteError::ConflictingDefault`] when a
/// parameter has different inline and out-of-line defaults,
/// [`RouteError::InvalidConstraintReference`] for an empty policy, and
/// [`RouteError::InvalidRequiredValue`] when a required value matches neither a
/// parameter nor an equal default.
pub fn parse_with(
    template: &str,
    defaults: &RouteValueDictionary,
    policies: &[(String, Vec<ParameterPolicyReference>)],
    required_values: &RouteValueDictionary,
) -> Result<RoutePattern, RouteError> {
    let segments = parser::parse_segments(template)?;
    build(
        template.to_string(),
        defaults,
        policies,
        required_values,
        segments,
    )
}

fn build(
    raw_text: String,
    defaults: &RouteValueDictionary,
    policies: &[(String, Vec<ParameterPolicyReference>)],
    required_values: &RouteValueDictionary,
    mut segments: Vec<RoutePatternPathSegment>,
) -> Result<RoutePattern, RouteError> {
    let mut updated_defaults = defaults.clone();
    let mut updated_policies: PolicyMap = Vec::with_capacity(policies.len());
    for (key, references) in policies {
        for reference in references {
            if reference.content().is_some_and(str::is_empty) {
                return Err(RouteError::InvalidConstraintReference {
                    key: key.clone(),
                    value: String::new(),
                });
            }
        }
        push_policies(&mut updated_policies, key, references.iter().cloned());
    }

    let mut parameters: Vec<RoutePatternParameterPart> = Vec::new();
    for segment in &mut segments {
        for part in &mut segment.parts {
            let RoutePatternPart::Parameter(parameter) = part else {
                continue;
            };

            if parameters
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&parameter.name))
            {
                return Err(RouteError::DuplicateParameter {
                    template: raw_text,
                    name: parameter.name.clone(),
                });
            }

            if let Some(out_of_line) = defaults.get(&parameter.name) {
                if let Some(inline) = &parameter.default {
                    if !route_value_eq(inline, out_of_line) {
                        return Err(RouteError::ConflictingDefault {
                            parameter: parameter.name.clone(),
                        });
                    }
                }
                if parameter.is_optional() {
                    return Err(RouteError::OptionalWithDefault {
                        parameter: parameter.name.clone(),
                    });
                }
                parameter.default = Some(out_of_line.clone());
            } else if let Some(inline) = &parameter.default {
                updated_defaults.insert(parameter.name.clone(), inline.clone());
            }

            // Out-of-line policies run before inline ones.
            let mut merged: Vec<ParameterPolicyReference> = updated_policies
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&parameter.name))
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            if !parameter.policies.is_empty() {
                push_policies(
                    &mut updated_policies,
                    &parameter.name,
                    parameter.policies.iter().cloned(),
                );
                merged.extend(parameter.policies.drain(..));
            }
            parameter.policies = merged;

            parameters.push(parameter.clone());
        }
    }

    validate_required_values(required_values, &parameters, &updated_defaults)?;

    let inbound_precedence = precedence::compute_inbound(&segments);
    let outbound_precedence = precedence::compute_outbound(&segments);

    Ok(RoutePattern {
        raw_text,
        defaults: updated_defaults,
        parameter_policies: updated_policies,
        required_values: required_values.clone(),
        parameters,
        path_segments: segments,
        inbound_precedence,
        outbound_precedence,
    })
}

fn push_policies(
    map: &mut PolicyMap,
    key: &str,
    references: impl Iterator<Item = ParameterPolicyReference>,
) {
    match map.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
        Some((_, existing)) => existing.extend(references),
        None => map.push((key.to_string(), references.collect())),
    }
}

/// Each required value must be empty, name a parameter, or equal a default.
fn validate_required_values(
    required_values: &RouteValueDictionary,
    parameters: &[RoutePatternParameterPart],
    defaults: &RouteValueDictionary,
) -> Result<(), RouteError> {
    for (key, value) in required_values {
        let found = value.is_empty()
            || parameters.iter().any(|p| p.name.eq_ignore_ascii_case(key))
            || defaults
                .get(key)
                .is_some_and(|default| route_value_eq(value, default));
        if !found {
            return Err(RouteError::InvalidRequiredValue {
                key: key.to_string(),
                value: value.as_invariant_str().into_owned(),
            });
        }
    }
    Ok(())
}

/// Combine a group prefix with a child pattern.
///
/// Segments are joined with an implied `/`. When the suffix text starts with
/// `.`, `-` or `_`, the prefix ends in a literal and the suffix starts with a
/// literal or separator, the touching segments merge instead
/// (`/files` + `.{ext?}` is `/files.{ext?}`).
///
/// # Errors
///
/// [`RouteError::ConflictingDefault`] when both sides default the same key to
/// different values, [`RouteError::InvalidRequiredValue`] when their required
/// values disagree, and every error [`parse_with`] can raise for the merged
/// result (duplicate parameters, a catch-all that is no longer last).
pub fn combine(
    prefix: Option<&RoutePattern>,
    suffix: &RoutePattern,
) -> Result<RoutePattern, RouteError> {
    let Some(prefix) = prefix else {
        return Ok(suffix.clone());
    };

    let suffix_text = strip_leading(&suffix.raw_text);
    let continuation = suffix_text.starts_with(['.', '-', '_'])
        && ends_with_literal(prefix.path_segments.last())
        && starts_with_literal(suffix.path_segments.first());

    let prefix_text = prefix.raw_text.trim_end_matches('/');
    let raw_text = if continuation {
        format!("{prefix_text}{suffix_text}")
    } else if suffix_text.is_empty() {
        prefix.raw_text.clone()
    } else if strip_leading(prefix_text).is_empty() {
        format!("/{suffix_text}")
    } else {
        format!("{prefix_text}/{suffix_text}")
    };

    let mut segments = prefix.path_segments.clone();
    let mut rest = suffix.path_segments.iter();
    if continuation {
        if let (Some(last), Some(first)) = (segments.last_mut(), rest.next()) {
            merge_segment(last, first);
        }
    }
    segments.extend(rest.cloned());
    parser::validate_catch_all_position(&raw_text, &segments)?;

    let mut defaults = prefix.defaults.clone();
    for (key, value) in &suffix.defaults {
        match defaults.get(key) {
            Some(existing) if !route_value_eq(existing, value) => {
                return Err(RouteError::ConflictingDefault {
                    parameter: key.to_string(),
                });
            }
            Some(_) => {}
            None => {
                defaults.insert(key, value.clone());
            }
        }
    }

    let mut required_values = prefix.required_values.clone();
    for (key, value) in &suffix.required_values {
        match required_values.get(key) {
            Some(existing) if !route_value_eq(existing, value) => {
                return Err(RouteError::InvalidRequiredValue {
                    key: key.to_string(),
                    value: value.as_invariant_str().into_owned(),
                });
            }
            Some(_) => {}
            None => {
                required_values.insert(key, value.clone());
            }
        }
    }

    // Parameter policies already live on their parts; only filter policies
    // (keys that are not parameters) are carried out of line.
    let mut policies: PolicyMap = Vec::new();
    for pattern in [prefix, suffix] {
        for (key, references) in &pattern.parameter_policies {
            if pattern.get_parameter(key).is_none() {
                push_policies(&mut policies, key, references.iter().cloned());
            }
        }
    }

    build(raw_text, &defaults, &policies, &required_values, segments)
}

fn strip_leading(text: &str) -> &str {
    text.strip_prefix("~/")
        .or_else(|| text.strip_prefix('/'))
        .unwrap_or(text)
}

fn ends_with_literal(segment: Option<&RoutePatternPathSegment>) -> bool {
    matches!(
        segment.and_then(|s| s.parts.last()),
        Some(RoutePatternPart::Literal(_))
    )
}

fn starts_with_literal(segment: Option<&RoutePatternPathSegment>) -> bool {
    matches!(
        segment.and_then(|s| s.parts.first()),
        Some(RoutePatternPart::Literal(_) | RoutePatternPart::Separator(_))
    )
}

fn merge_segment(target: &mut RoutePatternPathSegment, next: &RoutePatternPathSegment) {
    for part in &next.parts {
        match (target.parts.last_mut(), part) {
            (Some(RoutePatternPart::Literal(existing)), RoutePatternPart::Literal(text)) => {
                existing.push_str(text);
            }
            _ => target.parts.push(part.clone()),
        }
    }
}
