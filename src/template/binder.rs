//! Outbound binding: merge explicit, ambient and default values for one
//! pattern, check constraints, and render the URL.

use crate::constraints::{ConstraintSet, RouteConstraint, RouteDirection};
use crate::pattern::{RoutePattern, RoutePatternPart};
use crate::runtime_config::ResolvedLinkOptions;
use crate::values::{route_value_eq, route_value_opt_eq, RouteValue, RouteValueDictionary};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Values computed by [`TemplateBinder::get_values`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValuesResult {
    /// Values used to render the URL; keys the pattern does not consume end
    /// up in the query string.
    pub accepted_values: RouteValueDictionary,
    /// `accepted_values` plus ambient values that are not parameters; what
    /// constraints see.
    pub combined_values: RouteValueDictionary,
}

/// The constraint that rejected a link, for diagnostics.
#[derive(Debug, Clone)]
pub struct RejectedConstraint {
    pub parameter: String,
    pub constraint: Arc<dyn RouteConstraint>,
}

/// A rendered path and query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundUrl {
    /// Always starts with `/`
    pub path: String,
    /// Empty, or starts with `?`
    pub query: String,
}

impl fmt::Display for BoundUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.query)
    }
}

/// How a key was supplied in the explicit values.
#[derive(Debug, Clone)]
enum Slot {
    Omitted,
    /// Supplied as null or empty; counts as "given" when comparing with
    /// ambient values but cannot satisfy a parameter.
    ExplicitNull,
    Value(RouteValue),
}

impl Slot {
    fn from_explicit(value: Option<&RouteValue>) -> Self {
        match value {
            None => Slot::Omitted,
            Some(v) if v.is_empty() => Slot::ExplicitNull,
            Some(v) => Slot::Value(v.clone()),
        }
    }

    fn is_explicit(&self) -> bool {
        !matches!(self, Slot::Omitted)
    }

    fn as_route_value(&self) -> RouteValue {
        match self {
            Slot::Value(v) => v.clone(),
            Slot::Omitted | Slot::ExplicitNull => RouteValue::Null,
        }
    }
}

/// Binds route values to one pattern.
#[derive(Debug, Clone)]
pub struct TemplateBinder {
    pattern: Arc<RoutePattern>,
    constraints: ConstraintSet,
    /// Defaults that are not parameters. Explicit values must agree with them.
    filters: Vec<(String, RouteValue)>,
}

impl TemplateBinder {
    #[must_use]
    pub fn new(pattern: Arc<RoutePattern>, constraints: ConstraintSet) -> Self {
        let filters = pattern
            .defaults()
            .iter()
            .filter(|(key, _)| pattern.get_parameter(key).is_none())
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        Self {
            pattern,
            constraints,
            filters,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Merge explicit and ambient values.
    ///
    /// For each parameter, left to right: an explicit value wins; otherwise the
    /// ambient value is used while ambient values are still being accepted;
    /// otherwise optional and catch-all parameters are left out and the rest
    /// fall back to their default. A required parameter with no value fails.
    ///
    /// Ambient values stop being accepted at the first parameter whose
    /// explicit value differs from the ambient one, or that has neither value
    /// nor default. They are not accepted at all when a required value that is
    /// not a parameter is given explicitly with a different value.
    ///
    /// Returns `None` when the pattern cannot be satisfied.
    #[must_use]
    pub fn get_values(
        &self,
        ambient: Option<&RouteValueDictionary>,
        values: &RouteValueDictionary,
    ) -> Option<TemplateValuesResult> {
        let pattern = &*self.pattern;
        let parameters = pattern.parameters();

        let mut slots: Vec<Slot> = parameters
            .iter()
            .map(|p| Slot::from_explicit(values.get(p.name())))
            .collect();
        let mut processed = slots.iter().filter(|s| s.is_explicit()).count();
        let filter_slots: Vec<Slot> = self
            .filters
            .iter()
            .map(|(key, _)| Slot::from_explicit(values.get(key)))
            .collect();
        processed += filter_slots.iter().filter(|s| s.is_explicit()).count();

        let mut copy_ambient = ambient.is_some();
        if copy_ambient {
            for (key, _) in pattern.required_values() {
                if pattern.get_parameter(key).is_some() {
                    continue;
                }
                let explicit = values.get(key);
                let ambient_value = ambient.and_then(|a| a.get(key));
                if explicit.is_some()
                    && !route_value_opt_eq(explicit, ambient_value)
                {
                    copy_ambient = false;
                    break;
                }
            }
        }

        for (i, parameter) in parameters.iter().enumerate() {
            let key = parameter.name();
            let mut has_explicit = slots[i].is_explicit();
            let mut ambient_value: Option<&RouteValue> = None;

            if copy_ambient {
                ambient_value = ambient.and_then(|a| a.get(key));
                if has_explicit {
                    if let Some(amb) = ambient_value {
                        if !route_value_eq(amb, &slots[i].as_route_value()) {
                            copy_ambient = false;
                        }
                    }
                }
                if !has_explicit
                    && ambient_value.is_none()
                    && !pattern.defaults().contains_key(key)
                {
                    copy_ambient = false;
                }
            }

            // An ambient value equal to a required value is always usable.
            if !copy_ambient && !has_explicit {
                if let Some(required) = pattern.required_values().get(key) {
                    if let Some(amb) = ambient.and_then(|a| a.get(key)) {
                        if route_value_eq(required, amb) {
                            slots[i] = Slot::Value(amb.clone());
                            has_explicit = true;
                        }
                    }
                }
            }

            if has_explicit && matches!(slots[i], Slot::Value(_)) {
                continue;
            }
            match ambient_value {
                Some(amb) if copy_ambient && !amb.is_empty() => {
                    slots[i] = Slot::Value(amb.clone());
                }
                _ if parameter.is_optional() || parameter.is_catch_all() => {
                    slots[i] = Slot::Omitted;
                }
                _ => match pattern.defaults().get(key) {
                    Some(default) => slots[i] = Slot::Value(default.clone()),
                    None => return None,
                },
            }
        }

        // Required values must agree with what was bound.
        for (key, required) in pattern.required_values() {
            if required.is_empty() {
                if values.get(key).is_some_and(|v| !v.is_empty()) {
                    return None;
                }
                continue;
            }
            let bound = match parameters
                .iter()
                .position(|p| p.name().eq_ignore_ascii_case(key))
            {
                Some(i) => match &slots[i] {
                    Slot::Value(v) => Some(v.clone()),
                    _ => None,
                },
                None => values
                    .get(key)
                    .filter(|v| !v.is_empty())
                    .or_else(|| pattern.defaults().get(key))
                    .cloned(),
            };
            if !bound.is_some_and(|v| route_value_eq(&v, required)) {
                return None;
            }
        }

        let mut accepted = RouteValueDictionary::with_capacity(parameters.len() + values.len());
        for (parameter, slot) in parameters.iter().zip(&slots) {
            if let Slot::Value(v) = slot {
                accepted.insert(parameter.name(), v.clone());
            }
        }

        for ((key, filter_value), slot) in self.filters.iter().zip(&filter_slots) {
            if slot.is_explicit() {
                if !route_value_eq(&slot.as_route_value(), filter_value) {
                    return None;
                }
                accepted.insert(key.clone(), slot.as_route_value());
            }
        }

        if processed < values.len() {
            for (key, value) in values {
                if !pattern.defaults().contains_key(key) {
                    accepted.try_insert(key, value.clone());
                }
            }
        }

        let mut combined = accepted.clone();
        if let Some(ambient) = ambient {
            for (key, value) in ambient {
                if !value.is_empty()
                    && pattern.get_parameter(key).is_none()
                    && !accepted.contains_key(key)
                {
                    combined.try_insert(key, value.clone());
                }
            }
        }

        Some(TemplateValuesResult {
            accepted_values: accepted,
            combined_values: combined,
        })
    }

    /// Check every constraint in the URL-generation direction.
    ///
    /// # Errors
    ///
    /// The first constraint that rejects `combined_values`. This is an
    /// ordinary "cannot generate" outcome, not a configuration error.
    pub fn try_process_constraints(
        &self,
        combined_values: &RouteValueDictionary,
    ) -> Result<(), RejectedConstraint> {
        for (key, constraint) in &self.constraints {
            if !constraint.matches(key, combined_values, RouteDirection::UrlGeneration) {
                debug!(
                    parameter = %key,
                    constraint = ?constraint,
                    template = %self.pattern.raw_text(),
                    "Link generation rejected by constraint"
                );
                return Err(RejectedConstraint {
                    parameter: key.clone(),
                    constraint: Arc::clone(constraint),
                });
            }
        }
        Ok(())
    }

    /// Render the pattern with `accepted_values`.
    ///
    /// Each segment is all-or-none. Trailing segments whose values equal their
    /// defaults are left out. Values that the pattern does not consume, other
    /// than filters, become the query string. Returns `None` when a segment
    /// cannot be written.
    #[must_use]
    pub fn try_bind_values(
        &self,
        accepted_values: &RouteValueDictionary,
        options: &ResolvedLinkOptions,
    ) -> Option<BoundUrl> {
        let mut remaining = accepted_values.clone();
        let mut context = UriBuildingContext::default();

        for segment in self.pattern.path_segments() {
            let parts = segment.parts();
            for (j, part) in parts.iter().enumerate() {
                match part {
                    RoutePatternPart::Literal(text) | RoutePatternPart::Separator(text) => {
                        if !context.accept(text, true) {
                            return None;
                        }
                    }
                    RoutePatternPart::Parameter(parameter) => {
                        let value = remaining.remove(parameter.name());
                        let explicit_default = self.pattern.defaults().get(parameter.name());
                        let same_as_default = match (&value, explicit_default) {
                            (Some(v), Some(default)) => route_value_eq(v, default),
                            _ => false,
                        };
                        let text = value
                            .as_ref()
                            .map(|v| v.as_invariant_str().into_owned())
                            .unwrap_or_default();

                        if same_as_default {
                            if !context.buffer(&text, parameter.encode_slashes()) {
                                return None;
                            }
                        } else if !context.accept(&text, parameter.encode_slashes()) {
                            let after_separator = j > 0
                                && parameter.is_optional()
                                && matches!(parts[j - 1], RoutePatternPart::Separator(_));
                            if after_separator {
                                context.remove_last();
                            } else {
                                return None;
                            }
                        }
                    }
                }
            }
            context.end_segment();
        }

        let mut path = String::with_capacity(context.path.len() + 1);
        path.push('/');
        path.push_str(&context.path);

        let mut query = String::new();
        for (key, value) in &remaining {
            if self.pattern.defaults().contains_key(key) {
                continue;
            }
            let text = value.as_invariant_str();
            if text.is_empty() {
                continue;
            }
            query.push(if query.is_empty() { '?' } else { '&' });
            query.push_str(&urlencoding::encode(key));
            query.push('=');
            query.push_str(&urlencoding::encode(&text));
        }

        if options.lowercase_urls {
            path = path.to_lowercase();
            if options.lowercase_query_strings {
                query = query.to_lowercase();
            }
        }
        if options.append_trailing_slash && !path.ends_with('/') {
            path.push('/');
        }

        Some(BoundUrl { path, query })
    }

    /// `get_values`, constraints and rendering in one call.
    #[must_use]
    pub fn bind(
        &self,
        ambient: Option<&RouteValueDictionary>,
        values: &RouteValueDictionary,
        options: &ResolvedLinkOptions,
    ) -> Option<BoundUrl> {
        let result = self.get_values(ambient, values)?;
        self.try_process_constraints(&result.combined_values).ok()?;
        self.try_bind_values(&result.accepted_values, options)
    }
}

/// Percent-encode `value` into `out`. With `encode_slashes == false`, `/` is
/// kept as a separator.
fn encode_into(out: &mut String, value: &str, encode_slashes: bool) {
    if encode_slashes {
        out.push_str(&urlencoding::encode(value));
        return;
    }
    for (i, piece) in value.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&urlencoding::encode(piece));
    }
}

/// Text waiting to be written; `None` means raw, `Some(encode_slashes)` means encode.
type Pending = (String, Option<bool>);

/// Incremental path writer. Parameter values equal to their defaults are
/// buffered and only written once something non-default follows them.
#[derive(Debug, Default)]
struct UriBuildingContext {
    path: String,
    buffer: Vec<Pending>,
    uri_inside: bool,
    buffer_inside: bool,
    has_empty_segment: bool,
    last_value_offset: Option<usize>,
}

impl UriBuildingContext {
    fn accept(&mut self, value: &str, encode_slashes: bool) -> bool {
        if value.is_empty() {
            if self.uri_inside || self.buffer_inside {
                // No empty part inside a segment.
                return false;
            }
            self.has_empty_segment = true;
            return true;
        }
        if self.has_empty_segment {
            // No text after an empty segment.
            return false;
        }

        for (text, encoding) in self.buffer.drain(..) {
            match encoding {
                Some(slashes) => encode_into(&mut self.path, &text, slashes),
                None => self.path.push_str(&text),
            }
        }

        if !self.uri_inside && !self.buffer_inside && !self.path.is_empty() {
            self.path.push('/');
        }
        self.buffer_inside = true;
        self.uri_inside = true;
        self.last_value_offset = Some(self.path.len());

        if self.path.is_empty() {
            if let Some(rest) = value.strip_prefix('/') {
                self.path.push('/');
                encode_into(&mut self.path, rest, encode_slashes);
                return true;
            }
        }
        encode_into(&mut self.path, value, encode_slashes);
        true
    }

    fn buffer(&mut self, value: &str, encode_slashes: bool) -> bool {
        if value.is_empty() {
            if self.buffer_inside {
                return false;
            }
            self.has_empty_segment = true;
            return true;
        }
        if self.has_empty_segment {
            return false;
        }
        if self.uri_inside {
            // Part of this segment is already written; write the rest.
            return self.accept(value, encode_slashes);
        }
        if !self.buffer_inside {
            if !self.path.is_empty() || !self.buffer.is_empty() {
                self.buffer.push(("/".to_string(), None));
            }
            self.buffer_inside = true;
        }
        self.buffer.push((value.to_string(), Some(encode_slashes)));
        true
    }

    /// Drop the most recently accepted value (an optional parameter's separator).
    fn remove_last(&mut self) {
        if let Some(offset) = self.last_value_offset.take() {
            self.path.truncate(offset);
        }
    }

    fn end_segment(&mut self) {
        self.buffer_inside = false;
        self.uri_inside = false;
    }
}
