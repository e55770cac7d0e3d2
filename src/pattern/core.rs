//! Route pattern model: segments, parts, and the immutable [`RoutePattern`].

use crate::constraints::RouteConstraint;
use crate::values::{RouteValue, RouteValueDictionary};
use std::fmt;
use std::sync::Arc;

/// How a parameter binds to path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// `{name}`: exactly one (part of a) segment.
    Standard,
    /// `{name?}`: may be absent.
    Optional,
    /// `{*name}` / `{**name}`: the remainder of the path.
    CatchAll,
}

/// A reference to a parameter policy: either inline text still to be resolved
/// by the [`ConstraintResolver`](crate::constraints::ConstraintResolver), or a
/// ready-made constraint instance.
#[derive(Clone)]
pub enum ParameterPolicyReference {
    /// Inline constraint text, e.g. `int` or `range(1,10)`, kept verbatim.
    Content(String),
    /// A constraint instance supplied out of line.
    Constraint(Arc<dyn RouteConstraint>),
}

impl ParameterPolicyReference {
    /// The inline text, if this reference still needs resolving.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            ParameterPolicyReference::Content(text) => Some(text),
            ParameterPolicyReference::Constraint(_) => None,
        }
    }
}

impl fmt::Debug for ParameterPolicyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterPolicyReference::Content(text) => write!(f, "Content({text:?})"),
            ParameterPolicyReference::Constraint(c) => write!(f, "Constraint({c:?})"),
        }
    }
}

impl PartialEq for ParameterPolicyReference {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Content(a), Self::Content(b)) => a == b,
            (Self::Constraint(a), Self::Constraint(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ParameterPolicyReference {
    fn from(text: &str) -> Self {
        ParameterPolicyReference::Content(text.to_string())
    }
}

impl From<Arc<dyn RouteConstraint>> for ParameterPolicyReference {
    fn from(constraint: Arc<dyn RouteConstraint>) -> Self {
        ParameterPolicyReference::Constraint(constraint)
    }
}

/// A `{parameter}` part of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePatternParameterPart {
    pub(crate) name: String,
    pub(crate) default: Option<RouteValue>,
    pub(crate) kind: ParameterKind,
    pub(crate) policies: Vec<ParameterPolicyReference>,
    pub(crate) encode_slashes: bool,
}

impl RoutePatternParameterPart {
    pub(crate) fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind,
            policies: Vec::new(),
            encode_slashes: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default(&self) -> Option<&RouteValue> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    #[must_use]
    pub fn policies(&self) -> &[ParameterPolicyReference] {
        &self.policies
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.kind == ParameterKind::Optional
    }

    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.kind == ParameterKind::CatchAll
    }

    /// False only for `{**name}` catch-alls, whose values keep their `/`s when rendered.
    #[must_use]
    pub fn encode_slashes(&self) -> bool {
        self.encode_slashes
    }

    /// A value may be omitted for this parameter.
    pub(crate) fn can_be_absent(&self) -> bool {
        self.kind != ParameterKind::Standard || self.default.is_some()
    }
}

/// One part of a path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePatternPart {
    Literal(String),
    /// The `.` in front of a trailing optional parameter (`{name}.{ext?}`).
    Separator(String),
    Parameter(RoutePatternParameterPart),
}

impl RoutePatternPart {
    #[must_use]
    pub fn as_parameter(&self) -> Option<&RoutePatternParameterPart> {
        match self {
            RoutePatternPart::Parameter(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_parameter(&self) -> bool {
        matches!(self, RoutePatternPart::Parameter(_))
    }

    /// Literal or separator text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            RoutePatternPart::Literal(t) | RoutePatternPart::Separator(t) => Some(t),
            RoutePatternPart::Parameter(_) => None,
        }
    }
}

/// A `/`-delimited path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePatternPathSegment {
    pub(crate) parts: Vec<RoutePatternPart>,
}

impl RoutePatternPathSegment {
    #[must_use]
    pub fn parts(&self) -> &[RoutePatternPart] {
        &self.parts
    }

    /// A single part (literal or parameter) spanning the whole segment.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    /// The segment's parameter when it is simple and a parameter.
    #[must_use]
    pub fn simple_parameter(&self) -> Option<&RoutePatternParameterPart> {
        if self.is_simple() {
            self.parts[0].as_parameter()
        } else {
            None
        }
    }

    /// The segment's literal text when it is simple and literal.
    #[must_use]
    pub fn simple_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [RoutePatternPart::Literal(text)] => Some(text),
            _ => None,
        }
    }

    pub(crate) fn render(&self, out: &mut String) {
        for part in &self.parts {
            match part {
                RoutePatternPart::Literal(text) | RoutePatternPart::Separator(text) => {
                    for c in text.chars() {
                        match c {
                            '{' => out.push_str("{{"),
                            '}' => out.push_str("}}"),
                            _ => out.push(c),
                        }
                    }
                }
                RoutePatternPart::Parameter(p) => render_parameter(p, out),
            }
        }
    }

    pub(crate) fn to_text(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }
}

fn render_parameter(p: &RoutePatternParameterPart, out: &mut String) {
    out.push('{');
    if p.is_catch_all() {
        out.push_str(if p.encode_slashes { "*" } else { "**" });
    }
    out.push_str(&p.name);
    for policy in &p.policies {
        if let Some(text) = policy.content() {
            out.push(':');
            out.push_str(&text.replace('{', "{{").replace('}', "}}"));
        }
    }
    if let Some(default) = &p.default {
        out.push('=');
        out.push_str(&default.as_invariant_str());
    }
    if p.is_optional() {
        out.push('?');
    }
    out.push('}');
}

/// Parsed, immutable representation of a route template.
///
/// Created by [`parse`](super::parse), [`parse_with`](super::parse_with) or
/// [`combine`](super::combine); never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePattern {
    pub(crate) raw_text: String,
    pub(crate) defaults: RouteValueDictionary,
    pub(crate) parameter_policies: Vec<(String, Vec<ParameterPolicyReference>)>,
    pub(crate) required_values: RouteValueDictionary,
    pub(crate) parameters: Vec<RoutePatternParameterPart>,
    pub(crate) path_segments: Vec<RoutePatternPathSegment>,
    pub(crate) inbound_precedence: f64,
    pub(crate) outbound_precedence: u64,
}

impl RoutePattern {
    /// The template text this pattern was created from.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    #[must_use]
    pub fn path_segments(&self) -> &[RoutePatternPathSegment] {
        &self.path_segments
    }

    /// Every parameter in template order.
    #[must_use]
    pub fn parameters(&self) -> &[RoutePatternParameterPart] {
        &self.parameters
    }

    #[must_use]
    pub fn get_parameter(&self, name: &str) -> Option<&RoutePatternParameterPart> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Inline and out-of-line defaults, including defaults for keys that are not parameters.
    #[must_use]
    pub fn defaults(&self) -> &RouteValueDictionary {
        &self.defaults
    }

    #[must_use]
    pub fn parameter_policies(&self) -> &[(String, Vec<ParameterPolicyReference>)] {
        &self.parameter_policies
    }

    #[must_use]
    pub fn policies_for(&self, name: &str) -> &[ParameterPolicyReference] {
        self.parameter_policies
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map_or(&[], |(_, v)| v.as_slice())
    }

    /// Values this pattern demands for link generation (e.g. `controller=Home`).
    #[must_use]
    pub fn required_values(&self) -> &RouteValueDictionary {
        &self.required_values
    }

    /// Lower is more specific; used to order inbound candidates.
    #[must_use]
    pub fn inbound_precedence(&self) -> f64 {
        self.inbound_precedence
    }

    /// Higher is more specific; used to order link-generation candidates.
    #[must_use]
    pub fn outbound_precedence(&self) -> u64 {
        self.outbound_precedence
    }

    #[must_use]
    pub fn catch_all(&self) -> Option<&RoutePatternParameterPart> {
        self.parameters.iter().find(|p| p.is_catch_all())
    }

    /// Re-render the template from the parsed structure.
    ///
    /// Parsing the rendered text yields a pattern with the same segments.
    #[must_use]
    pub fn render_template(&self) -> String {
        let mut out = String::with_capacity(self.raw_text.len() + 1);
        out.push('/');
        for (i, segment) in self.path_segments.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            segment.render(&mut out);
        }
        out
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_text)
    }
}
