//! Decision tree over request path segments.
//!
//! Candidates are sorted once by (order, inbound precedence, registration
//! index). The tree is keyed on segment position: at each depth a request
//! segment follows the literal child with the same (case-insensitive) text,
//! or the parameter child when no literal matches. Parameter and catch-all
//! candidates are copied into every literal child at their depth, so a lookup
//! follows exactly one branch and ends at a node whose candidate list is
//! already in priority order.
//!
//! The tree only narrows candidates; each one is still confirmed by its
//! [`TemplateMatcher`], its constraints and the matcher policies. Trying the
//! narrowed list in order gives the same winner as a linear scan over every
//! candidate.

use super::core::RequestContext;
use super::policy::MatcherPolicy;
use crate::constraints::{
    build_constraints, ConstraintResolver, ConstraintSet, RouteConstraintMatcher, RouteDirection,
};
use crate::endpoint::{Endpoint, SuppressMatchingMetadata};
use crate::error::RouteError;
use crate::template::{decode, TemplateMatcher};
use crate::values::RouteValueDictionary;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// What a pattern segment consumes.
#[derive(Debug, Clone, PartialEq)]
enum SegmentKind {
    /// Lowercased literal text
    Literal(String),
    /// Any single segment; `can_be_absent` for optional or defaulted parameters
    Parameter { can_be_absent: bool },
    /// Literal and parameter parts mixed in one segment
    Complex,
    CatchAll,
}

/// One matchable endpoint.
pub(crate) struct Candidate {
    pub(crate) endpoint: Arc<Endpoint>,
    pub(crate) matcher: TemplateMatcher,
    pub(crate) constraints: ConstraintSet,
    segments: Vec<SegmentKind>,
}

impl Candidate {
    fn new(
        endpoint: Arc<Endpoint>,
        resolver: &ConstraintResolver,
    ) -> Result<Option<Self>, RouteError> {
        let Some(pattern) = endpoint.pattern().cloned() else {
            return Ok(None);
        };
        let constraints = build_constraints(&pattern, resolver)?;
        let segments = pattern
            .path_segments()
            .iter()
            .map(|segment| {
                if let Some(literal) = segment.simple_literal() {
                    SegmentKind::Literal(literal.to_ascii_lowercase())
                } else if let Some(parameter) = segment.simple_parameter() {
                    if parameter.is_catch_all() {
                        SegmentKind::CatchAll
                    } else {
                        SegmentKind::Parameter {
                            can_be_absent: parameter.can_be_absent(),
                        }
                    }
                } else {
                    SegmentKind::Complex
                }
            })
            .collect();
        Ok(Some(Self {
            matcher: TemplateMatcher::new(pattern),
            constraints,
            endpoint,
            segments,
        }))
    }

    /// The segment kind consuming request segment `depth`, if any. A
    /// catch-all keeps consuming past the end of the pattern.
    fn kind_at(&self, depth: usize) -> Option<&SegmentKind> {
        match self.segments.get(depth) {
            Some(kind) => Some(kind),
            None => self.segments.last().filter(|k| **k == SegmentKind::CatchAll),
        }
    }

    /// Whether a request with exactly `depth` segments can match.
    fn can_end_at(&self, depth: usize) -> bool {
        self.segments.iter().skip(depth).all(|kind| {
            matches!(
                kind,
                SegmentKind::CatchAll | SegmentKind::Parameter { can_be_absent: true }
            )
        })
    }

    fn try_match(
        &self,
        segments: &[&str],
        context: &RequestContext,
        policies: &[Arc<dyn MatcherPolicy>],
    ) -> Option<RouteValueDictionary> {
        let mut values = RouteValueDictionary::new();
        if !self.matcher.try_match_segments(segments, &mut values) {
            return None;
        }
        if !RouteConstraintMatcher::matches(
            &self.constraints,
            &values,
            RouteDirection::IncomingRequest,
        ) {
            return None;
        }
        policies
            .iter()
            .all(|policy| policy.accepts(&self.endpoint, context))
            .then_some(values)
    }
}

#[derive(Default)]
struct Node {
    /// Candidates for a request that ends at this depth
    matches: Vec<usize>,
    literals: HashMap<String, Node>,
    parameter: Option<Box<Node>>,
    /// Candidates for a request that continues past a segment no child accepts
    catch_all: Vec<usize>,
}

impl Node {
    fn build(candidates: &[Candidate], set: &[usize], depth: usize) -> Node {
        let mut node = Node {
            matches: set
                .iter()
                .copied()
                .filter(|&i| candidates[i].can_end_at(depth))
                .collect(),
            ..Node::default()
        };

        let mut literal_keys: BTreeSet<&str> = BTreeSet::new();
        let mut has_parameter = false;
        for &i in set {
            match candidates[i].kind_at(depth) {
                Some(SegmentKind::Literal(text)) => {
                    literal_keys.insert(text.as_str());
                }
                Some(SegmentKind::Parameter { .. } | SegmentKind::Complex) => has_parameter = true,
                Some(SegmentKind::CatchAll) => node.catch_all.push(i),
                None => {}
            }
        }

        let is_wild = |i: usize| {
            matches!(
                candidates[i].kind_at(depth),
                Some(SegmentKind::Parameter { .. } | SegmentKind::Complex | SegmentKind::CatchAll)
            )
        };

        for key in literal_keys {
            let child_set: Vec<usize> = set
                .iter()
                .copied()
                .filter(|&i| {
                    is_wild(i)
                        || matches!(
                            candidates[i].kind_at(depth),
                            Some(SegmentKind::Literal(t)) if t == key
                        )
                })
                .collect();
            node.literals
                .insert(key.to_string(), Node::build(candidates, &child_set, depth + 1));
        }

        if has_parameter {
            let child_set: Vec<usize> = set.iter().copied().filter(|&i| is_wild(i)).collect();
            node.parameter = Some(Box::new(Node::build(candidates, &child_set, depth + 1)));
        }

        node
    }

    fn count(&self) -> usize {
        1 + self.literals.values().map(Node::count).sum::<usize>()
            + self.parameter.as_ref().map_or(0, |p| p.count())
    }
}

/// Request matcher built from one endpoint snapshot.
pub struct DfaMatcher {
    candidates: Vec<Candidate>,
    root: Node,
}

impl DfaMatcher {
    /// Build the matcher. Endpoints without a route pattern or with
    /// [`SuppressMatchingMetadata`] are left out.
    ///
    /// # Errors
    ///
    /// Constraint resolution errors ([`RouteError::UnknownConstraint`] and
    /// friends) for any endpoint.
    pub fn build(
        endpoints: &[Arc<Endpoint>],
        resolver: &ConstraintResolver,
    ) -> Result<Self, RouteError> {
        let mut candidates = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if endpoint
                .metadata()
                .get::<SuppressMatchingMetadata>()
                .is_some_and(|m| m.0)
            {
                continue;
            }
            if let Some(candidate) = Candidate::new(Arc::clone(endpoint), resolver)? {
                candidates.push(candidate);
            }
        }

        // Stable sort keeps registration order as the final tie-break.
        candidates.sort_by(|a, b| {
            let pa = a.matcher.pattern();
            let pb = b.matcher.pattern();
            a.endpoint
                .order()
                .cmp(&b.endpoint.order())
                .then_with(|| pa.inbound_precedence().total_cmp(&pb.inbound_precedence()))
        });

        let all: Vec<usize> = (0..candidates.len()).collect();
        let root = Node::build(&candidates, &all, 0);
        Ok(Self { candidates, root })
    }

    /// Candidate indices for a request path, in priority order.
    fn candidate_indices(&self, segments: &[&str]) -> &[usize] {
        let mut node = &self.root;
        for segment in segments {
            let key = decode(segment).to_ascii_lowercase();
            let next = node
                .literals
                .get(&key)
                .or(node.parameter.as_deref());
            match next {
                Some(child) => node = child,
                None => return &node.catch_all,
            }
        }
        &node.matches
    }

    /// First candidate (in priority order) whose pattern, constraints and
    /// policies accept the request.
    pub(crate) fn select(
        &self,
        segments: &[&str],
        context: &RequestContext,
        policies: &[Arc<dyn MatcherPolicy>],
    ) -> Option<(Arc<Endpoint>, RouteValueDictionary)> {
        self.candidate_indices(segments).iter().find_map(|&i| {
            let candidate = &self.candidates[i];
            candidate
                .try_match(segments, context, policies)
                .map(|values| (Arc::clone(&candidate.endpoint), values))
        })
    }

    /// Same as [`select`](Self::select) but tries every candidate.
    #[cfg(test)]
    pub(crate) fn select_linear(
        &self,
        segments: &[&str],
        context: &RequestContext,
        policies: &[Arc<dyn MatcherPolicy>],
    ) -> Option<(Arc<Endpoint>, RouteValueDictionary)> {
        self.candidates.iter().find_map(|candidate| {
            candidate
                .try_match(segments, context, policies)
                .map(|values| (Arc::clone(&candidate.endpoint), values))
        })
    }

    /// Matchable endpoints in priority order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.candidates.iter().map(|c| &c.endpoint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of tree nodes, for diagnostics.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}

impl std::fmt::Debug for DfaMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DfaMatcher")
            .field("candidates", &self.candidates.len())
            .field("nodes", &self.node_count())
            .finish()
    }
}
