use super::decision_tree::LinkDecisionTree;
use crate::constraints::{build_constraints, ConstraintResolver, ConstraintSet};
use crate::endpoint::{
    Endpoint, EndpointId, FallbackMetadata, RouteNameMetadata, SuppressLinkGenerationMetadata,
};
use crate::error::RouteError;
use crate::template::{TemplateBinder, TemplateMatcher};
use crate::values::RouteValueDictionary;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Matcher and constraints used to parse a path back into route values.
#[derive(Debug)]
pub(crate) struct ParseEntry {
    pub(crate) matcher: TemplateMatcher,
    pub(crate) constraints: ConstraintSet,
}

/// Immutable link-generation snapshot of one endpoint list.
///
/// Holds the case-insensitive name map, the required-values decision tree,
/// and lazily built per-endpoint binders and parse matchers. The whole
/// snapshot, caches included, is replaced when the endpoints change.
pub struct LinkIndex {
    /// Link-eligible endpoints in registration order
    endpoints: Vec<Arc<Endpoint>>,
    /// Endpoint name, else route name
    by_name: HashMap<String, Arc<Endpoint>>,
    by_route_name: HashMap<String, Arc<Endpoint>>,
    tree: LinkDecisionTree,
    resolver: ConstraintResolver,
    binders: DashMap<EndpointId, Arc<TemplateBinder>>,
    parsers: DashMap<EndpointId, Arc<ParseEntry>>,
}

/// Map lowercased names to endpoints, failing on the first name (in
/// registration order) that two endpoints share.
fn index_names<'a>(
    endpoints: &'a [Arc<Endpoint>],
    name_of: impl Fn(&'a Endpoint) -> Option<&'a str>,
) -> Result<(HashMap<String, Arc<Endpoint>>, usize), RouteError> {
    let mut grouped: HashMap<String, Vec<&'a Arc<Endpoint>>> = HashMap::new();
    let mut names_in_order: Vec<(String, &'a str)> = Vec::new();
    for endpoint in endpoints {
        if let Some(name) = name_of(endpoint.as_ref()) {
            let key = name.to_lowercase();
            let entry = grouped.entry(key.clone()).or_default();
            if entry.is_empty() {
                names_in_order.push((key, name));
            }
            entry.push(endpoint);
        }
    }
    for (key, name) in &names_in_order {
        let group = &grouped[key];
        if group.len() > 1 {
            return Err(RouteError::DuplicateEndpointName {
                name: (*name).to_string(),
                display_names: group.iter().map(|e| e.display_name()).collect(),
            });
        }
    }
    let count = names_in_order.len();
    let map = grouped
        .into_iter()
        .map(|(key, group)| (key, Arc::clone(group[0])))
        .collect();
    Ok((map, count))
}

fn is_link_eligible(endpoint: &Endpoint) -> bool {
    let Some(pattern) = endpoint.pattern() else {
        return false;
    };
    if endpoint
        .metadata()
        .get::<SuppressLinkGenerationMetadata>()
        .is_some_and(|m| m.0)
    {
        return false;
    }
    endpoint.link_name().is_some() || !pattern.required_values().is_empty()
}

impl LinkIndex {
    /// Index `endpoints`.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateEndpointName`] when two link-eligible endpoints
    /// share a name (compared case-insensitively).
    pub fn build(
        endpoints: &[Arc<Endpoint>],
        resolver: &ConstraintResolver,
    ) -> Result<Self, RouteError> {
        let eligible: Vec<Arc<Endpoint>> = endpoints
            .iter()
            .filter(|e| is_link_eligible(e))
            .cloned()
            .collect();

        let (by_name, named) = index_names(&eligible, Endpoint::link_name)?;
        let (by_route_name, _) = index_names(&eligible, |e| {
            e.metadata().get::<RouteNameMetadata>().map(|m| m.0.as_str())
        })?;

        let required: Vec<RouteValueDictionary> = eligible
            .iter()
            .map(|e| {
                e.pattern()
                    .map(|p| p.required_values().clone())
                    .unwrap_or_default()
            })
            .collect();
        let tree = LinkDecisionTree::build(&required);

        info!(
            endpoints_count = endpoints.len(),
            link_eligible = eligible.len(),
            named,
            "Link generation index built"
        );

        Ok(Self {
            endpoints: eligible,
            by_name,
            by_route_name,
            tree,
            resolver: resolver.clone(),
            binders: DashMap::new(),
            parsers: DashMap::new(),
        })
    }

    /// Link-eligible endpoints in registration order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// The endpoint named `name`, case-insensitively. An endpoint name
    /// shadows the route name of the same endpoint.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Endpoint>> {
        self.by_name.get(&name.to_lowercase())
    }

    /// The endpoint whose [`RouteNameMetadata`] is `name`, case-insensitively.
    #[must_use]
    pub fn find_by_route_name(&self, name: &str) -> Option<&Arc<Endpoint>> {
        self.by_route_name.get(&name.to_lowercase())
    }

    /// Endpoints whose required values are compatible with `values` (then
    /// `ambient`), in link-generation priority order: non-fallback first,
    /// then ascending order, descending outbound precedence and raw text.
    #[must_use]
    pub fn find_by_values(
        &self,
        values: &RouteValueDictionary,
        ambient: Option<&RouteValueDictionary>,
    ) -> Vec<Arc<Endpoint>> {
        let mut matches: Vec<(bool, &Arc<Endpoint>)> = self
            .tree
            .find(values, ambient)
            .into_iter()
            .map(|m| {
                let endpoint = &self.endpoints[m.item];
                let fallback =
                    m.is_fallback || endpoint.metadata().get::<FallbackMetadata>().is_some();
                (fallback, endpoint)
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| compare_for_links(a.1, b.1)));
        matches.into_iter().map(|(_, e)| Arc::clone(e)).collect()
    }

    /// The cached binder for `endpoint`, built on first use.
    ///
    /// # Errors
    ///
    /// Constraint resolution errors for the endpoint's pattern.
    pub(crate) fn binder(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Option<Arc<TemplateBinder>>, RouteError> {
        if let Some(binder) = self.binders.get(&endpoint.id()) {
            return Ok(Some(Arc::clone(binder.value())));
        }
        let Some(pattern) = endpoint.pattern() else {
            return Ok(None);
        };
        let constraints = build_constraints(pattern, &self.resolver)?;
        let binder = Arc::new(TemplateBinder::new(Arc::clone(pattern), constraints));
        Ok(Some(Arc::clone(
            self.binders.entry(endpoint.id()).or_insert(binder).value(),
        )))
    }

    /// The cached parse matcher for `endpoint`, built on first use.
    pub(crate) fn parser(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Option<Arc<ParseEntry>>, RouteError> {
        if let Some(entry) = self.parsers.get(&endpoint.id()) {
            return Ok(Some(Arc::clone(entry.value())));
        }
        let Some(pattern) = endpoint.pattern() else {
            return Ok(None);
        };
        let entry = Arc::new(ParseEntry {
            constraints: build_constraints(pattern, &self.resolver)?,
            matcher: TemplateMatcher::new(Arc::clone(pattern)),
        });
        Ok(Some(Arc::clone(
            self.parsers.entry(endpoint.id()).or_insert(entry).value(),
        )))
    }
}

fn compare_for_links(a: &Endpoint, b: &Endpoint) -> Ordering {
    let (pa, pb) = match (a.pattern(), b.pattern()) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return a.order().cmp(&b.order()),
    };
    a.order()
        .cmp(&b.order())
        .then_with(|| pb.outbound_precedence().cmp(&pa.outbound_precedence()))
        .then_with(|| pa.raw_text().cmp(pb.raw_text()))
}

impl std::fmt::Debug for LinkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkIndex")
            .field("endpoints", &self.endpoints.len())
            .field("names", &self.by_name.len())
            .field("cached_binders", &self.binders.len())
            .finish()
    }
}
