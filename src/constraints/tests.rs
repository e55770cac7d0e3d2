use super::builtin::*;
use super::*;
use crate::error::RouteError;
use crate::pattern;
use crate::values::{RouteValue, RouteValueDictionary};
use std::sync::Arc;

fn check(constraint: &dyn RouteConstraint, value: &str) -> bool {
    let values = RouteValueDictionary::from([("p", value)]);
    constraint.matches("p", &values, RouteDirection::IncomingRequest)
}

fn resolve(spec: &str) -> Arc<dyn RouteConstraint> {
    ConstraintResolver::default()
        .resolve(spec)
        .expect("resolve")
        .expect("known constraint")
}

#[test]
fn test_numeric_constraints() {
    assert!(check(&IntRouteConstraint, "42"));
    assert!(check(&IntRouteConstraint, "-7"));
    assert!(!check(&IntRouteConstraint, "abc"));
    assert!(!check(&IntRouteConstraint, "3000000000"));
    assert!(check(&LongRouteConstraint, "3000000000"));
    assert!(check(&DecimalRouteConstraint, "1.5"));
    assert!(!check(&DecimalRouteConstraint, "inf"));
    assert!(check(&DoubleRouteConstraint, "1e3"));
    assert!(check(&FloatRouteConstraint, "0.25"));
}

#[test]
fn test_bool_guid_alpha() {
    assert!(check(&BoolRouteConstraint, "TRUE"));
    assert!(!check(&BoolRouteConstraint, "yes"));
    assert!(check(&GuidRouteConstraint, "67e55044-10b1-426f-9247-bb680e5fe0c8"));
    assert!(check(&GuidRouteConstraint, "{67e55044-10b1-426f-9247-bb680e5fe0c8}"));
    assert!(!check(&GuidRouteConstraint, "not-a-guid"));
    assert!(check(&AlphaRouteConstraint, "abcXYZ"));
    assert!(!check(&AlphaRouteConstraint, "abc1"));
}

#[test]
fn test_missing_value_fails_most_constraints() {
    let values = RouteValueDictionary::new();
    assert!(!IntRouteConstraint.matches("p", &values, RouteDirection::UrlGeneration));
    assert!(!RequiredRouteConstraint.matches("p", &values, RouteDirection::UrlGeneration));
    assert!(NonFileNameRouteConstraint.matches("p", &values, RouteDirection::UrlGeneration));
}

#[test]
fn test_file_constraints() {
    assert!(check(&FileNameRouteConstraint, "docs/readme.md"));
    assert!(check(&FileNameRouteConstraint, ".gitignore"));
    assert!(!check(&FileNameRouteConstraint, "docs/readme."));
    assert!(!check(&FileNameRouteConstraint, "v1.0/docs"));
    assert!(check(&NonFileNameRouteConstraint, "v1.0/docs"));
}

#[test]
fn test_resolver_builds_argument_constraints() {
    assert!(check(resolve("min(5)").as_ref(), "5"));
    assert!(!check(resolve("min(5)").as_ref(), "4"));
    assert!(check(resolve("max(5)").as_ref(), "5"));
    assert!(check(resolve("range(1, 3)").as_ref(), "2"));
    assert!(!check(resolve("range(1,3)").as_ref(), "4"));
    assert!(check(resolve("length(3)").as_ref(), "abc"));
    assert!(check(resolve("length(2,4)").as_ref(), "abcd"));
    assert!(!check(resolve("length(2,4)").as_ref(), "abcde"));
    assert!(check(resolve("minlength(2)").as_ref(), "ab"));
    assert!(!check(resolve("maxlength(2)").as_ref(), "abc"));
    assert!(check(resolve("INT").as_ref(), "1"));
}

#[test]
fn test_regex_receives_verbatim_arguments() {
    let constraint = resolve(r"regex(^\d{3},\d{3}$)");
    assert!(check(constraint.as_ref(), "123,456"));
    assert!(!check(constraint.as_ref(), "123456"));

    // Case-insensitive and unanchored.
    let loose = resolve("regex(abc)");
    assert!(check(loose.as_ref(), "xxABCxx"));
}

#[test]
fn test_resolver_unknown_key_is_none() {
    let resolver = ConstraintResolver::default();
    assert!(resolver.resolve("nope").unwrap().is_none());
    assert!(resolver.resolve("nope(1)").unwrap().is_none());
}

#[test]
fn test_resolver_construction_errors() {
    let resolver = ConstraintResolver::default();
    assert!(matches!(
        resolver.resolve("min(abc)"),
        Err(RouteError::ConstraintConstruction { .. })
    ));
    assert!(matches!(
        resolver.resolve("range(5,1)"),
        Err(RouteError::ConstraintConstruction { .. })
    ));
    assert!(matches!(
        resolver.resolve("regex((unclosed)"),
        Err(RouteError::ConstraintConstruction { .. })
    ));
    assert!(matches!(
        resolver.resolve("length"),
        Err(RouteError::ConstraintConstruction { .. })
    ));
}

#[derive(Debug)]
struct PrefixConstraint(String);

impl RouteConstraint for PrefixConstraint {
    fn matches(&self, key: &str, values: &RouteValueDictionary, _: RouteDirection) -> bool {
        values
            .get_str(key)
            .is_some_and(|v| v.starts_with(self.0.as_str()))
    }
}

fn prefix_map() -> ConstraintMap {
    let mut map = ConstraintMap::with_defaults();
    map.insert(
        "prefixed",
        vec![
            ConstraintConstructor::new(0, |_| {
                Ok(Arc::new(PrefixConstraint("plain-".to_string())) as Arc<dyn RouteConstraint>)
            }),
            ConstraintConstructor::with_services(0, &["tenant"], |_, services| {
                let tenant = services[0]
                    .downcast_ref::<String>()
                    .ok_or_else(|| "tenant service must be a String".to_string())?;
                Ok(Arc::new(PrefixConstraint(format!("{tenant}-"))) as Arc<dyn RouteConstraint>)
            }),
        ],
    );
    map
}

#[test]
fn test_resolver_prefers_constructor_with_most_services() {
    let services = ServiceCollection::new().with("tenant", Arc::new("acme".to_string()));
    let resolver = ConstraintResolver::new(Arc::new(prefix_map()), Arc::new(services));
    let constraint = resolver.resolve("prefixed").unwrap().unwrap();
    assert!(check(constraint.as_ref(), "acme-1"));

    let without = ConstraintResolver::new(Arc::new(prefix_map()), Arc::new(NoServices));
    let constraint = without.resolve("prefixed").unwrap().unwrap();
    assert!(check(constraint.as_ref(), "plain-1"));
}

#[test]
fn test_resolver_reports_ambiguity() {
    let mut map = ConstraintMap::empty();
    map.insert(
        "twice",
        vec![
            ConstraintConstructor::new(1, |_| {
                Ok(Arc::new(IntRouteConstraint) as Arc<dyn RouteConstraint>)
            }),
            ConstraintConstructor::new(1, |_| {
                Ok(Arc::new(AlphaRouteConstraint) as Arc<dyn RouteConstraint>)
            }),
        ],
    );
    let resolver = ConstraintResolver::new(Arc::new(map), Arc::new(NoServices));
    assert!(matches!(
        resolver.resolve("twice(1)"),
        Err(RouteError::AmbiguousConstraint { arity: 1, .. })
    ));
}

#[test]
fn test_build_constraints_composes_and_wraps_optional() {
    let p = pattern::parse("/{id:int:min(10)}/{page:int?}").unwrap();
    let set = build_constraints(&p, &ConstraintResolver::default()).unwrap();
    assert_eq!(set.len(), 2);

    let mut values = RouteValueDictionary::from([("id", "12")]);
    assert!(RouteConstraintMatcher::matches(&set, &values, RouteDirection::IncomingRequest));

    values.insert("id", "5");
    assert!(!RouteConstraintMatcher::matches(&set, &values, RouteDirection::IncomingRequest));

    values.insert("id", "12");
    values.insert("page", "x");
    assert!(!RouteConstraintMatcher::matches(&set, &values, RouteDirection::IncomingRequest));

    values.insert("page", RouteValue::Null);
    assert!(RouteConstraintMatcher::matches(&set, &values, RouteDirection::IncomingRequest));
}

#[test]
fn test_build_constraints_unknown_key() {
    let p = pattern::parse("/{id:bogus}").unwrap();
    let err = build_constraints(&p, &ConstraintResolver::default()).unwrap_err();
    assert_eq!(
        err,
        RouteError::UnknownConstraint {
            parameter: "id".to_string(),
            constraint: "bogus".to_string()
        }
    );
}

#[test]
fn test_empty_constraint_set_passes() {
    assert!(RouteConstraintMatcher::matches(
        &[],
        &RouteValueDictionary::new(),
        RouteDirection::UrlGeneration
    ));
}

#[test]
fn test_out_of_line_constraint_instance_is_used_as_is() {
    let constraint: Arc<dyn RouteConstraint> =
        Arc::new(RegexRouteConstraint::anchored("[a-z]+").unwrap());
    let policies = vec![(
        "slug".to_string(),
        vec![pattern::ParameterPolicyReference::from(constraint)],
    )];
    let p = pattern::parse_with(
        "/{slug}",
        &RouteValueDictionary::new(),
        &policies,
        &RouteValueDictionary::new(),
    )
    .unwrap();
    let set = build_constraints(&p, &ConstraintResolver::default()).unwrap();
    let ok = RouteValueDictionary::from([("slug", "hello")]);
    let bad = RouteValueDictionary::from([("slug", "hello-world")]);
    assert!(RouteConstraintMatcher::matches(&set, &ok, RouteDirection::IncomingRequest));
    assert!(!RouteConstraintMatcher::matches(&set, &bad, RouteDirection::IncomingRequest));
}
