use super::*;
use crate::error::RouteError;
use crate::values::{RouteValue, RouteValueDictionary};

fn parameter<'a>(pattern: &'a RoutePattern, name: &str) -> &'a RoutePatternParameterPart {
    pattern.get_parameter(name).expect("parameter")
}

fn policy_texts(part: &RoutePatternParameterPart) -> Vec<&str> {
    part.policies()
        .iter()
        .filter_map(ParameterPolicyReference::content)
        .collect()
}

#[test]
fn test_parse_literal_segments() {
    let p = parse("/api/users").unwrap();
    assert_eq!(p.path_segments().len(), 2);
    assert_eq!(p.path_segments()[0].simple_literal(), Some("api"));
    assert_eq!(p.path_segments()[1].simple_literal(), Some("users"));
    assert!(p.parameters().is_empty());
}

#[test]
fn test_parse_strips_prefixes() {
    for template in ["api/{id}", "/api/{id}", "~/api/{id}"] {
        let p = parse(template).unwrap();
        assert_eq!(p.path_segments().len(), 2, "{template}");
        assert_eq!(p.raw_text(), template);
    }
    assert!(parse("~api").is_err());
}

#[test]
fn test_parse_empty_and_root() {
    assert!(parse("").unwrap().path_segments().is_empty());
    assert!(parse("/").unwrap().path_segments().is_empty());
}

#[test]
fn test_parse_parameter_forms() {
    let p = parse("/{controller=Home}/{action}/{id?}").unwrap();
    let controller = parameter(&p, "controller");
    assert_eq!(controller.default(), Some(&RouteValue::from("Home")));
    assert_eq!(controller.kind(), ParameterKind::Standard);
    assert_eq!(parameter(&p, "id").kind(), ParameterKind::Optional);
    assert_eq!(p.defaults().get_str("controller").as_deref(), Some("Home"));
}

#[test]
fn test_parse_catch_all_variants() {
    let encoded = parse("/files/{*path}").unwrap();
    let part = parameter(&encoded, "path");
    assert!(part.is_catch_all());
    assert!(part.encode_slashes());

    let raw = parse("/files/{**path}").unwrap();
    assert!(!parameter(&raw, "path").encode_slashes());
}

#[test]
fn test_parse_inline_constraints_are_verbatim() {
    let p = parse("/{id:int:min(1)}").unwrap();
    assert_eq!(policy_texts(parameter(&p, "id")), vec!["int", "min(1)"]);
    assert_eq!(p.policies_for("ID").len(), 2);
}

#[test]
fn test_constraint_arguments_keep_commas_and_parens() {
    let p = parse(r"/{p:regex(\d{{3}},\d{{3}})}").unwrap();
    assert_eq!(policy_texts(parameter(&p, "p")), vec![r"regex(\d{3},\d{3})"]);

    let nested = parse("/{p:regex(^(a|b)$)}").unwrap();
    assert_eq!(policy_texts(parameter(&nested, "p")), vec!["regex(^(a|b)$)"]);
}

#[test]
fn test_constraint_closing_paren_requires_terminator() {
    // The first `)` is followed by text, so it does not close the argument list.
    let p = parse("/{p:regex(a)b)}").unwrap();
    assert_eq!(policy_texts(parameter(&p, "p")), vec!["regex(a)b)"]);
}

#[test]
fn test_constraint_followed_by_default_and_optional() {
    let p = parse("/{p:length(2,4)=abc}").unwrap();
    let part = parameter(&p, "p");
    assert_eq!(policy_texts(part), vec!["length(2,4)"]);
    assert_eq!(part.default(), Some(&RouteValue::from("abc")));

    let q = parse("/{q:int?}").unwrap();
    let part = parameter(&q, "q");
    assert!(part.is_optional());
    assert_eq!(policy_texts(part), vec!["int"]);
}

#[test]
fn test_default_may_contain_separators() {
    let p = parse("/{p=a:b=c}").unwrap();
    assert_eq!(parameter(&p, "p").default(), Some(&RouteValue::from("a:b=c")));
}

#[test]
fn test_unbalanced_constraint_parenthesis_fails() {
    let err = parse("/{p:regex(abc}").unwrap_err();
    assert!(matches!(err, RouteError::Template { .. }));
}

#[test]
fn test_escaped_braces_in_literals() {
    let p = parse("/{{literal}}").unwrap();
    assert_eq!(p.path_segments()[0].simple_literal(), Some("{literal}"));
    assert!(p.parameters().is_empty());
}

#[test]
fn test_complex_segment_and_separator() {
    let p = parse("/{name}.{ext?}").unwrap();
    let parts = p.path_segments()[0].parts();
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[1], RoutePatternPart::Separator(s) if s == "."));

    let fixed = parse("/{name}.{ext}").unwrap();
    assert!(matches!(
        &fixed.path_segments()[0].parts()[1],
        RoutePatternPart::Literal(s) if s == "."
    ));
}

#[test]
fn test_invalid_templates() {
    let cases = [
        "/{a}{b}",
        "/a//b",
        "/{*a}/b",
        "/x{*a}",
        "/{*a?}",
        "/{a",
        "/a}",
        "/{}",
        "/{a/b}",
        "/a?b",
        "/{p1?}.{p2}",
        "/{p1}.abc.{p2?}",
        "/{*a*}",
    ];
    for template in cases {
        assert!(parse(template).is_err(), "expected '{template}' to fail");
    }
}

#[test]
fn test_duplicate_parameter_names_case_insensitive() {
    let err = parse("/{id}/{ID}").unwrap_err();
    assert!(matches!(err, RouteError::DuplicateParameter { ref name, .. } if name == "ID"));
    assert!(err.to_string().contains("appears more than one time"));
}

#[test]
fn test_optional_with_default_is_rejected() {
    let err = parse("/{p=x?}").unwrap_err();
    assert_eq!(
        err,
        RouteError::OptionalWithDefault {
            parameter: "p".to_string()
        }
    );
}

#[test]
fn test_parse_with_out_of_line_defaults() {
    let defaults = RouteValueDictionary::from([("id", "5"), ("area", "admin")]);
    let p = parse_with("/{id}", &defaults, &[], &RouteValueDictionary::new()).unwrap();
    assert_eq!(parameter(&p, "id").default(), Some(&RouteValue::from("5")));
    assert_eq!(p.defaults().get_str("area").as_deref(), Some("admin"));
}

#[test]
fn test_parse_with_conflicting_default() {
    let defaults = RouteValueDictionary::from([("id", "6")]);
    let err = parse_with("/{id=5}", &defaults, &[], &RouteValueDictionary::new()).unwrap_err();
    assert!(matches!(err, RouteError::ConflictingDefault { .. }));

    let same = RouteValueDictionary::from([("id", "5")]);
    assert!(parse_with("/{id=5}", &same, &[], &RouteValueDictionary::new()).is_ok());
}

#[test]
fn test_parse_with_default_on_optional_fails() {
    let defaults = RouteValueDictionary::from([("id", "6")]);
    let err = parse_with("/{id?}", &defaults, &[], &RouteValueDictionary::new()).unwrap_err();
    assert!(matches!(err, RouteError::OptionalWithDefault { .. }));
}

#[test]
fn test_parse_with_policies_precede_inline() {
    let policies = vec![("id".to_string(), vec![ParameterPolicyReference::from("min(1)")])];
    let p = parse_with(
        "/{id:int}",
        &RouteValueDictionary::new(),
        &policies,
        &RouteValueDictionary::new(),
    )
    .unwrap();
    assert_eq!(policy_texts(parameter(&p, "id")), vec!["min(1)", "int"]);
}

#[test]
fn test_parse_with_empty_policy_is_invalid() {
    let policies = vec![("id".to_string(), vec![ParameterPolicyReference::from("")])];
    let err = parse_with(
        "/{id}",
        &RouteValueDictionary::new(),
        &policies,
        &RouteValueDictionary::new(),
    )
    .unwrap_err();
    assert!(matches!(err, RouteError::InvalidConstraintReference { .. }));
}

#[test]
fn test_required_values_validation() {
    let defaults = RouteValueDictionary::from([("controller", "Home")]);
    let ok = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    assert!(parse_with("/{action}", &defaults, &[], &ok).is_ok());

    let empty = RouteValueDictionary::from([("area", RouteValue::Null)]);
    assert!(parse_with("/x", &RouteValueDictionary::new(), &[], &empty).is_ok());

    let bad = RouteValueDictionary::from([("controller", "Store")]);
    let err = parse_with("/{action}", &defaults, &[], &bad).unwrap_err();
    assert!(matches!(err, RouteError::InvalidRequiredValue { ref key, .. } if key == "controller"));
}

#[test]
fn test_precedence_orders_literals_first() {
    let literal = parse("/a/b").unwrap();
    let constrained = parse("/a/{x:int}").unwrap();
    let parameter = parse("/a/{x}").unwrap();
    let catch_all = parse("/a/{*x}").unwrap();

    assert!(literal.inbound_precedence() < constrained.inbound_precedence());
    assert!(constrained.inbound_precedence() < parameter.inbound_precedence());
    assert!(parameter.inbound_precedence() < catch_all.inbound_precedence());

    assert!(literal.outbound_precedence() > constrained.outbound_precedence());
    assert!(constrained.outbound_precedence() > parameter.outbound_precedence());
    assert!(parameter.outbound_precedence() > catch_all.outbound_precedence());

    assert_eq!(literal.outbound_precedence(), 55);
    assert!((literal.inbound_precedence() - 1.1).abs() < 1e-9);
}

#[test]
fn test_out_of_line_policy_raises_precedence() {
    let policies = vec![("x".to_string(), vec![ParameterPolicyReference::from("int")])];
    let p = parse_with(
        "/a/{x}",
        &RouteValueDictionary::new(),
        &policies,
        &RouteValueDictionary::new(),
    )
    .unwrap();
    assert_eq!(
        p.inbound_precedence(),
        parse("/a/{x:int}").unwrap().inbound_precedence()
    );
}

#[test]
fn test_combine_without_prefix_is_identity() {
    for template in ["/", "/a/{b}", "/{c=1}/{d:int?}", "/files/{**rest}", "/{a}-{b}.xml"] {
        let p = parse(template).unwrap();
        assert_eq!(combine(None, &p).unwrap(), p);
    }
}

#[test]
fn test_render_template_round_trips_structure() {
    for template in [
        "/a/{b}",
        "/{c=1}/{d:int?}",
        "/files/{**rest}",
        "/{a}-{b}.xml",
        "/{name}.{ext?}",
        "/{{x}}/{p:regex(^\\d{{3}}$)}",
    ] {
        let p = parse(template).unwrap();
        let reparsed = parse(&p.render_template()).unwrap();
        assert_eq!(reparsed.path_segments(), p.path_segments(), "{template}");
        assert_eq!(reparsed.parameters(), p.parameters(), "{template}");
    }
}

#[test]
fn test_combine_joins_with_slash() {
    let prefix = parse("/api/{version}").unwrap();
    let suffix = parse("users/{id:int}").unwrap();
    let combined = combine(Some(&prefix), &suffix).unwrap();
    assert_eq!(combined.raw_text(), "/api/{version}/users/{id:int}");
    assert_eq!(combined.path_segments().len(), 4);
    assert_eq!(combined.parameters().len(), 2);
    assert_eq!(
        combined.path_segments(),
        parse("/api/{version}/users/{id:int}").unwrap().path_segments()
    );
}

#[test]
fn test_combine_root_prefix() {
    let prefix = parse("/").unwrap();
    let suffix = parse("/users").unwrap();
    assert_eq!(combine(Some(&prefix), &suffix).unwrap().raw_text(), "/users");

    let empty_suffix = parse("").unwrap();
    let api = parse("/api").unwrap();
    assert_eq!(combine(Some(&api), &empty_suffix).unwrap().raw_text(), "/api");
}

#[test]
fn test_combine_merges_segment_continuation() {
    let prefix = parse("/files/report").unwrap();
    let suffix = parse("-final").unwrap();
    let combined = combine(Some(&prefix), &suffix).unwrap();
    assert_eq!(combined.raw_text(), "/files/report-final");
    assert_eq!(combined.path_segments().len(), 2);
    assert_eq!(combined.path_segments()[1].simple_literal(), Some("report-final"));
}

#[test]
fn test_combine_unions_defaults_and_detects_conflicts() {
    let prefix = parse_with(
        "/{tenant}",
        &RouteValueDictionary::from([("tenant", "acme")]),
        &[],
        &RouteValueDictionary::new(),
    )
    .unwrap();
    let suffix = parse("/{id=1}").unwrap();
    let combined = combine(Some(&prefix), &suffix).unwrap();
    assert_eq!(combined.defaults().get_str("tenant").as_deref(), Some("acme"));
    assert_eq!(combined.defaults().get_str("id").as_deref(), Some("1"));

    let conflicting = parse("/{x}/{tenant=other}").unwrap();
    let err = combine(Some(&prefix), &conflicting).unwrap_err();
    assert!(matches!(err, RouteError::ConflictingDefault { .. }));
}

#[test]
fn test_combine_rejects_duplicate_parameters() {
    let prefix = parse("/{id}").unwrap();
    let suffix = parse("/{id}").unwrap();
    assert!(matches!(
        combine(Some(&prefix), &suffix),
        Err(RouteError::DuplicateParameter { .. })
    ));
}

#[test]
fn test_combine_rejects_catch_all_prefix() {
    let prefix = parse("/{*rest}").unwrap();
    let suffix = parse("/more").unwrap();
    assert!(combine(Some(&prefix), &suffix).is_err());
}

#[test]
fn test_combine_filter_policy_applies_to_suffix_parameter() {
    let policies = vec![("id".to_string(), vec![ParameterPolicyReference::from("int")])];
    let prefix = parse_with(
        "/api",
        &RouteValueDictionary::new(),
        &policies,
        &RouteValueDictionary::new(),
    )
    .unwrap();
    let suffix = parse("/{id}").unwrap();
    let combined = combine(Some(&prefix), &suffix).unwrap();
    assert_eq!(policy_texts(parameter(&combined, "id")), vec!["int"]);
}

#[test]
fn test_combine_unions_required_values() {
    let prefix = parse_with(
        "/admin",
        &RouteValueDictionary::from([("area", "admin")]),
        &[],
        &RouteValueDictionary::from([("area", "admin")]),
    )
    .unwrap();
    let suffix = parse("/{action}").unwrap();
    let combined = combine(Some(&prefix), &suffix).unwrap();
    assert_eq!(combined.required_values().get_str("area").as_deref(), Some("admin"));
}
