use points::PointId;
use solving::Type;
use solving::core::TypeParameter;
use solving::error::ErrorKind;
use tests_integration::{ProgramBuilder, bound, has_type, hypothesis, instantiate, trace};

struct Fixture {
    builder: ProgramBuilder,
    show: PointId,
    s: TypeParameter,
    number: Type,
    text: Type,
}

fn fixture() -> Fixture {
    let mut builder = ProgramBuilder::default();
    let show = builder.point("Show");
    let s = builder.parameter("S");
    let number = builder.declare("Number");
    let text = builder.declare("Text");
    Fixture { builder, show, s, number, text }
}

#[test]
fn test_non_default_preferred() {
    let Fixture { mut builder, show, s, number, .. } = fixture();
    let u = builder.parameter("U");
    let show_number = builder.instance("Show Number", show, [(s.clone(), number.clone())]);
    builder.default_instance("Show any", show, [(s.clone(), Type::parameter(u))]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(has_type(x, number.clone()));
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, show_number);
    assert!(!resolved.error);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    x :: Number
    show x: Show Number => Show Number
    ");
}

#[test]
fn test_ambiguous_bound_unresolved() {
    let Fixture { mut builder, show, s, number, text } = fixture();
    builder.instance("Show Number", show, [(s.clone(), number)]);
    builder.instance("Show Text", show, [(s.clone(), text)]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    assert!(solved.lookup_resolved(call).is_empty());
    assert_eq!(solved.lookup_unresolved(call).len(), 1);
    assert!(solved.lookup_types(x).is_empty());

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @"error at show x: unresolved Show _");
}

/// An ambiguous tier does not stop the search: a lower tier with a unique
/// match still resolves the bound. This mirrors the established resolution
/// order; whether ambiguity should instead be reported at the tier where it
/// occurs is unsettled.
#[test]
fn test_ambiguous_tier_falls_through_to_default() {
    let Fixture { mut builder, show, s, number, text } = fixture();
    let u = builder.parameter("U");
    builder.instance("Show Number", show, [(s.clone(), number)]);
    builder.instance("Show Text", show, [(s.clone(), text)]);
    let show_any = builder.default_instance("Show any", show, [(s.clone(), Type::parameter(u))]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, show_any);
    assert!(solved.lookup_unresolved(call).is_empty());

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @"show x: Show _ => Show any");
}

#[test]
fn test_default_used_when_nothing_else_matches() {
    let Fixture { mut builder, show, s, number, text } = fixture();
    let u = builder.parameter("U");
    builder.instance("Show Number", show, [(s.clone(), number)]);
    let show_any = builder.default_instance("Show any", show, [(s.clone(), Type::parameter(u))]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(has_type(x, text.clone()));
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, show_any);
    assert_eq!(solved.lookup_types(x), [text]);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    U', x :: Text
    show x: Show Text => Show any
    ");
}

#[test]
fn test_missing_instance_unresolved() {
    let Fixture { mut builder, show, s, text, .. } = fixture();
    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(has_type(x, text));
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    let [error] = &solved.errors[..] else { panic!("expected one error") };
    assert_eq!(error.point, call);
    assert!(matches!(error.kind, ErrorKind::UnresolvedBound { .. }));
}

#[test]
fn test_inferred_parameter_flows_back() {
    let mut builder = ProgramBuilder::default();
    let add = builder.point("Add");
    let l = builder.parameter("L");
    let r = builder.parameter("R");
    let o = builder.inferred("O");
    let number = builder.declare("Number");

    let substitutions = [
        (l.clone(), number.clone()),
        (r.clone(), number.clone()),
        (o.clone(), number.clone()),
    ];
    let add_number = builder.instance("Add Number", add, substitutions);

    let x = builder.point("x");
    let y = builder.point("y");
    let z = builder.point("z");
    let call = builder.point("x + y");
    builder.top_level(has_type(x, number.clone()));
    builder.top_level(has_type(y, number.clone()));
    builder.top_level(bound(
        call,
        add,
        [(l, Type::Point(x)), (r, Type::Point(y)), (o, Type::Point(z))],
    ));

    let solved = builder.solve();

    assert_eq!(solved.lookup_types(z), [number]);
    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, add_number);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    x :: Number
    y :: Number
    z :: Number
    x + y: Add Number Number Number => Add Number
    ");
}

#[test]
fn test_where_clause_is_implied() {
    let Fixture { mut builder, show, s, number, text } = fixture();
    builder.instance("Show Number", show, [(s.clone(), number.clone())]);

    let f = builder.point("f");
    let t = builder.parameter_in(f, "T");
    let body = builder.point_in(f, "show t");
    let clause = builder.point_in(f, "where Show T");
    let call = builder.point("f 1");

    let parameter = Type::parameter(t.clone());
    builder.define(
        f,
        [
            has_type(f, Type::function([parameter.clone()], text.clone())),
            bound(body, show, [(s.clone(), parameter.clone())]),
            hypothesis(clause, show, [(s.clone(), parameter)]),
        ],
    );
    builder.top_level(instantiate(call, f));
    builder.top_level(has_type(call, Type::function([number.clone()], text)));

    let solved = builder.solve();

    // Inside the template, the hypothesis satisfies the bound without a fact.
    assert!(solved.lookup_resolved(body).is_empty());
    assert!(solved.lookup_unresolved(body).is_empty());
    assert!(solved.lookup_resolved(clause).is_empty());

    let body_call = builder.instantiated(body, call);
    let t_call = builder.instantiated(t.source, call);
    assert_eq!(solved.lookup_types(t_call), [number]);
    assert_eq!(solved.lookup_resolved(body_call).len(), 1);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    f :: T -> Text
    T' :: Number
    f 1 :: Number -> Text
    show t': Show Number => Show Number
    where Show T': Show Number => Show Number
    ");
}

#[test]
fn test_missing_where_clause_unresolved() {
    let Fixture { mut builder, show, s, number, .. } = fixture();
    builder.instance("Show Number", show, [(s.clone(), number)]);

    let g = builder.point("g");
    let t = builder.parameter_in(g, "T");
    let body = builder.point_in(g, "show t");
    builder.define(g, [bound(body, show, [(s, Type::parameter(t))])]);

    let solved = builder.solve();

    assert_eq!(solved.lookup_unresolved(body).len(), 1);
    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @"error at show t: unresolved Show T");
}

#[test]
fn test_recursive_instance_bounds() {
    let Fixture { mut builder, show, s, number, .. } = fixture();
    let list = builder.point("List");
    let e = builder.parameter("E");

    let show_number = builder.instance("Show Number", show, [(s.clone(), number.clone())]);
    let element = Type::parameter(e.clone());
    let show_list = builder.instance(
        "Show (List E)",
        show,
        [(s.clone(), Type::named(list, [element.clone()]))],
    );
    let clause = builder.point_in(show_list, "where Show E");
    builder.define(show_list, [hypothesis(clause, show, [(s.clone(), element)])]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(has_type(x, Type::named(list, [number.clone()])));
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let solved = builder.solve();

    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, show_list);

    let clause_call = builder.instantiated(clause, call);
    let [resolved] = solved.lookup_resolved(clause_call) else {
        panic!("expected one resolution")
    };
    assert_eq!(resolved.instance, show_number);
    assert!(solved.errors.is_empty());

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    E' :: Number
    x :: List Number
    where Show E': Show Number => Show Number
    show x: Show (List Number) => Show (List E)
    ");
}

#[test]
fn test_error_instance_reported() {
    let Fixture { mut builder, show, s, text, .. } = fixture();
    let m = builder.inferred("Message");
    let message = Type::message("cannot show text");
    let substitutions = [(s.clone(), text.clone()), (m.clone(), message)];
    let show_text = builder.error_instance("Show Text", show, substitutions);

    let x = builder.point("x");
    let reason = builder.point("reason");
    let call = builder.point("show x");
    builder.top_level(has_type(x, text));
    builder.top_level(bound(call, show, [(s, Type::Point(x)), (m, Type::Point(reason))]));

    let solved = builder.solve();

    let [resolved] = solved.lookup_resolved(call) else { panic!("expected one resolution") };
    assert_eq!(resolved.instance, show_text);
    assert!(resolved.error);
    assert_eq!(solved.lookup_types(reason), [Type::message("cannot show text")]);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r#"
    x :: Text
    reason :: "cannot show text"
    show x: Show Text "cannot show text" => Show Text
    error at show x: Show Text "cannot show text" => Show Text
    "#);
}

#[test]
fn test_self_reference_and_hypothesis_skipped() {
    let Fixture { mut builder, show, s, number, .. } = fixture();
    let x = builder.point("x");
    let clause = builder.point("where Show x");
    builder.top_level(bound(show, show, [(s.clone(), Type::Point(x))]));
    builder.top_level(hypothesis(clause, show, [(s, number)]));

    let solved = builder.solve();

    assert!(solved.resolved.is_empty());
    assert!(solved.unresolved.is_empty());
    assert!(solved.errors.is_empty());
}

#[test]
#[should_panic(expected = "invariant violated")]
fn test_missing_parameter_panics() {
    let mut builder = ProgramBuilder::default();
    let pair = builder.point("Pair");
    let a = builder.parameter("A");
    let b = builder.parameter("B");
    let number = builder.declare("Number");
    builder.instance("Pair Number", pair, [(a.clone(), number.clone()), (b, number)]);

    let x = builder.point("x");
    let call = builder.point("pair x");
    builder.top_level(bound(call, pair, [(a, Type::Point(x))]));

    builder.solve();
}

#[test]
#[should_panic(expected = "invariant violated")]
fn test_inferred_parameter_missing_from_bound_panics() {
    let mut builder = ProgramBuilder::default();
    let add = builder.point("Add");
    let l = builder.parameter("L");
    let o = builder.inferred("O");
    let number = builder.declare("Number");
    builder.instance("Add Number", add, [(l.clone(), number.clone()), (o, number)]);

    let x = builder.point("x");
    let call = builder.point("x + x");
    builder.top_level(bound(call, add, [(l, Type::Point(x))]));

    builder.solve();
}

#[test]
fn test_resolution_is_traced() {
    let Fixture { mut builder, show, s, number, .. } = fixture();
    builder.instance("Show Number", show, [(s.clone(), number.clone())]);

    let x = builder.point("x");
    let call = builder.point("show x");
    builder.top_level(has_type(x, number));
    builder.top_level(bound(call, show, [(s, Type::Point(x))]));

    let (solved, output) = trace::with_capture(tracing::Level::DEBUG, || builder.solve());

    assert_eq!(solved.lookup_resolved(call).len(), 1);
    assert!(output.contains("resolved"));
    assert!(output.contains("NonDefault"));
}
