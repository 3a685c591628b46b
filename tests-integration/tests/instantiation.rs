use solving::Type;
use tests_integration::{
    ProgramBuilder, default_type, has_type, has_type_when_instantiated, instantiate, scope_limited,
};

#[test]
fn test_call_sites_are_fresh() {
    let mut builder = ProgramBuilder::default();
    let g = builder.point("g");
    let a = builder.point_in(g, "a");
    let first = builder.point("g 1");
    let second = builder.point("g 2");

    builder.define(g, [has_type(g, Type::function([Type::Point(a)], Type::Point(a)))]);
    builder.top_level(instantiate(first, g));
    builder.top_level(instantiate(second, g));

    let solved = builder.solve();

    // Both references to `a` within one call share a single copy.
    let a_first = builder.instantiated(a, first);
    let a_second = builder.instantiated(a, second);
    assert_ne!(a_first, a_second);
    assert_eq!(builder.points.original(a_first), a);

    let expected = Type::function([Type::Point(a_first)], Type::Point(a_first));
    assert_eq!(solved.lookup_types(first), [expected]);

    // The definition itself is mapped onto the call site rather than copied.
    assert!(builder.points.iter().all(|(_, data)| data.instantiated_from != Some(g)));
}

#[test]
fn test_default_applies_without_other_constraints() {
    let mut builder = ProgramBuilder::default();
    let number = builder.declare("Number");
    let text = builder.declare("Text");
    let f = builder.point("f");
    let t = builder.parameter_in(f, "T");
    let first = builder.point("f x");
    let second = builder.point("f y");

    let identity = Type::function([Type::parameter(t.clone())], Type::parameter(t.clone()));
    builder.define(f, [has_type(f, identity), default_type(t.source, number.clone())]);

    builder.top_level(instantiate(first, f));
    builder.top_level(instantiate(second, f));
    builder.top_level(has_type(second, Type::function([text.clone()], text.clone())));

    let solved = builder.solve();

    let t_first = builder.instantiated(t.source, first);
    let t_second = builder.instantiated(t.source, second);
    assert_eq!(solved.lookup_types(t_first), [number.clone()]);
    assert_eq!(solved.lookup_types(t_second), [text.clone()]);

    // Defaults are inert inside the template.
    assert!(solved.lookup_types(t.source).is_empty());

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    f :: T -> T
    T' :: Number
    T' :: Text
    f x :: Number -> Number
    f y :: Text -> Text
    ");
}

#[test]
fn test_scope_limited_stays_in_template() {
    let mut builder = ProgramBuilder::default();
    let number = builder.declare("Number");
    let h = builder.point("h");
    let a = builder.point_in(h, "a");
    let call = builder.point("h ()");

    builder.define(
        h,
        [
            has_type(h, Type::function([], Type::Point(a))),
            scope_limited(has_type(a, number.clone())),
        ],
    );
    builder.top_level(instantiate(call, h));

    let solved = builder.solve();

    assert_eq!(solved.lookup_types(a), [number.clone()]);
    assert_eq!(solved.lookup_types(h), [Type::function([], number)]);

    let a_call = builder.instantiated(a, call);
    assert!(solved.lookup_types(a_call).is_empty());
    assert_eq!(solved.lookup_types(call), [Type::function([], Type::Point(a_call))]);
}

#[test]
fn test_instantiated_only_constraint() {
    let mut builder = ProgramBuilder::default();
    let text = builder.declare("Text");
    let k = builder.point("k");
    let b = builder.point_in(k, "b");
    let call = builder.point("k ()");

    builder.define(k, [has_type(k, Type::Point(b)), has_type_when_instantiated(b, text.clone())]);
    builder.top_level(instantiate(call, k));

    let solved = builder.solve();

    assert!(solved.lookup_types(k).is_empty());
    assert!(solved.lookup_types(b).is_empty());
    assert_eq!(solved.lookup_types(call), [text]);
}

#[test]
fn test_nested_instantiation() {
    let mut builder = ProgramBuilder::default();
    let number = builder.declare("Number");
    let inner = builder.point("inner");
    let p = builder.point_in(inner, "p");
    let outer = builder.point("outer");
    let use_inner = builder.point_in(outer, "inner p");
    let call = builder.point("outer 1");
    let r = builder.point("r");

    let identity = Type::function([Type::Point(p)], Type::Point(p));
    builder.define(inner, [has_type(inner, identity)]);
    builder.define(
        outer,
        [instantiate(use_inner, inner), has_type(outer, Type::Point(use_inner))],
    );

    builder.top_level(instantiate(call, outer));
    builder.top_level(has_type(call, Type::function([number.clone()], Type::Point(r))));

    let solved = builder.solve();

    let use_inner_call = builder.instantiated(use_inner, call);
    let p_call = builder.instantiated(p, use_inner_call);
    assert_eq!(solved.lookup_types(p_call), [number.clone()]);
    assert_eq!(solved.lookup_types(r), [number]);
    assert!(solved.errors.is_empty());
}

#[test]
fn test_foreign_points_are_shared() {
    let mut builder = ProgramBuilder::default();
    let number = builder.declare("Number");
    let g = builder.point("g");
    let pi = builder.point("pi");
    let call = builder.point("g ()");

    builder.define(g, [has_type(g, Type::function([], Type::Point(pi)))]);
    builder.top_level(has_type(pi, number.clone()));
    builder.top_level(instantiate(call, g));

    let solved = builder.solve();

    // `pi` is not owned by `g`, so every call site sees the same point.
    assert!(builder.points.iter().all(|(_, data)| data.instantiated_from != Some(pi)));
    assert_eq!(solved.lookup_types(call), [Type::function([], number)]);

    let report = builder.report(&solved);
    insta::assert_snapshot!(report, @r"
    g :: () -> _
    pi :: Number
    g () :: () -> Number
    ");
}
