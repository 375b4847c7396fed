use pretty_assertions::assert_eq;
use quill_resolve::{
    Applicability, ArgumentList, ConstructorResolver, ImportScope, NewExpression, NewTarget,
    TypeReference,
};
use quill_types::{
    format_type, ClassId, ClassKind, ConstructorDef, ParamDef, PrimitiveType, Span, Type, TypeEnv,
    TypeStore,
};

use super::{class, named};

fn shapes_world() -> (TypeStore, ClassId) {
    let mut env = TypeStore::with_minimal_jdk();
    let string = named(&env, "java.lang.String");
    let def = class(
        &env,
        "geo.Shape",
        vec![
            ConstructorDef::new(vec![]),
            ConstructorDef::new(vec![ParamDef::new("name", string)]),
        ],
    );
    let shape = env.add_class(def);
    (env, shape)
}

#[test]
fn array_creation_wraps_type_and_has_no_constructor() {
    let (env, shape) = shapes_world();
    let scope = ImportScope::new(&env).with_import("geo.Shape");
    let resolver = ConstructorResolver::new(&env, &scope);

    let expr = NewExpression::array(NewTarget::Reference(TypeReference::new("Shape")), 2);
    assert_eq!(
        resolver.new_expression_type(&expr),
        Type::class(shape, vec![]).with_array_dims(2)
    );
    assert!(resolver.resolve_new_expression(&expr, false).is_empty());
    assert_eq!(resolver.resolve_new_expression(&expr, true).len(), 2);
}

#[test]
fn builtin_targets_have_a_type_but_no_constructors() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);

    let expr = NewExpression::array(NewTarget::Builtin(PrimitiveType::Int), 1);
    assert_eq!(resolver.new_expression_type(&expr), Type::array(Type::int()));
    assert!(resolver.resolve_new_expression(&expr, true).is_empty());
    assert!(resolver.diagnostics(&expr).is_empty());
}

#[test]
fn anonymous_class_has_its_base_type() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);

    let expr = NewExpression::new(
        TypeReference::parse("ArrayList<String>").unwrap(),
        ArgumentList::new(),
    )
    .with_anonymous_body();
    assert_eq!(
        format_type(&env, &resolver.new_expression_type(&expr)),
        "ArrayList<String>"
    );
    assert_eq!(resolver.resolve_new_expression(&expr, false).len(), 1);
}

#[test]
fn unresolved_reference_keeps_its_name_as_type() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);

    let expr = NewExpression::new(TypeReference::new("Missing"), ArgumentList::new());
    assert_eq!(
        resolver.new_expression_type(&expr),
        Type::Named("Missing".to_string())
    );
}

#[test]
fn missing_argument_list_resolves_only_in_incomplete_mode() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env).with_import("geo.*");
    let resolver = ConstructorResolver::new(&env, &scope);

    let expr = NewExpression::without_arguments(TypeReference::new("Shape"));
    assert!(resolver.resolve_new_expression(&expr, false).is_empty());

    let incomplete = resolver.resolve_new_expression(&expr, true);
    assert_eq!(incomplete.len(), 2);
    assert!(incomplete
        .iter()
        .all(|r| r.applicability == Applicability::Unchecked));
}

#[test]
fn call_variants_list_every_constructor() {
    let (env, shape) = shapes_world();
    let scope = ImportScope::new(&env).with_import("geo.*");
    let resolver = ConstructorResolver::new(&env, &scope);

    let variants = resolver.call_variants(&TypeReference::new("Shape"));
    let signatures: Vec<_> = variants
        .iter()
        .map(|v| quill_resolve::format_constructor_signature(&env, &v.candidate))
        .collect();
    assert_eq!(signatures, vec!["Shape()", "Shape(String)"]);
    assert!(variants.iter().all(|v| v.candidate.owner.class == shape));

    assert!(resolver
        .call_variants(&TypeReference::new("Missing"))
        .is_empty());
}

#[test]
fn is_reference_to_checks_the_unique_target() {
    let (env, shape) = shapes_world();
    let scope = ImportScope::new(&env).with_import("geo.*");
    let resolver = ConstructorResolver::new(&env, &scope);
    let string = named(&env, "java.lang.String");

    let expr = NewExpression::new(
        TypeReference::new("Shape"),
        ArgumentList::positional([string]),
    );
    assert!(resolver.is_reference_to(&expr, shape, Some(1)));
    assert!(!resolver.is_reference_to(&expr, shape, Some(0)));
    assert!(!resolver.is_reference_to(&expr, env.well_known().object, Some(1)));
}

#[test]
fn interfaces_and_enums_have_no_constructors() {
    let mut env = TypeStore::with_minimal_jdk();
    let mut color = class(&env, "Color", vec![ConstructorDef::new(vec![])]);
    color.kind = ClassKind::Enum;
    env.add_class(color);

    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);
    for name in ["Color", "List", "Map"] {
        let reference = TypeReference::new(name);
        assert_eq!(resolver.resolve_type(&reference).len(), 1, "{name} resolves");
        assert!(resolver
            .resolve_constructor(&reference, &ArgumentList::new(), true)
            .is_empty());
    }
}

#[test]
fn diagnostics_explain_failed_resolution() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env).with_import("geo.*");
    let resolver = ConstructorResolver::new(&env, &scope);
    let span = Span::new(4, 20);

    let missing =
        NewExpression::new(TypeReference::new("Missing"), ArgumentList::new()).with_span(span);
    let diags = resolver.diagnostics(&missing);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "unresolved-type");
    assert_eq!(diags[0].span, Some(span));

    let wrong = NewExpression::new(
        TypeReference::new("Shape"),
        ArgumentList::positional([Type::int()]),
    );
    let diags = resolver.diagnostics(&wrong);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "unresolved-constructor");
    assert_eq!(
        diags[0].message,
        "unresolved constructor `Shape` with arguments (int)\n\n\
         candidates:\n  \
         - Shape()\n    wrong arity: expected 0, found 1\n  \
         - Shape(String)\n    argument 1: cannot convert from int to String"
    );

    let ok = NewExpression::new(TypeReference::new("Shape"), ArgumentList::new());
    assert!(resolver.diagnostics(&ok).is_empty());
}

#[test]
fn diagnostics_report_ambiguous_constructors() {
    let mut env = TypeStore::with_minimal_jdk();
    let string = named(&env, "java.lang.String");
    let integer = named(&env, "java.lang.Integer");
    let def = class(
        &env,
        "Either",
        vec![
            ConstructorDef::new(vec![ParamDef::new("left", string)]),
            ConstructorDef::new(vec![ParamDef::new("right", integer)]),
        ],
    );
    env.add_class(def);

    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);
    let expr = NewExpression::new(
        TypeReference::new("Either"),
        ArgumentList::positional([Type::Null]),
    );

    let diags = resolver.diagnostics(&expr);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "ambiguous-constructor");
    assert_eq!(
        diags[0].message,
        "ambiguous constructor call `Either`\n\ncandidates:\n  - Either(String)\n  - Either(Integer)"
    );
}

#[test]
fn anonymous_class_over_an_interface_calls_object() {
    let (env, _) = shapes_world();
    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);
    let object = env.well_known().object;

    let expr = NewExpression::new(
        TypeReference::parse("Comparable<String>").unwrap(),
        ArgumentList::new(),
    )
    .with_anonymous_body();
    assert_eq!(
        format_type(&env, &resolver.new_expression_type(&expr)),
        "Comparable<String>"
    );
    let result = resolver.resolve_new_expression(&expr, false);
    assert_eq!(result.len(), 1);
    assert_eq!(result.results[0].candidate.owner.class, object);
    assert_eq!(result.results[0].candidate.index, None);
    assert!(resolver.diagnostics(&expr).is_empty());

    // Without a body the interface itself has nothing to call.
    let plain = NewExpression::new(
        TypeReference::parse("Comparable<String>").unwrap(),
        ArgumentList::new(),
    );
    assert!(resolver.resolve_new_expression(&plain, false).is_empty());

    let with_args = NewExpression::new(
        TypeReference::parse("Comparable<String>").unwrap(),
        ArgumentList::positional([Type::int()]),
    )
    .with_anonymous_body();
    let diags = resolver.diagnostics(&with_args);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "unresolved-constructor");
}

#[test]
fn records_without_constructors_get_the_implicit_one() {
    let mut env = TypeStore::with_minimal_jdk();
    let mut range = class(&env, "Range", vec![]);
    range.kind = ClassKind::Record;
    let range = env.add_class(range);

    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);
    let expr = NewExpression::new(TypeReference::new("Range"), ArgumentList::new());

    let result = resolver.resolve_new_expression(&expr, false);
    assert_eq!(result.len(), 1);
    assert_eq!(result.results[0].candidate.owner.class, range);
    assert_eq!(result.results[0].candidate.index, None);
    assert!(resolver.diagnostics(&expr).is_empty());
}
