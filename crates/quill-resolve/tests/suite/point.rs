use pretty_assertions::assert_eq;
use quill_resolve::{
    Applicability, ArgumentList, CandidateFailureReason, ConstructorResolver, ImportScope,
    ResolutionResult, TypeReference,
};
use quill_types::{ClassId, ConstructorDef, ParamDef, Type, TypeEnv, TypeStore};

use super::class;

fn point_world() -> (TypeStore, ClassId) {
    let mut env = TypeStore::with_minimal_jdk();
    let map = Type::class(env.well_known().map, vec![]);
    let def = class(
        &env,
        "com.example.Point",
        vec![
            ConstructorDef::new(vec![]),
            ConstructorDef::new(vec![ParamDef::new("coords", map)]),
        ],
    );
    let id = env.add_class(def);
    (env, id)
}

fn picked(result: &ResolutionResult) -> Vec<(ClassId, Option<usize>)> {
    result
        .iter()
        .map(|r| (r.candidate.owner.class, r.candidate.index))
        .collect()
}

#[test]
fn named_arguments_pick_the_map_constructor() {
    let (env, point) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);

    let args = ArgumentList::new()
        .with_named("x", Type::int())
        .with_named("y", Type::int());
    let result = resolver.resolve_constructor(&TypeReference::new("Point"), &args, false);

    assert_eq!(picked(&result), vec![(point, Some(1))]);
    assert_eq!(result.results[0].applicability, Applicability::Applicable);
}

#[test]
fn empty_call_picks_the_no_argument_constructor() {
    let (env, point) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);

    let result =
        resolver.resolve_constructor(&TypeReference::new("Point"), &ArgumentList::new(), false);

    assert_eq!(picked(&result), vec![(point, Some(0))]);
}

#[test]
fn positional_call_without_matching_arity_is_empty() {
    let (env, _) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);

    let args = ArgumentList::positional([Type::int(), Type::int()]);
    let result = resolver.resolve_constructor(&TypeReference::new("Point"), &args, false);

    assert!(result.is_empty());
    assert_eq!(result.rejected.len(), 2);
    assert!(result
        .rejected
        .iter()
        .all(|r| matches!(r.reason, CandidateFailureReason::WrongArity { found: 2, .. })));
}

#[test]
fn unresolved_reference_is_empty_for_every_argument_shape() {
    let (env, _) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);
    let missing = TypeReference::new("Missing");

    let shapes = [
        ArgumentList::new(),
        ArgumentList::positional([Type::int()]),
        ArgumentList::new().with_named("x", Type::int()),
        ArgumentList::new()
            .with_named("x", Type::int())
            .with_expr(Type::int()),
    ];
    for args in &shapes {
        assert!(resolver.resolve_constructor(&missing, args, false).is_empty());
        assert!(resolver.resolve_constructor(&missing, args, true).is_empty());
    }
}

#[test]
fn incomplete_code_returns_every_candidate_unchecked() {
    let (env, point) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);

    let args = ArgumentList::positional([Type::boolean(), Type::boolean(), Type::boolean()]);
    let result = resolver.resolve_constructor(&TypeReference::new("Point"), &args, true);

    assert_eq!(picked(&result), vec![(point, Some(0)), (point, Some(1))]);
    assert!(result
        .iter()
        .all(|r| r.applicability == Applicability::Unchecked));
}

#[test]
fn resolution_is_idempotent() {
    let (env, _) = point_world();
    let scope = ImportScope::new(&env).with_package("com.example");
    let resolver = ConstructorResolver::new(&env, &scope);
    let reference = TypeReference::new("Point");

    for args in [
        ArgumentList::new(),
        ArgumentList::new().with_named("x", Type::int()),
        ArgumentList::positional([Type::int(), Type::int()]),
    ] {
        let first = resolver.resolve_constructor(&reference, &args, false);
        let second = resolver.resolve_constructor(&reference, &args, false);
        assert_eq!(first, second);
    }
}
