use pretty_assertions::assert_eq;
use quill_resolve::{
    ArgumentList, CandidateFailureReason, ConstructorResolver, ImportScope, ResolveOptions,
    TypeReference,
};
use quill_types::{ConstructorDef, MapLiteralType, ParamDef, Type, TypeEnv, TypeStore};

use super::{class, named};

fn xy() -> ArgumentList {
    ArgumentList::new()
        .with_named("x", Type::int())
        .with_named("y", Type::int())
}

fn resolve_indices(env: &TypeStore, name: &str, args: &ArgumentList) -> Vec<Option<usize>> {
    let scope = ImportScope::new(env);
    let resolver = ConstructorResolver::new(env, &scope);
    resolver
        .resolve_constructor(&TypeReference::new(name), args, false)
        .iter()
        .map(|r| r.candidate.index)
        .collect()
}

#[test]
fn map_only_constructor_accepts_named_arguments() {
    let mut env = TypeStore::with_minimal_jdk();
    let map = Type::class(env.well_known().map, vec![]);
    let def = class(
        &env,
        "Settings",
        vec![ConstructorDef::new(vec![ParamDef::new("values", map)])],
    );
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Settings", &xy()), vec![Some(0)]);
}

#[test]
fn no_argument_constructor_accepts_named_arguments_as_properties() {
    let mut env = TypeStore::with_minimal_jdk();
    let string = named(&env, "java.lang.String");
    let def = class(
        &env,
        "Bean",
        vec![
            ConstructorDef::new(vec![ParamDef::new("label", string)]),
            ConstructorDef::new(vec![]),
        ],
    );
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Bean", &xy()), vec![Some(1)]);
}

#[test]
fn implicit_constructor_accepts_named_arguments() {
    let mut env = TypeStore::with_minimal_jdk();
    let def = class(&env, "Plain", vec![]);
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Plain", &xy()), vec![None]);
}

#[test]
fn map_constructor_takes_precedence_over_no_argument_constructor() {
    let mut env = TypeStore::with_minimal_jdk();
    let hash_map = named(&env, "java.util.HashMap");
    let def = class(
        &env,
        "Both",
        vec![
            ConstructorDef::new(vec![]),
            ConstructorDef::new(vec![ParamDef::new("values", hash_map)]),
        ],
    );
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Both", &xy()), vec![Some(1)]);
}

#[test]
fn object_parameter_does_not_count_as_a_map_parameter() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = named(&env, "java.lang.Object");
    let def = class(
        &env,
        "Holder",
        vec![
            ConstructorDef::new(vec![ParamDef::new("value", object)]),
            ConstructorDef::new(vec![]),
        ],
    );
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Holder", &xy()), vec![Some(1)]);
}

#[test]
fn object_parameter_accepts_the_map_when_nothing_else_does() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = named(&env, "java.lang.Object");
    let def = class(
        &env,
        "Holder",
        vec![ConstructorDef::new(vec![ParamDef::new("value", object)])],
    );
    env.add_class(def);

    assert_eq!(resolve_indices(&env, "Holder", &xy()), vec![Some(0)]);
}

#[test]
fn generic_map_parameter_accepts_heterogeneous_values() {
    let mut env = TypeStore::with_minimal_jdk();
    let wk = env.well_known().clone();
    let map = Type::class(
        wk.map,
        vec![Type::class(wk.string, vec![]), Type::class(wk.object, vec![])],
    );
    let def = class(
        &env,
        "Record",
        vec![ConstructorDef::new(vec![ParamDef::new("fields", map)])],
    );
    env.add_class(def);

    let args = ArgumentList::new()
        .with_named("name", Type::class(wk.string, vec![]))
        .with_named("age", Type::int());
    assert_eq!(resolve_indices(&env, "Record", &args), vec![Some(0)]);
}

#[test]
fn unmatched_named_call_reports_the_synthetic_map() {
    let mut env = TypeStore::with_minimal_jdk();
    let string = named(&env, "java.lang.String");
    let def = class(
        &env,
        "Label",
        vec![ConstructorDef::new(vec![ParamDef::new("text", string.clone())])],
    );
    env.add_class(def);

    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope);
    let args = ArgumentList::new().with_named("text", Type::int());
    let result = resolver.resolve_constructor(&TypeReference::new("Label"), &args, false);

    assert!(result.is_empty());
    assert_eq!(
        result.rejected[0].reason,
        CandidateFailureReason::ArgumentConversion {
            arg_index: 0,
            from: Type::MapLiteral(MapLiteralType::new(vec![(
                "text".to_string(),
                Type::int()
            )])),
            to: string,
        }
    );
}

#[test]
fn mixed_arguments_ignore_named_group_by_default() {
    let mut env = TypeStore::with_minimal_jdk();
    let map = Type::class(env.well_known().map, vec![]);
    let def = class(
        &env,
        "Widget",
        vec![
            ConstructorDef::new(vec![ParamDef::new("id", Type::int())]),
            ConstructorDef::new(vec![
                ParamDef::new("attrs", map),
                ParamDef::new("id", Type::int()),
            ]),
        ],
    );
    env.add_class(def);

    let args = ArgumentList::new()
        .with_named("color", Type::int())
        .with_expr(Type::int());
    assert_eq!(resolve_indices(&env, "Widget", &args), vec![Some(0)]);

    let scope = ImportScope::new(&env);
    let resolver = ConstructorResolver::new(&env, &scope).with_options(ResolveOptions {
        named_args_as_leading_map: true,
        ..ResolveOptions::default()
    });
    let indices: Vec<_> = resolver
        .resolve_constructor(&TypeReference::new("Widget"), &args, false)
        .iter()
        .map(|r| r.candidate.index)
        .collect();
    assert_eq!(indices, vec![Some(1)]);
}
