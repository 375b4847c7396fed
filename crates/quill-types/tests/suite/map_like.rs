use quill_types::{
    is_map_like, ClassDef, ClassKind, JavaTypeSystem, Type, TypeEnv, TypeStore, TypeSystem,
};

#[test]
fn map_and_its_subtypes_are_map_like() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();
    let hash_map = env.lookup_class("java.util.HashMap").unwrap();

    assert!(is_map_like(&env, &Type::class(wk.map, vec![])));
    assert!(is_map_like(&env, &Type::class(hash_map, vec![])));
    assert!(is_map_like(&env, &Type::class(wk.linked_hash_map, vec![])));
    assert!(is_map_like(&env, &Type::Named("java.util.Map".to_string())));
    assert!(!is_map_like(&env, &Type::class(wk.object, vec![])));
    assert!(!is_map_like(&env, &Type::class(wk.string, vec![])));
}

#[test]
fn user_defined_map_subclass_is_map_like() {
    let mut env = TypeStore::with_minimal_jdk();
    let hash_map = env.lookup_class("java.util.HashMap").unwrap();
    let config = env.add_class(ClassDef {
        name: "com.example.Config".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(hash_map, vec![])),
        interfaces: vec![],
        constructors: vec![],
    });

    let types = JavaTypeSystem::new(&env);
    assert!(types.is_map_like(&Type::class(config, vec![])));
}

#[test]
fn type_var_bounded_by_map_is_map_like() {
    let mut env = TypeStore::with_minimal_jdk();
    let map = Type::class(env.well_known().map, vec![]);
    let m = env.add_type_param("M", vec![map]);
    let plain = env.add_type_param("T", vec![]);

    assert!(is_map_like(&env, &Type::TypeVar(m)));
    assert!(!is_map_like(&env, &Type::TypeVar(plain)));
}
