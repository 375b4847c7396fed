use quill_types::{ClassDef, ClassKind, ConstructorDef, ParamDef, Type, TypeEnv, TypeStore};

use pretty_assertions::assert_eq;

#[test]
fn intern_class_id_is_idempotent() {
    let mut store = TypeStore::default();
    let first = store.intern_class_id("com.example.Foo");
    let second = store.intern_class_id("com.example.Foo");
    assert_eq!(first, second);
}

#[test]
fn placeholders_are_not_visible_through_lookup() {
    let mut store = TypeStore::default();
    let id = store.intern_class_id("com.example.Foo");

    assert_eq!(store.class_id("com.example.Foo"), Some(id));
    assert_eq!(store.lookup_class("com.example.Foo"), None);
    assert!(store.class(id).is_none());
    assert!(!store.classes().contains(&id));
}

#[test]
fn define_class_overwrites_placeholder() {
    let mut store = TypeStore::default();
    let id = store.intern_class_id("com.example.Foo");

    let t = store.add_type_param("T", vec![Type::Named("java.lang.Object".to_string())]);
    store.define_class(
        id,
        ClassDef {
            name: "com.example.Foo".to_string(),
            kind: ClassKind::Class,
            type_params: vec![t],
            super_class: None,
            interfaces: vec![],
            constructors: vec![ConstructorDef::new(vec![ParamDef::new(
                "value",
                Type::TypeVar(t),
            )])],
        },
    );

    assert_eq!(store.lookup_class("com.example.Foo"), Some(id));
    let def = store.class(id).expect("class should be defined");
    assert_eq!(def.type_params, vec![t]);
    assert_eq!(def.constructors.len(), 1);
    assert_eq!(def.constructors[0].params[0].name, "value");
}

#[test]
fn upsert_class_overwrites_without_changing_id() {
    let mut store = TypeStore::default();

    let first = store.upsert_class(ClassDef {
        name: "com.example.Bar".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: None,
        interfaces: vec![],
        constructors: vec![],
    });
    let second = store.upsert_class(ClassDef {
        name: "com.example.Bar".to_string(),
        kind: ClassKind::Interface,
        type_params: vec![],
        super_class: None,
        interfaces: vec![],
        constructors: vec![],
    });

    assert_eq!(first, second);
    let def = store.class(first).expect("class should be defined");
    assert_eq!(def.kind, ClassKind::Interface);
}

#[test]
fn implicit_constructor_only_for_classes_and_records() {
    let mut store = TypeStore::with_minimal_jdk();
    let range = store.upsert_class(ClassDef {
        name: "com.example.Range".to_string(),
        kind: ClassKind::Record,
        type_params: vec![],
        super_class: None,
        interfaces: vec![],
        constructors: vec![],
    });
    assert!(store.class(range).unwrap().has_implicit_constructor());

    let object = store.class(store.well_known().object).unwrap();
    let map = store.class(store.well_known().map).unwrap();
    let string = store.class(store.well_known().string).unwrap();

    assert!(object.has_implicit_constructor());
    assert!(!map.has_implicit_constructor());
    assert!(!string.has_implicit_constructor());
}

#[test]
fn minimal_jdk_defines_groovy_default_import_types() {
    let store = TypeStore::with_minimal_jdk();
    for name in [
        "java.lang.Object",
        "java.lang.String",
        "java.lang.Integer",
        "java.math.BigDecimal",
        "java.util.ArrayList",
        "java.util.HashMap",
        "java.util.LinkedHashMap",
    ] {
        assert!(store.lookup_class(name).is_some(), "{name} should be defined");
    }
}

#[test]
fn type_param_bounds_can_refer_to_the_parameter() {
    let mut store = TypeStore::with_minimal_jdk();
    let comparable = store.intern_class_id("java.lang.Comparable");
    let t = store.add_type_param("T", vec![]);
    store.set_type_param_bounds(t, vec![Type::class(comparable, vec![Type::TypeVar(t)])]);

    let def = store.type_param(t).expect("type parameter should exist");
    assert_eq!(
        def.upper_bounds,
        vec![Type::class(comparable, vec![Type::TypeVar(t)])]
    );
}
