use std::collections::HashMap;

use crate::{
    ClassDef, ClassId, ClassKind, ConstructorDef, ParamDef, PrimitiveType, Type, TypeEnv,
    TypeParamDef, TypeVarId, WellKnownTypes, WildcardBound,
};

/// Owning [`TypeEnv`] implementation.
///
/// Class ids are stable: a name is interned once and later definitions
/// (`define_class`, `upsert_class`) overwrite the slot without changing its id.
#[derive(Clone, Debug)]
pub struct TypeStore {
    class_names: Vec<String>,
    classes: Vec<Option<ClassDef>>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    /// An empty store whose well-known ids are interned placeholders.
    fn default() -> Self {
        let mut store = TypeStore {
            class_names: Vec::new(),
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes {
                object: ClassId::from_raw(0),
                string: ClassId::from_raw(0),
                number: ClassId::from_raw(0),
                boolean: ClassId::from_raw(0),
                byte: ClassId::from_raw(0),
                short: ClassId::from_raw(0),
                character: ClassId::from_raw(0),
                integer: ClassId::from_raw(0),
                long: ClassId::from_raw(0),
                float: ClassId::from_raw(0),
                double: ClassId::from_raw(0),
                cloneable: ClassId::from_raw(0),
                serializable: ClassId::from_raw(0),
                map: ClassId::from_raw(0),
                linked_hash_map: ClassId::from_raw(0),
            },
        };

        store.well_known = WellKnownTypes {
            object: store.intern_class_id("java.lang.Object"),
            string: store.intern_class_id("java.lang.String"),
            number: store.intern_class_id("java.lang.Number"),
            boolean: store.intern_class_id("java.lang.Boolean"),
            byte: store.intern_class_id("java.lang.Byte"),
            short: store.intern_class_id("java.lang.Short"),
            character: store.intern_class_id("java.lang.Character"),
            integer: store.intern_class_id("java.lang.Integer"),
            long: store.intern_class_id("java.lang.Long"),
            float: store.intern_class_id("java.lang.Float"),
            double: store.intern_class_id("java.lang.Double"),
            cloneable: store.intern_class_id("java.lang.Cloneable"),
            serializable: store.intern_class_id("java.io.Serializable"),
            map: store.intern_class_id("java.util.Map"),
            linked_hash_map: store.intern_class_id("java.util.LinkedHashMap"),
        };
        store
    }
}

impl TypeStore {
    /// A store pre-populated with the slice of the JDK that Groovy code touches
    /// most often: `Object`, `String`, the boxes, `Number`, and the core
    /// collection and map types.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::default();
        store.define_minimal_jdk();
        store
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    /// Return the id for `name`, allocating an undefined placeholder if needed.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let raw: u32 = self
            .classes
            .len()
            .try_into()
            .expect("class id space exhausted");
        let id = ClassId::from_raw(raw);
        self.class_names.push(name.to_string());
        self.classes.push(None);
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let idx = id.index();
        if idx >= self.classes.len() {
            return;
        }
        if self.class_names[idx] != def.name {
            self.class_by_name.remove(&self.class_names[idx]);
            self.class_by_name.insert(def.name.clone(), id);
            self.class_names[idx] = def.name.clone();
        }
        self.classes[idx] = Some(def);
    }

    /// Define `def`, reusing the id already interned for its name.
    pub fn upsert_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        self.upsert_class(def)
    }

    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bounds: Vec<Type>) -> TypeVarId {
        let raw: u32 = self
            .type_params
            .len()
            .try_into()
            .expect("type parameter id space exhausted");
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
            lower_bound: None,
        });
        TypeVarId::from_raw(raw)
    }

    /// Replace the upper bounds of an allocated type parameter.
    ///
    /// Bounds may mention the parameter itself (`T extends Comparable<T>`), so
    /// they are filled in after the id exists.
    pub fn set_type_param_bounds(&mut self, id: TypeVarId, upper_bounds: Vec<Type>) {
        if let Some(def) = self.type_params.get_mut(id.index()) {
            def.upper_bounds = upper_bounds;
        }
    }

    /// Binary name for `id`, including undefined placeholders.
    pub fn class_name(&self, id: ClassId) -> Option<&str> {
        self.class_names.get(id.index()).map(String::as_str)
    }

    fn define_minimal_jdk(&mut self) {
        let wk = self.well_known.clone();
        let object = Type::class(wk.object, vec![]);
        let string = Type::class(wk.string, vec![]);
        let serializable = Type::class(wk.serializable, vec![]);
        let cloneable = Type::class(wk.cloneable, vec![]);

        self.define_class(
            wk.object,
            ClassDef {
                name: "java.lang.Object".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: None,
                interfaces: vec![],
                constructors: vec![],
            },
        );
        for (id, name) in [
            (wk.serializable, "java.io.Serializable"),
            (wk.cloneable, "java.lang.Cloneable"),
        ] {
            self.define_class(id, interface(name, vec![], vec![]));
        }
        let char_sequence = self.add_class(interface("java.lang.CharSequence", vec![], vec![]));

        let comparable_t = self.add_type_param("T", vec![object.clone()]);
        let comparable = self.add_class(interface(
            "java.lang.Comparable",
            vec![comparable_t],
            vec![],
        ));
        let comparable_of = |ty: &Type| Type::class(comparable, vec![ty.clone()]);

        self.define_class(
            wk.string,
            ClassDef {
                name: "java.lang.String".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object.clone()),
                interfaces: vec![
                    serializable.clone(),
                    Type::class(char_sequence, vec![]),
                    comparable_of(&string),
                ],
                constructors: vec![
                    ConstructorDef::new(vec![]),
                    ConstructorDef::new(vec![ParamDef::new("original", string.clone())]),
                    ConstructorDef::new(vec![ParamDef::new(
                        "value",
                        Type::array(Type::Primitive(PrimitiveType::Char)),
                    )]),
                ],
            },
        );

        self.define_class(
            wk.number,
            ClassDef {
                name: "java.lang.Number".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object.clone()),
                interfaces: vec![serializable.clone()],
                constructors: vec![ConstructorDef::new(vec![])],
            },
        );
        let number = Type::class(wk.number, vec![]);

        for prim in PrimitiveType::ALL {
            let id = wk.boxed(prim);
            let boxed = Type::class(id, vec![]);
            let super_class = match prim {
                PrimitiveType::Boolean | PrimitiveType::Char => object.clone(),
                _ => number.clone(),
            };
            self.define_class(
                id,
                ClassDef {
                    name: prim.box_class_name().to_string(),
                    kind: ClassKind::Class,
                    type_params: vec![],
                    super_class: Some(super_class),
                    interfaces: vec![serializable.clone(), comparable_of(&boxed)],
                    constructors: vec![ConstructorDef::new(vec![ParamDef::new(
                        "value",
                        Type::Primitive(prim),
                    )])],
                },
            );
        }

        for name in ["java.math.BigInteger", "java.math.BigDecimal"] {
            let id = self.intern_class_id(name);
            let this = Type::class(id, vec![]);
            self.define_class(
                id,
                ClassDef {
                    name: name.to_string(),
                    kind: ClassKind::Class,
                    type_params: vec![],
                    super_class: Some(number.clone()),
                    interfaces: vec![comparable_of(&this)],
                    constructors: vec![ConstructorDef::new(vec![ParamDef::new(
                        "val",
                        string.clone(),
                    )])],
                },
            );
        }

        // Collections.
        let iterable_t = self.add_type_param("T", vec![object.clone()]);
        let iterable = self.add_class(interface("java.lang.Iterable", vec![iterable_t], vec![]));

        let collection_e = self.add_type_param("E", vec![object.clone()]);
        let collection = self.add_class(interface(
            "java.util.Collection",
            vec![collection_e],
            vec![Type::class(iterable, vec![Type::TypeVar(collection_e)])],
        ));

        let list_e = self.add_type_param("E", vec![object.clone()]);
        let list = self.add_class(interface(
            "java.util.List",
            vec![list_e],
            vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
        ));

        let array_list_e = self.add_type_param("E", vec![object.clone()]);
        let e = Type::TypeVar(array_list_e);
        self.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            kind: ClassKind::Class,
            type_params: vec![array_list_e],
            super_class: Some(object.clone()),
            interfaces: vec![
                Type::class(list, vec![e.clone()]),
                cloneable.clone(),
                serializable.clone(),
            ],
            constructors: vec![
                ConstructorDef::new(vec![]),
                ConstructorDef::new(vec![ParamDef::new("initialCapacity", Type::int())]),
                ConstructorDef::new(vec![ParamDef::new(
                    "c",
                    Type::class(
                        collection,
                        vec![Type::Wildcard(WildcardBound::Extends(Box::new(e)))],
                    ),
                )]),
            ],
        });

        // Maps.
        let map_k = self.add_type_param("K", vec![object.clone()]);
        let map_v = self.add_type_param("V", vec![object.clone()]);
        self.define_class(wk.map, interface("java.util.Map", vec![map_k, map_v], vec![]));

        let hash_map = self.intern_class_id("java.util.HashMap");
        self.define_map_class(hash_map, "java.util.HashMap", &object, |k, v| {
            vec![
                Type::class(wk.map, vec![k, v]),
                cloneable.clone(),
                serializable.clone(),
            ]
        });
        self.define_map_class(
            wk.linked_hash_map,
            "java.util.LinkedHashMap",
            &object,
            |k, v| vec![Type::class(wk.map, vec![k, v])],
        );
        // `LinkedHashMap<K, V> extends HashMap<K, V>`.
        let (k, v) = match self.classes[wk.linked_hash_map.index()].as_ref() {
            Some(def) => (def.type_params[0], def.type_params[1]),
            None => return,
        };
        if let Some(def) = self.classes[wk.linked_hash_map.index()].as_mut() {
            def.super_class = Some(Type::class(
                hash_map,
                vec![Type::TypeVar(k), Type::TypeVar(v)],
            ));
        }
    }

    fn define_map_class(
        &mut self,
        id: ClassId,
        name: &str,
        object: &Type,
        interfaces: impl FnOnce(Type, Type) -> Vec<Type>,
    ) {
        let k = self.add_type_param("K", vec![object.clone()]);
        let v = self.add_type_param("V", vec![object.clone()]);
        let map = self.well_known.map;
        let extends = |ty: Type| Type::Wildcard(WildcardBound::Extends(Box::new(ty)));
        self.define_class(
            id,
            ClassDef {
                name: name.to_string(),
                kind: ClassKind::Class,
                type_params: vec![k, v],
                super_class: Some(object.clone()),
                interfaces: interfaces(Type::TypeVar(k), Type::TypeVar(v)),
                constructors: vec![
                    ConstructorDef::new(vec![]),
                    ConstructorDef::new(vec![ParamDef::new("initialCapacity", Type::int())]),
                    ConstructorDef::new(vec![ParamDef::new(
                        "m",
                        Type::class(
                            map,
                            vec![extends(Type::TypeVar(k)), extends(Type::TypeVar(v))],
                        ),
                    )]),
                ],
            },
        );
    }
}

fn interface(name: &str, type_params: Vec<TypeVarId>, interfaces: Vec<Type>) -> ClassDef {
    ClassDef {
        name: name.to_string(),
        kind: ClassKind::Interface,
        type_params,
        super_class: None,
        interfaces,
        constructors: vec![],
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index()).and_then(Option::as_ref)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        let id = self.class_by_name.get(name).copied()?;
        self.class(id).map(|_| id)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    fn classes(&self) -> Vec<ClassId> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, def)| def.is_some())
            .filter_map(|(idx, _)| u32::try_from(idx).ok().map(ClassId::from_raw))
            .collect()
    }
}
