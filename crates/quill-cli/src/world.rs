//! TOML description of the classes a `new` expression is resolved against.
//!
//! ```toml
//! package = "geo"
//! imports = ["java.util.*"]
//!
//! [[classes]]
//! name = "Point"
//! type_params = ["T", { name = "N", bounds = ["Number"] }]
//!
//! [[classes.constructors]]
//! params = [{ name = "x", type = "int" }, { name = "y", type = "int", default = true }]
//! ```
//!
//! Class names without a package are placed in the world's `package`. Type
//! references inside a class resolve against that class's package plus the
//! world imports, so classes may refer to each other in any order.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use quill_resolve::{resolve_type_ref_to_type, ImportScope, TypeRefParseError, TypeReference};
use quill_types::{
    ClassDef, ClassId, ClassKind, ConstructorDef, ParamDef, Type, TypeEnv, TypeStore, TypeVarId,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to read world file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse world file: {0}")]
    Toml(String),
    #[error("class `{0}` is declared more than once")]
    DuplicateClass(String),
    #[error("invalid type `{text}` in {context}: {source}")]
    InvalidType {
        context: String,
        text: String,
        #[source]
        source: TypeRefParseError,
    },
}

impl From<toml::de::Error> for WorldError {
    fn from(err: toml::de::Error) -> Self {
        WorldError::Toml(err.message().to_owned())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorldFile {
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    classes: Vec<ClassSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassSpec {
    name: String,
    #[serde(default)]
    kind: KindSpec,
    #[serde(default)]
    type_params: Vec<TypeParamSpec>,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    implements: Vec<String>,
    #[serde(default)]
    constructors: Vec<ConstructorSpec>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindSpec {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
}

impl From<KindSpec> for ClassKind {
    fn from(kind: KindSpec) -> Self {
        match kind {
            KindSpec::Class => ClassKind::Class,
            KindSpec::Interface => ClassKind::Interface,
            KindSpec::Enum => ClassKind::Enum,
            KindSpec::Record => ClassKind::Record,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeParamSpec {
    Name(String),
    Bounded {
        name: String,
        #[serde(default)]
        bounds: Vec<String>,
    },
}

impl TypeParamSpec {
    fn name(&self) -> &str {
        match self {
            TypeParamSpec::Name(name) | TypeParamSpec::Bounded { name, .. } => name,
        }
    }

    fn bounds(&self) -> &[String] {
        match self {
            TypeParamSpec::Name(_) => &[],
            TypeParamSpec::Bounded { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstructorSpec {
    #[serde(default)]
    params: Vec<ParamSpec>,
    /// The last parameter is an array accepting a variable number of arguments.
    #[serde(default)]
    varargs: bool,
    #[serde(default)]
    type_params: Vec<TypeParamSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamSpec {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    default: bool,
}

/// A loaded world: the JDK slice plus every declared class.
#[derive(Debug)]
pub struct World {
    store: TypeStore,
    package: Option<String>,
    imports: Vec<String>,
}

impl World {
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let text = std::fs::read_to_string(path).map_err(|source| WorldError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, WorldError> {
        let file: WorldFile = toml::from_str(text)?;
        build(file)
    }

    pub fn env(&self) -> &TypeStore {
        &self.store
    }

    /// The scope call sites in this world see: its package and imports.
    pub fn scope(&self) -> ImportScope<'_> {
        scope_for(&self.store, self.package.as_deref(), &self.imports)
    }

    /// Resolve an argument type written on the command line.
    ///
    /// `null` is the null type; everything else is a type reference.
    pub fn argument_type(&self, text: &str) -> Result<Type, WorldError> {
        let text = text.trim();
        if text == "null" {
            return Ok(Type::Null);
        }
        let scope = self.scope();
        TypeResolver {
            scope: &scope,
            env: &self.store,
            context: "argument",
        }
        .resolve(text, &HashMap::new())
    }
}

fn scope_for<'env>(
    env: &'env TypeStore,
    package: Option<&str>,
    imports: &[String],
) -> ImportScope<'env> {
    let mut scope = ImportScope::new(env);
    if let Some(package) = package {
        scope = scope.with_package(package);
    }
    imports
        .iter()
        .fold(scope, |scope, import| scope.with_import(import))
}

fn qualify(package: Option<&str>, name: &str) -> String {
    match package {
        Some(package) if !name.contains('.') => format!("{package}.{name}"),
        _ => name.to_string(),
    }
}

fn package_of(binary_name: &str) -> Option<&str> {
    binary_name.rsplit_once('.').map(|(package, _)| package)
}

struct Declared {
    id: ClassId,
    name: String,
    class_vars: Vec<(String, TypeVarId)>,
    ctor_vars: Vec<Vec<(String, TypeVarId)>>,
}

struct Definition {
    id: ClassId,
    def: ClassDef,
    bounds: Vec<(TypeVarId, Vec<Type>)>,
}

fn declare_type_params(store: &mut TypeStore, specs: &[TypeParamSpec]) -> Vec<(String, TypeVarId)> {
    specs
        .iter()
        .map(|spec| {
            let name = spec.name().to_string();
            let id = store.add_type_param(name.clone(), Vec::new());
            (name, id)
        })
        .collect()
}

fn build(file: WorldFile) -> Result<World, WorldError> {
    let mut store = TypeStore::with_minimal_jdk();
    let package = file.package.filter(|package| !package.is_empty());

    // Every class is visible before any type reference is resolved.
    let mut seen = HashSet::new();
    let mut declared = Vec::with_capacity(file.classes.len());
    for spec in &file.classes {
        let name = qualify(package.as_deref(), &spec.name);
        if !seen.insert(name.clone()) {
            return Err(WorldError::DuplicateClass(name));
        }
        let id = store.intern_class_id(&name);
        let class_vars = declare_type_params(&mut store, &spec.type_params);
        let ctor_vars = spec
            .constructors
            .iter()
            .map(|ctor| declare_type_params(&mut store, &ctor.type_params))
            .collect();
        store.define_class(
            id,
            ClassDef {
                name: name.clone(),
                kind: spec.kind.into(),
                type_params: class_vars.iter().map(|(_, var)| *var).collect(),
                super_class: None,
                interfaces: Vec::new(),
                constructors: Vec::new(),
            },
        );
        declared.push(Declared {
            id,
            name,
            class_vars,
            ctor_vars,
        });
    }

    let mut definitions = Vec::with_capacity(declared.len());
    for (spec, decl) in file.classes.iter().zip(&declared) {
        let scope = scope_for(&store, package_of(&decl.name), &file.imports);
        let resolver = TypeResolver {
            scope: &scope,
            env: &store,
            context: &decl.name,
        };
        definitions.push(resolver.define(spec, decl)?);
    }

    for definition in definitions {
        for (var, bounds) in definition.bounds {
            store.set_type_param_bounds(var, bounds);
        }
        store.define_class(definition.id, definition.def);
    }

    tracing::debug!(
        target: "quill.cli",
        classes = declared.len(),
        package = package.as_deref().unwrap_or(""),
        "loaded world"
    );

    Ok(World {
        store,
        package,
        imports: file.imports,
    })
}

struct TypeResolver<'a> {
    scope: &'a ImportScope<'a>,
    env: &'a TypeStore,
    context: &'a str,
}

impl TypeResolver<'_> {
    fn resolve(&self, text: &str, vars: &HashMap<String, TypeVarId>) -> Result<Type, WorldError> {
        let reference = TypeReference::parse(text).map_err(|source| WorldError::InvalidType {
            context: self.context.to_string(),
            text: text.to_string(),
            source,
        })?;
        Ok(resolve_type_ref_to_type(self.scope, self.env, &reference, vars))
    }

    fn resolve_all(
        &self,
        texts: &[String],
        vars: &HashMap<String, TypeVarId>,
    ) -> Result<Vec<Type>, WorldError> {
        texts.iter().map(|text| self.resolve(text, vars)).collect()
    }

    fn bounds(
        &self,
        specs: &[TypeParamSpec],
        declared: &[(String, TypeVarId)],
        vars: &HashMap<String, TypeVarId>,
    ) -> Result<Vec<(TypeVarId, Vec<Type>)>, WorldError> {
        specs
            .iter()
            .zip(declared)
            .filter(|(spec, _)| !spec.bounds().is_empty())
            .map(|(spec, (_, var))| -> Result<_, WorldError> {
                Ok((*var, self.resolve_all(spec.bounds(), vars)?))
            })
            .collect()
    }

    fn define(&self, spec: &ClassSpec, decl: &Declared) -> Result<Definition, WorldError> {
        let class_vars: HashMap<String, TypeVarId> = decl.class_vars.iter().cloned().collect();
        let mut bounds = self.bounds(&spec.type_params, &decl.class_vars, &class_vars)?;

        let kind = ClassKind::from(spec.kind);
        let super_class = match &spec.extends {
            Some(text) => Some(self.resolve(text, &class_vars)?),
            None => self.implicit_super(kind, decl.id),
        };
        let interfaces = self.resolve_all(&spec.implements, &class_vars)?;

        let mut constructors = Vec::with_capacity(spec.constructors.len());
        for (ctor, ctor_vars) in spec.constructors.iter().zip(&decl.ctor_vars) {
            let mut vars = class_vars.clone();
            vars.extend(ctor_vars.iter().cloned());
            bounds.extend(self.bounds(&ctor.type_params, ctor_vars, &vars)?);

            let params = ctor
                .params
                .iter()
                .map(|param| -> Result<ParamDef, WorldError> {
                    let ty = self.resolve(&param.ty, &vars)?;
                    Ok(if param.default {
                        ParamDef::with_default(param.name.clone(), ty)
                    } else {
                        ParamDef::new(param.name.clone(), ty)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut def = if ctor.varargs {
                ConstructorDef::varargs(params)
            } else {
                ConstructorDef::new(params)
            };
            def.type_params = ctor_vars.iter().map(|(_, var)| *var).collect();
            constructors.push(def);
        }

        Ok(Definition {
            id: decl.id,
            def: ClassDef {
                name: decl.name.clone(),
                kind,
                type_params: decl.class_vars.iter().map(|(_, var)| *var).collect(),
                super_class,
                interfaces,
                constructors,
            },
            bounds,
        })
    }

    fn implicit_super(&self, kind: ClassKind, id: ClassId) -> Option<Type> {
        let object = self.env.well_known().object;
        (kind != ClassKind::Interface && id != object).then(|| Type::class(object, vec![]))
    }
}
