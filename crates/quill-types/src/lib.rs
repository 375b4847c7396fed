//! Type model shared by Quill crates.
//!
//! Quill models a Groovy/Java-like nominal type system: generic classes,
//! arrays, primitives, and the structural map type produced by named-argument
//! calls (`new Point(x: 1, y: 2)`). The model is deliberately small; it carries
//! just enough information for constructor resolution and diagnostics.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

mod format;
mod store;
mod subtyping;

pub use format::{format_type, format_type_qualified};
pub use store::TypeStore;
pub use subtyping::{
    boxed_type, instantiate_as_supertype, is_assignable, is_map_like, is_subtype,
    map_literal_view, unboxed_primitive, JavaTypeSystem, TypeSystem,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(u32);

impl ClassId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_keyword(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == text)
    }

    /// Binary name of the wrapper class used for boxing conversion.
    pub fn box_class_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    /// Primitive subtyping (JLS 4.10.1), reflexive.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;

        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

/// Structural record type synthesized from the named arguments of a call.
///
/// Entries keep the order in which their keys first appeared at the call site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapLiteralType {
    pub entries: Vec<(String, Type)>,
}

impl MapLiteralType {
    pub fn new(entries: Vec<(String, Type)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Type> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, ty)| ty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Null,
    /// A name that has not been resolved against a [`TypeEnv`] yet.
    Named(String),
    MapLiteral(MapLiteralType),
    Unknown,
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_)
                | Type::Array(_)
                | Type::TypeVar(_)
                | Type::Null
                | Type::Named(_)
                | Type::MapLiteral(_)
        )
    }

    /// `true` for placeholder types produced by error recovery.
    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    /// Wrap `self` in `dims` array layers.
    pub fn with_array_dims(self, dims: usize) -> Type {
        (0..dims).fold(self, |ty, _| Type::array(ty))
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class(ClassType { def, .. }) => Some(*def),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
    pub lower_bound: Option<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: String,
    pub ty: Type,
    /// Groovy default value (`Point(int x, int y = 0)`).
    pub has_default: bool,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
        }
    }

    pub fn with_default(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorDef {
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<ParamDef>,
    /// The last parameter is an array accepting a variable number of arguments.
    pub is_varargs: bool,
}

impl ConstructorDef {
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self {
            type_params: Vec::new(),
            params,
            is_varargs: false,
        }
    }

    pub fn varargs(params: Vec<ParamDef>) -> Self {
        Self {
            type_params: Vec::new(),
            params,
            is_varargs: true,
        }
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `com.example.Point`.
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub constructors: Vec<ConstructorDef>,
}

impl ClassDef {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Whether `new C(..)` can use the implicit no-argument constructor. A record
    /// without declared constructors has no components, so its canonical constructor
    /// takes no arguments.
    pub fn has_implicit_constructor(&self) -> bool {
        matches!(self.kind, ClassKind::Class | ClassKind::Record) && self.constructors.is_empty()
    }
}

pub fn simple_name(binary_name: &str) -> &str {
    binary_name
        .rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(binary_name)
}

/// Class ids for types the resolver and the assignability rules need by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub map: ClassId,
    pub linked_hash_map: ClassId,
}

impl WellKnownTypes {
    pub fn boxed(&self, prim: PrimitiveType) -> ClassId {
        match prim {
            PrimitiveType::Boolean => self.boolean,
            PrimitiveType::Byte => self.byte,
            PrimitiveType::Short => self.short,
            PrimitiveType::Char => self.character,
            PrimitiveType::Int => self.integer,
            PrimitiveType::Long => self.long,
            PrimitiveType::Float => self.float,
            PrimitiveType::Double => self.double,
        }
    }

    pub fn unboxed(&self, class: ClassId) -> Option<PrimitiveType> {
        PrimitiveType::ALL
            .into_iter()
            .find(|prim| self.boxed(*prim) == class)
    }
}

/// Read-only view of the classes and type parameters known to a resolution.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    /// All defined classes, in id order.
    fn classes(&self) -> Vec<ClassId>;
}

/// Mapping from type parameters to the concrete types they stand for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution(BTreeMap<TypeVarId, Type>);

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: TypeVarId, ty: Type) {
        self.0.insert(var, ty);
    }

    pub fn get(&self, var: TypeVarId) -> Option<&Type> {
        self.0.get(&var)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeVarId, &Type)> + '_ {
        self.0.iter().map(|(var, ty)| (*var, ty))
    }

    /// Add every mapping of `other`, overriding existing entries.
    pub fn extend(&mut self, other: &Substitution) {
        for (var, ty) in other.iter() {
            self.0.insert(var, ty.clone());
        }
    }

    pub fn apply(&self, ty: &Type) -> Type {
        substitute(ty, self)
    }
}

impl FromIterator<(TypeVarId, Type)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (TypeVarId, Type)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn substitute(ty: &Type, subst: &Substitution) -> Type {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(id) => subst.get(*id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => {
            Type::class(*def, args.iter().map(|a| substitute(a, subst)).collect())
        }
        Type::Array(elem) => Type::array(substitute(elem, subst)),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(upper, subst))))
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(lower, subst))))
        }
        Type::MapLiteral(lit) => Type::MapLiteral(MapLiteralType::new(
            lit.entries
                .iter()
                .map(|(k, v)| (k.clone(), substitute(v, subst)))
                .collect(),
        )),
        other => other.clone(),
    }
}

/// Resolve a [`Type::Named`] against `env`, leaving every other type untouched.
pub fn canonicalize_named(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        other => other.clone(),
    }
}

/// Type erasure (JLS 4.6). Unbounded type variables erase to `Object`.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    fn inner(env: &dyn TypeEnv, ty: &Type, depth: usize) -> Type {
        let object = Type::class(env.well_known().object, vec![]);
        if depth > 16 {
            return object;
        }
        match canonicalize_named(env, ty) {
            Type::Class(ClassType { def, .. }) => Type::class(def, vec![]),
            Type::Array(elem) => Type::array(inner(env, &elem, depth + 1)),
            Type::TypeVar(id) => env
                .type_param(id)
                .and_then(|tp| tp.upper_bounds.first())
                .map(|bound| inner(env, bound, depth + 1))
                .unwrap_or(object),
            Type::Wildcard(WildcardBound::Extends(upper)) => inner(env, &upper, depth + 1),
            Type::Wildcard(_) => object,
            Type::MapLiteral(_) => Type::class(env.well_known().linked_hash_map, vec![]),
            other => other,
        }
    }
    inner(env, ty, 0)
}

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }
}
