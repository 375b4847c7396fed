//! Type references at `new` sites: parsing and resolution to class candidates.
//!
//! A reference resolves to *zero or more* [`ResolvedType`]s. Ambiguity (two
//! star imports providing the same simple name) is an ordinary outcome and is
//! surfaced to callers as multiple candidates; absence is an empty vector.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use quill_types::{
    erasure, ClassDef, ClassId, PrimitiveType, Substitution, Type, TypeEnv, TypeVarId,
    WildcardBound,
};
use thiserror::Error;

/// Symbolic type reference, e.g. `java.util.Map<String, ? extends Number>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeReference {
    /// Dotted name as written (`Map`, `java.util.Map`, `Outer.Inner`).
    pub name: String,
    pub args: Vec<TypeArgRef>,
    /// `Foo<>`: type arguments are left for inference.
    pub diamond: bool,
    /// `[]` suffixes. Only meaningful for references nested in type arguments.
    pub array_dims: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeArgRef {
    Type(TypeReference),
    Wildcard,
    Extends(TypeReference),
    Super(TypeReference),
}

impl TypeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            diamond: false,
            array_dims: 0,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<TypeReference>) -> Self {
        self.args = args.into_iter().map(TypeArgRef::Type).collect();
        self.diamond = false;
        self
    }

    #[must_use]
    pub fn with_diamond(mut self) -> Self {
        self.args.clear();
        self.diamond = true;
        self
    }

    /// Number of explicit type arguments used for symbol lookup.
    pub fn generic_arity(&self) -> usize {
        self.args.len()
    }

    /// `true` when the reference names a generic type without type arguments.
    pub fn is_raw(&self) -> bool {
        self.args.is_empty() && !self.diamond
    }

    pub fn parse(text: &str) -> Result<Self, TypeRefParseError> {
        Parser::new(text).parse_type_ref()
    }
}

impl FromStr for TypeReference {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.diamond {
            f.write_str("<>")?;
        } else if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx != 0 {
                    f.write_str(", ")?;
                }
                match arg {
                    TypeArgRef::Type(ty) => write!(f, "{ty}")?,
                    TypeArgRef::Wildcard => f.write_str("?")?,
                    TypeArgRef::Extends(ty) => write!(f, "? extends {ty}")?,
                    TypeArgRef::Super(ty) => write!(f, "? super {ty}")?,
                }
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefParseError {
    #[error("expected a type name at offset {offset}")]
    ExpectedName { offset: usize },
    #[error("expected `{expected}` at offset {offset}")]
    Expected { expected: char, offset: usize },
    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn parse_type_ref(&mut self) -> Result<TypeReference, TypeRefParseError> {
        let ty = self.parse_type()?;
        self.skip_ws();
        if !self.is_eof() {
            return Err(TypeRefParseError::TrailingInput { offset: self.pos });
        }
        Ok(ty)
    }

    fn parse_type(&mut self) -> Result<TypeReference, TypeRefParseError> {
        self.skip_ws();
        let mut ty = TypeReference::new(self.parse_qualified_name()?);

        self.skip_ws();
        if self.consume_char('<') {
            self.skip_ws();
            if self.consume_char('>') {
                ty.diamond = true;
            } else {
                loop {
                    ty.args.push(self.parse_type_arg()?);
                    self.skip_ws();
                    if self.consume_char(',') {
                        continue;
                    }
                    self.expect_char('>')?;
                    break;
                }
            }
        }

        loop {
            self.skip_ws();
            if !self.consume_char('[') {
                break;
            }
            self.skip_ws();
            self.expect_char(']')?;
            ty.array_dims += 1;
        }

        Ok(ty)
    }

    fn parse_type_arg(&mut self) -> Result<TypeArgRef, TypeRefParseError> {
        self.skip_ws();
        if !self.consume_char('?') {
            return Ok(TypeArgRef::Type(self.parse_type()?));
        }
        self.skip_ws();
        if self.consume_keyword("extends") {
            Ok(TypeArgRef::Extends(self.parse_type()?))
        } else if self.consume_keyword("super") {
            Ok(TypeArgRef::Super(self.parse_type()?))
        } else {
            Ok(TypeArgRef::Wildcard)
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String, TypeRefParseError> {
        let mut name = self.parse_identifier()?.to_string();
        loop {
            let save = self.pos;
            self.skip_ws();
            if !self.consume_char('.') {
                self.pos = save;
                break;
            }
            self.skip_ws();
            name.push('.');
            name.push_str(self.parse_identifier()?);
        }
        Ok(name)
    }

    fn parse_identifier(&mut self) -> Result<&'a str, TypeRefParseError> {
        let rest = &self.text[self.pos..];
        let mut end = 0;
        for (idx, ch) in rest.char_indices() {
            let ok = if idx == 0 {
                is_ident_start(ch)
            } else {
                is_ident_part(ch)
            };
            if !ok {
                break;
            }
            end = idx + ch.len_utf8();
        }
        if end == 0 {
            return Err(TypeRefParseError::ExpectedName { offset: self.pos });
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.text[self.pos..];
        if !rest.starts_with(keyword) {
            return false;
        }
        if rest[keyword.len()..].chars().next().is_some_and(is_ident_part) {
            return false;
        }
        self.pos += keyword.len();
        true
    }

    fn consume_char(&mut self, ch: char) -> bool {
        if self.text[self.pos..].starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, ch: char) -> Result<(), TypeRefParseError> {
        if self.consume_char(ch) {
            Ok(())
        } else {
            Err(TypeRefParseError::Expected {
                expected: ch,
                offset: self.pos,
            })
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

fn is_ident_part(ch: char) -> bool {
    ch == '$' || ch == '_' || unicode_ident::is_xid_continue(ch)
}

/// A class candidate for a type reference together with the substitution of its type
/// parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedType {
    pub class: ClassId,
    pub substitution: Substitution,
    /// A generic class named without type arguments; its members are seen erased.
    pub raw: bool,
}

impl ResolvedType {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            substitution: Substitution::new(),
            raw: false,
        }
    }

    /// The parameterized class type, with unsubstituted parameters left as type variables.
    /// Raw references yield the raw class type.
    pub fn as_type(&self, env: &dyn TypeEnv) -> Type {
        if self.raw {
            return Type::class(self.class, vec![]);
        }
        let args = env
            .class(self.class)
            .map(|def| {
                def.type_params
                    .iter()
                    .map(|tp| {
                        self.substitution
                            .get(*tp)
                            .cloned()
                            .unwrap_or(Type::TypeVar(*tp))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Type::class(self.class, args)
    }
}

/// Name lookup against the enclosing lexical/import scope.
pub trait SymbolTable {
    /// Classes visible under `name` that accept `generic_arity` type arguments
    /// (`0` accepts raw and diamond uses of any class).
    fn lookup_type(&self, name: &str, generic_arity: usize) -> Vec<ResolvedType>;
}

/// Resolve `reference` to every class it may denote.
///
/// The substitution of each candidate is extended with the reference's explicit type
/// arguments: matching arity maps each parameter to its argument, a raw reference maps
/// each parameter to its erasure, and a diamond reference maps each parameter to
/// [`Type::Unknown`].
pub fn resolve_type_ref(
    symbols: &dyn SymbolTable,
    env: &dyn TypeEnv,
    reference: &TypeReference,
) -> Vec<ResolvedType> {
    let no_vars = HashMap::new();
    TypeRefResolver::new(symbols, env, &no_vars).resolve(reference)
}

/// Resolve `reference` to a single [`Type`], the way a declaration's parameter type is
/// resolved.
///
/// Primitive keywords and names in `type_vars` are recognised. Ambiguous references pick
/// the first candidate; unresolved ones become [`Type::Named`].
pub fn resolve_type_ref_to_type(
    symbols: &dyn SymbolTable,
    env: &dyn TypeEnv,
    reference: &TypeReference,
    type_vars: &HashMap<String, TypeVarId>,
) -> Type {
    TypeRefResolver::new(symbols, env, type_vars).resolve_to_type(reference)
}

struct TypeRefResolver<'a> {
    symbols: &'a dyn SymbolTable,
    env: &'a dyn TypeEnv,
    type_vars: &'a HashMap<String, TypeVarId>,
}

impl<'a> TypeRefResolver<'a> {
    fn new(
        symbols: &'a dyn SymbolTable,
        env: &'a dyn TypeEnv,
        type_vars: &'a HashMap<String, TypeVarId>,
    ) -> Self {
        Self {
            symbols,
            env,
            type_vars,
        }
    }

    fn resolve(&self, reference: &TypeReference) -> Vec<ResolvedType> {
        let mut out = Vec::new();
        for mut resolved in self
            .symbols
            .lookup_type(&reference.name, reference.generic_arity())
        {
            let Some(class) = self.env.class(resolved.class) else {
                tracing::warn!(
                    target: "quill.resolve",
                    class = resolved.class.to_raw(),
                    name = %reference.name,
                    "symbol table returned a class unknown to the type environment"
                );
                continue;
            };
            let explicit = self.explicit_substitution(reference, class);
            resolved.substitution.extend(&explicit);
            resolved.raw = !reference.diamond
                && !class.type_params.is_empty()
                && reference.args.len() != class.type_params.len();
            out.push(resolved);
        }
        out
    }

    fn explicit_substitution(&self, reference: &TypeReference, class: &ClassDef) -> Substitution {
        if reference.diamond {
            return class
                .type_params
                .iter()
                .map(|tp| (*tp, Type::Unknown))
                .collect();
        }
        if reference.args.len() == class.type_params.len() {
            return class
                .type_params
                .iter()
                .zip(&reference.args)
                .map(|(tp, arg)| (*tp, self.resolve_type_arg(arg)))
                .collect();
        }
        class
            .type_params
            .iter()
            .map(|tp| (*tp, erasure(self.env, &Type::TypeVar(*tp))))
            .collect()
    }

    fn resolve_type_arg(&self, arg: &TypeArgRef) -> Type {
        match arg {
            TypeArgRef::Type(reference) => self.resolve_to_type(reference),
            TypeArgRef::Wildcard => Type::Wildcard(WildcardBound::Unbounded),
            TypeArgRef::Extends(reference) => Type::Wildcard(WildcardBound::Extends(Box::new(
                self.resolve_to_type(reference),
            ))),
            TypeArgRef::Super(reference) => Type::Wildcard(WildcardBound::Super(Box::new(
                self.resolve_to_type(reference),
            ))),
        }
    }

    fn resolve_to_type(&self, reference: &TypeReference) -> Type {
        let dims = reference.array_dims;
        if reference.args.is_empty() && !reference.diamond {
            if let Some(prim) = PrimitiveType::from_keyword(&reference.name) {
                return Type::Primitive(prim).with_array_dims(dims);
            }
            if let Some(var) = self.type_vars.get(&reference.name) {
                return Type::TypeVar(*var).with_array_dims(dims);
            }
        }

        let base = match self.resolve(reference).into_iter().next() {
            Some(resolved) if reference.is_raw() => Type::class(resolved.class, vec![]),
            Some(resolved) => resolved.as_type(self.env),
            None => Type::Named(reference.name.clone()),
        };
        base.with_array_dims(dims)
    }
}
