//! Resolution of `new` expressions to constructors.

use quill_types::{
    ClassId, ClassKind, Diagnostic, JavaTypeSystem, PrimitiveType, Span, Type, TypeEnv, TypeSystem,
};

use crate::args::{classify, ArgumentList};
use crate::diagnostics::{ambiguous_constructor_diag, unresolved_constructor_diag, unresolved_type_diag};
use crate::filter::{
    constructor_candidates, filter_applicable, most_specific, ResolutionResult, ResolveOptions,
    ResolvedConstructor,
};
use crate::type_ref::{resolve_type_ref, ResolvedType, SymbolTable, TypeReference};

/// What follows `new`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NewTarget {
    Reference(TypeReference),
    /// `new int[3]`
    Builtin(PrimitiveType),
}

/// A `new` expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpression {
    pub target: NewTarget,
    /// `None` when the argument list is missing (array creation, or incomplete code).
    pub arguments: Option<ArgumentList>,
    pub array_dims: usize,
    /// `new Base(..) { .. }`; the target names the anonymous class's base type.
    pub anonymous_body: bool,
    pub span: Option<Span>,
}

impl NewExpression {
    pub fn new(reference: TypeReference, arguments: ArgumentList) -> Self {
        Self {
            target: NewTarget::Reference(reference),
            arguments: Some(arguments),
            array_dims: 0,
            anonymous_body: false,
            span: None,
        }
    }

    /// `new T[..]` with `dims` dimensions.
    pub fn array(target: NewTarget, dims: usize) -> Self {
        Self {
            target,
            arguments: None,
            array_dims: dims,
            anonymous_body: false,
            span: None,
        }
    }

    /// A reference without an argument list, as produced while the user is typing.
    pub fn without_arguments(reference: TypeReference) -> Self {
        Self {
            target: NewTarget::Reference(reference),
            arguments: None,
            array_dims: 0,
            anonymous_body: false,
            span: None,
        }
    }

    #[must_use]
    pub fn with_anonymous_body(mut self) -> Self {
        self.anonymous_body = true;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn reference(&self) -> Option<&TypeReference> {
        match &self.target {
            NewTarget::Reference(reference) => Some(reference),
            NewTarget::Builtin(_) => None,
        }
    }
}

/// Resolves type references and constructor calls against a [`TypeEnv`] and a
/// [`SymbolTable`].
///
/// Resolution is a pure function of its inputs: the same query always returns the
/// same results in the same order.
pub struct ConstructorResolver<'a> {
    env: &'a dyn TypeEnv,
    symbols: &'a dyn SymbolTable,
    java: JavaTypeSystem<'a>,
    types: Option<&'a dyn TypeSystem>,
    options: ResolveOptions,
}

impl<'a> ConstructorResolver<'a> {
    pub fn new(env: &'a dyn TypeEnv, symbols: &'a dyn SymbolTable) -> Self {
        Self {
            env,
            symbols,
            java: JavaTypeSystem::new(env),
            types: None,
            options: ResolveOptions::default(),
        }
    }

    /// Use `types` for assignability instead of the Java rules.
    #[must_use]
    pub fn with_type_system(mut self, types: &'a dyn TypeSystem) -> Self {
        self.types = Some(types);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn env(&self) -> &'a dyn TypeEnv {
        self.env
    }

    fn types(&self) -> &dyn TypeSystem {
        match self.types {
            Some(types) => types,
            None => &self.java,
        }
    }

    pub fn resolve_type(&self, reference: &TypeReference) -> Vec<ResolvedType> {
        resolve_type_ref(self.symbols, self.env, reference)
    }

    /// Every constructor of `reference`'s classes applicable to `args`.
    pub fn resolve_constructor(
        &self,
        reference: &TypeReference,
        args: &ArgumentList,
        allow_incomplete: bool,
    ) -> ResolutionResult {
        let owners = self.resolve_type(reference);
        self.resolve_for_owners(reference, &owners, args, allow_incomplete)
    }

    fn resolve_for_owners(
        &self,
        reference: &TypeReference,
        owners: &[ResolvedType],
        args: &ArgumentList,
        allow_incomplete: bool,
    ) -> ResolutionResult {
        if owners.is_empty() {
            tracing::debug!(target: "quill.resolve", reference = %reference, "type reference did not resolve");
            return ResolutionResult::default();
        }

        let args = classify(args);
        let candidates = constructor_candidates(self.env, owners);
        let result = filter_applicable(
            self.env,
            self.types(),
            &candidates,
            &args,
            allow_incomplete,
            &self.options,
        );
        tracing::debug!(
            target: "quill.resolve",
            reference = %reference,
            classes = owners.len(),
            candidates = candidates.len(),
            applicable = result.len(),
            allow_incomplete,
            "resolved constructor call"
        );
        result
    }

    /// The single most specific applicable constructor, if there is one.
    pub fn resolve_unique_constructor(
        &self,
        reference: &TypeReference,
        args: &ArgumentList,
        allow_incomplete: bool,
    ) -> Option<ResolvedConstructor> {
        let result = self.resolve_constructor(reference, args, allow_incomplete);
        self.unique(&result)
    }

    pub fn resolve_new_expression(&self, expr: &NewExpression, allow_incomplete: bool) -> ResolutionResult {
        let NewTarget::Reference(reference) = &expr.target else {
            return ResolutionResult::default();
        };
        let owners = self.constructor_owners(reference, expr.anonymous_body);
        match &expr.arguments {
            Some(args) => self.resolve_for_owners(reference, &owners, args, allow_incomplete),
            None if allow_incomplete => {
                self.resolve_for_owners(reference, &owners, &ArgumentList::new(), true)
            }
            None => ResolutionResult::default(),
        }
    }

    /// Classes whose constructors `new reference(..)` calls. An anonymous class
    /// implementing an interface calls `Object()`.
    fn constructor_owners(&self, reference: &TypeReference, anonymous_body: bool) -> Vec<ResolvedType> {
        let owners = self.resolve_type(reference);
        if !anonymous_body {
            return owners;
        }
        let object = self.env.well_known().object;
        let mut out: Vec<ResolvedType> = Vec::with_capacity(owners.len());
        for owner in owners {
            let is_interface = self
                .env
                .class(owner.class)
                .is_some_and(|class| class.kind == ClassKind::Interface);
            let owner = if is_interface {
                ResolvedType::new(object)
            } else {
                owner
            };
            if !out.contains(&owner) {
                out.push(owner);
            }
        }
        out
    }

    /// The constructor a complete `new` expression refers to, if unambiguous.
    pub fn resolve_new_expression_target(&self, expr: &NewExpression) -> Option<ResolvedConstructor> {
        let result = self.resolve_new_expression(expr, false);
        self.unique(&result)
    }

    /// The static type of `expr`.
    ///
    /// Anonymous class bodies report their base type. Unresolved references yield a
    /// [`Type::Named`].
    pub fn new_expression_type(&self, expr: &NewExpression) -> Type {
        let base = match &expr.target {
            NewTarget::Builtin(prim) => Type::Primitive(*prim),
            NewTarget::Reference(reference) => match self.resolve_type(reference).first() {
                Some(resolved) if reference.is_raw() => Type::class(resolved.class, vec![]),
                Some(resolved) => resolved.as_type(self.env),
                None => Type::Named(reference.name.clone()),
            },
        };
        base.with_array_dims(expr.array_dims)
    }

    /// Every constructor of every class `reference` resolves to, unchecked.
    pub fn call_variants(&self, reference: &TypeReference) -> Vec<ResolvedConstructor> {
        let owners = self.resolve_type(reference);
        let candidates = constructor_candidates(self.env, &owners);
        filter_applicable(
            self.env,
            self.types(),
            &candidates,
            &Default::default(),
            true,
            &self.options,
        )
        .results
    }

    /// Whether `expr` resolves to constructor `index` of `class` (`None` for the implicit
    /// constructor).
    pub fn is_reference_to(&self, expr: &NewExpression, class: ClassId, index: Option<usize>) -> bool {
        self.resolve_new_expression_target(expr)
            .is_some_and(|resolved| {
                resolved.candidate.owner.class == class && resolved.candidate.index == index
            })
    }

    /// Errors for a complete `new` expression: unresolved type, no applicable
    /// constructor, or more than one most specific constructor.
    pub fn diagnostics(&self, expr: &NewExpression) -> Vec<Diagnostic> {
        let (NewTarget::Reference(reference), Some(arguments)) = (&expr.target, &expr.arguments) else {
            return Vec::new();
        };
        if self.resolve_type(reference).is_empty() {
            return vec![unresolved_type_diag(reference, expr.span)];
        }

        let result = self.resolve_new_expression(expr, false);
        if result.is_empty() {
            let args = classify(arguments);
            return vec![unresolved_constructor_diag(
                self.env,
                reference,
                &args,
                &result.rejected,
                expr.span,
            )];
        }

        let best = most_specific(self.types(), &result.results);
        if best.len() > 1 {
            return vec![ambiguous_constructor_diag(self.env, reference, &best, expr.span)];
        }
        Vec::new()
    }

    fn unique(&self, result: &ResolutionResult) -> Option<ResolvedConstructor> {
        let mut best = most_specific(self.types(), &result.results);
        if best.len() == 1 {
            best.pop()
        } else {
            None
        }
    }
}
