//! Constructor applicability filtering.
//!
//! Filtering never ranks: every applicable candidate is returned in declaration
//! order. [`most_specific`] is a separate, explicit step used by callers that need a
//! single answer.

use quill_types::{
    boxed_type, erasure, instantiate_as_supertype, substitute, ClassKind, ClassType, ParamDef,
    Substitution, Type, TypeEnv, TypeSystem, TypeVarId, WildcardBound,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::args::{ArgumentShape, CallArguments};
use crate::type_ref::ResolvedType;

/// Knobs for the applicability rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(deny_unknown_fields)]
pub struct ResolveOptions {
    /// Try variable-arity invocation of varargs constructors when no fixed-arity
    /// candidate applies.
    pub varargs: bool,
    /// Allow trailing parameters with default values to be omitted.
    pub default_params: bool,
    /// In calls mixing named and positional arguments, pass the named arguments as a
    /// leading map argument instead of ignoring them.
    pub named_args_as_leading_map: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            varargs: true,
            default_params: true,
            named_args_as_leading_map: false,
        }
    }
}

/// A constructor of a resolved class, with the class's substitution applied to its
/// parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorCandidate {
    pub owner: ResolvedType,
    /// Index into the owner's declared constructors; `None` for the implicit no-argument
    /// constructor.
    pub index: Option<usize>,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<ParamDef>,
    pub is_varargs: bool,
}

impl ConstructorCandidate {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn is_implicit(&self) -> bool {
        self.index.is_none()
    }

    fn min_arity(&self, options: &ResolveOptions) -> usize {
        let mut min = self.params.len();
        if options.default_params {
            min -= self.params.iter().filter(|p| p.has_default).count();
        }
        if self.is_varargs && options.varargs {
            min = min.min(self.params.len().saturating_sub(1));
        }
        min
    }
}

/// Every constructor of every class in `owners`, in class then declaration order.
///
/// Interfaces and enums contribute nothing; a class or record without declared
/// constructors contributes its implicit no-argument constructor.
pub fn constructor_candidates(env: &dyn TypeEnv, owners: &[ResolvedType]) -> Vec<ConstructorCandidate> {
    let mut out = Vec::new();
    for owner in owners {
        let Some(class) = env.class(owner.class) else {
            tracing::warn!(
                target: "quill.resolve",
                class = owner.class.to_raw(),
                "skipping constructors of a class unknown to the type environment"
            );
            continue;
        };
        if matches!(class.kind, ClassKind::Interface | ClassKind::Enum) {
            continue;
        }
        if class.has_implicit_constructor() {
            out.push(ConstructorCandidate {
                owner: owner.clone(),
                index: None,
                type_params: Vec::new(),
                params: Vec::new(),
                is_varargs: false,
            });
            continue;
        }
        for (index, ctor) in class.constructors.iter().enumerate() {
            // Members of a raw type are erased, constructor type parameters included.
            let params = ctor
                .params
                .iter()
                .map(|param| ParamDef {
                    name: param.name.clone(),
                    ty: if owner.raw {
                        erasure(env, &param.ty)
                    } else {
                        substitute(&param.ty, &owner.substitution)
                    },
                    has_default: param.has_default,
                })
                .collect();
            out.push(ConstructorCandidate {
                owner: owner.clone(),
                index: Some(index),
                type_params: if owner.raw {
                    Vec::new()
                } else {
                    ctor.type_params.clone()
                },
                params,
                is_varargs: ctor.is_varargs,
            });
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    /// Applicable by fixed-arity invocation (possibly omitting default parameters).
    Applicable,
    ApplicableByVarargs,
    /// Returned without checking arguments (incomplete code, call variants).
    Unchecked,
}

/// An applicable constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConstructor {
    pub candidate: ConstructorCandidate,
    /// Owner substitution plus inferred constructor type arguments.
    pub substitution: Substitution,
    /// Instantiated parameter types lined up with the arguments of the call.
    pub call_params: Vec<Type>,
    pub applicability: Applicability,
}

impl ResolvedConstructor {
    fn unchecked(candidate: &ConstructorCandidate) -> Self {
        Self {
            candidate: candidate.clone(),
            substitution: candidate.owner.substitution.clone(),
            call_params: candidate.param_types(),
            applicability: Applicability::Unchecked,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CandidateFailureReason {
    WrongArity {
        min: usize,
        /// `None` for variable-arity candidates.
        max: Option<usize>,
        found: usize,
    },
    ArgumentConversion {
        arg_index: usize,
        from: Type,
        to: Type,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub candidate: ConstructorCandidate,
    pub reason: CandidateFailureReason,
}

/// Applicable constructors plus, for diagnostics, why the others were rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    pub results: Vec<ResolvedConstructor>,
    pub rejected: Vec<RejectedCandidate>,
}

impl ResolutionResult {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedConstructor> {
        self.results.iter()
    }

    /// The single result, if there is exactly one.
    pub fn single(&self) -> Option<&ResolvedConstructor> {
        match self.results.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    fn unchecked(candidates: &[ConstructorCandidate]) -> Self {
        Self {
            results: candidates.iter().map(ResolvedConstructor::unchecked).collect(),
            rejected: Vec::new(),
        }
    }
}

impl<'a> IntoIterator for &'a ResolutionResult {
    type Item = &'a ResolvedConstructor;
    type IntoIter = std::slice::Iter<'a, ResolvedConstructor>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// All constructors applicable to `args`, in candidate order.
///
/// With `allow_incomplete` every candidate is returned unchecked. Named-only calls
/// prefer a constructor taking a single map parameter, then a no-argument
/// constructor, and otherwise pass the named arguments as one map argument.
pub fn filter_applicable(
    env: &dyn TypeEnv,
    types: &dyn TypeSystem,
    candidates: &[ConstructorCandidate],
    args: &CallArguments,
    allow_incomplete: bool,
    options: &ResolveOptions,
) -> ResolutionResult {
    if candidates.is_empty() {
        return ResolutionResult::default();
    }
    if allow_incomplete {
        return ResolutionResult::unchecked(candidates);
    }

    let filter = Filter {
        env,
        types,
        options,
    };
    match args.shape() {
        ArgumentShape::Named => {
            let map_arg = Type::MapLiteral(args.map_literal());
            let with_map = filter.by_args(candidates, std::slice::from_ref(&map_arg));
            let map_param = with_map.iter().any(|resolved| {
                let params = &resolved.candidate.params;
                params.len() == 1 && types.is_map_like(&params[0].ty)
            });
            if map_param {
                tracing::trace!(target: "quill.resolve", "named arguments bound to a map parameter");
                return with_map;
            }

            let no_args = filter.by_args(candidates, &[]);
            if !no_args.is_empty() {
                tracing::trace!(target: "quill.resolve", "named arguments bound to properties");
                return no_args;
            }
            with_map
        }
        ArgumentShape::Mixed if options.named_args_as_leading_map => {
            let mut arg_types = Vec::with_capacity(args.positional.len() + 1);
            arg_types.push(Type::MapLiteral(args.map_literal()));
            arg_types.extend(args.positional.iter().cloned());
            filter.by_args(candidates, &arg_types)
        }
        _ => filter.by_args(candidates, &args.positional),
    }
}

/// The maximally specific results: those no other result is strictly more specific
/// than.
///
/// `a` is more specific than `b` when both line up the same number of parameters and
/// each of `a`'s is a subtype of the corresponding one of `b`.
pub fn most_specific(types: &dyn TypeSystem, results: &[ResolvedConstructor]) -> Vec<ResolvedConstructor> {
    results
        .iter()
        .enumerate()
        .filter(|(idx, candidate)| {
            !results.iter().enumerate().any(|(other_idx, other)| {
                other_idx != *idx
                    && is_more_specific(types, other, candidate)
                    && !is_more_specific(types, candidate, other)
            })
        })
        .map(|(_, resolved)| resolved.clone())
        .collect()
}

fn is_more_specific(types: &dyn TypeSystem, a: &ResolvedConstructor, b: &ResolvedConstructor) -> bool {
    a.call_params.len() == b.call_params.len()
        && a
            .call_params
            .iter()
            .zip(&b.call_params)
            .all(|(pa, pb)| types.is_subtype(pa, pb))
}

struct Filter<'a> {
    env: &'a dyn TypeEnv,
    types: &'a dyn TypeSystem,
    options: &'a ResolveOptions,
}

impl Filter<'_> {
    /// Fixed-arity phase first; variable-arity only when nothing applied.
    fn by_args(&self, candidates: &[ConstructorCandidate], args: &[Type]) -> ResolutionResult {
        let mut results = Vec::new();
        let mut failed = Vec::new();
        for candidate in candidates {
            match self.check(candidate, args, false) {
                Ok(resolved) => results.push(resolved),
                Err(reason) => failed.push((candidate, reason)),
            }
        }
        if !results.is_empty() || !self.options.varargs {
            return ResolutionResult {
                results,
                rejected: into_rejected(failed),
            };
        }

        let mut rejected = Vec::new();
        for (candidate, reason) in failed {
            if !candidate.is_varargs {
                rejected.push(RejectedCandidate {
                    candidate: candidate.clone(),
                    reason,
                });
                continue;
            }
            match self.check(candidate, args, true) {
                Ok(resolved) => results.push(resolved),
                Err(reason) => rejected.push(RejectedCandidate {
                    candidate: candidate.clone(),
                    reason,
                }),
            }
        }
        ResolutionResult { results, rejected }
    }

    fn check(
        &self,
        candidate: &ConstructorCandidate,
        args: &[Type],
        variable_arity: bool,
    ) -> Result<ResolvedConstructor, CandidateFailureReason> {
        let params = if variable_arity {
            variable_arity_params(candidate, args.len())
        } else {
            fixed_arity_params(candidate, args.len(), self.options)
        };
        let Some(params) = params else {
            return Err(CandidateFailureReason::WrongArity {
                min: candidate.min_arity(self.options),
                max: (!(candidate.is_varargs && self.options.varargs))
                    .then_some(candidate.arity()),
                found: args.len(),
            });
        };

        let inferred = self.infer_type_args(candidate, &params, args);
        let params: Vec<Type> = params
            .iter()
            .map(|param| self.instantiate(candidate, param, &inferred))
            .collect();
        for (arg_index, (param, arg)) in params.iter().zip(args).enumerate() {
            if !self.types.is_assignable(arg, param) {
                return Err(CandidateFailureReason::ArgumentConversion {
                    arg_index,
                    from: arg.clone(),
                    to: param.clone(),
                });
            }
        }

        let mut substitution = candidate.owner.substitution.clone();
        substitution.extend(&inferred);
        for var in &candidate.type_params {
            if inferred.get(*var).is_none() {
                substitution.insert(*var, erasure(self.env, &Type::TypeVar(*var)));
            }
        }
        Ok(ResolvedConstructor {
            candidate: candidate.clone(),
            substitution,
            call_params: params,
            applicability: if variable_arity {
                Applicability::ApplicableByVarargs
            } else {
                Applicability::Applicable
            },
        })
    }

    /// Infer a constructor's own type parameters by matching each argument against
    /// the structure of its parameter type. The first binding of a variable wins.
    fn infer_type_args(
        &self,
        candidate: &ConstructorCandidate,
        params: &[Type],
        args: &[Type],
    ) -> Substitution {
        let mut inferred = Substitution::new();
        if candidate.type_params.is_empty() {
            return inferred;
        }
        for (param, arg) in params.iter().zip(args) {
            self.infer_from(param, arg, &candidate.type_params, &mut inferred, 0);
        }
        inferred
    }

    fn infer_from(
        &self,
        param: &Type,
        arg: &Type,
        vars: &[TypeVarId],
        out: &mut Substitution,
        depth: usize,
    ) {
        if depth > MAX_INFERENCE_DEPTH {
            return;
        }
        let arg = wildcard_bound(arg);
        match param {
            Type::TypeVar(var) if vars.contains(var) => {
                let unusable = matches!(
                    arg,
                    Type::Null | Type::Unknown | Type::Error | Type::Wildcard(_)
                );
                if !unusable && out.get(*var).is_none() {
                    out.insert(*var, boxed_type(self.env, arg));
                }
            }
            Type::Array(elem) => {
                if let Type::Array(arg_elem) = arg {
                    self.infer_from(elem, arg_elem, vars, out, depth + 1);
                }
            }
            Type::Wildcard(WildcardBound::Extends(bound) | WildcardBound::Super(bound)) => {
                self.infer_from(bound, arg, vars, out, depth + 1);
            }
            Type::Class(ClassType { def, args: formals }) if !formals.is_empty() => {
                let view = instantiate_as_supertype(self.env, &boxed_type(self.env, arg), *def);
                let Some(Type::Class(ClassType { args: actuals, .. })) = view else {
                    return;
                };
                for (formal, actual) in formals.iter().zip(&actuals) {
                    self.infer_from(formal, actual, vars, out, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// `param` with inferred constructor type arguments; a parameter mentioning a
    /// variable that could not be inferred is erased as a whole.
    fn instantiate(&self, candidate: &ConstructorCandidate, param: &Type, inferred: &Substitution) -> Type {
        let uninferred = candidate
            .type_params
            .iter()
            .any(|var| inferred.get(*var).is_none() && mentions_var(param, *var));
        if uninferred {
            erasure(self.env, param)
        } else {
            substitute(param, inferred)
        }
    }
}

const MAX_INFERENCE_DEPTH: usize = 16;

fn wildcard_bound(ty: &Type) -> &Type {
    match ty {
        Type::Wildcard(WildcardBound::Extends(bound) | WildcardBound::Super(bound)) => bound.as_ref(),
        other => other,
    }
}

fn mentions_var(ty: &Type, var: TypeVarId) -> bool {
    match ty {
        Type::TypeVar(id) => *id == var,
        Type::Class(ClassType { args, .. }) => args.iter().any(|arg| mentions_var(arg, var)),
        Type::Array(elem) => mentions_var(elem, var),
        Type::Wildcard(WildcardBound::Extends(bound) | WildcardBound::Super(bound)) => {
            mentions_var(bound, var)
        }
        _ => false,
    }
}

fn into_rejected(failed: Vec<(&ConstructorCandidate, CandidateFailureReason)>) -> Vec<RejectedCandidate> {
    failed
        .into_iter()
        .map(|(candidate, reason)| RejectedCandidate {
            candidate: candidate.clone(),
            reason,
        })
        .collect()
}

/// Parameter types for a fixed-arity call with `count` arguments, omitting default
/// parameters from the right when there are fewer arguments than parameters.
fn fixed_arity_params(
    candidate: &ConstructorCandidate,
    count: usize,
    options: &ResolveOptions,
) -> Option<Vec<Type>> {
    let params = &candidate.params;
    if count == params.len() {
        return Some(candidate.param_types());
    }
    if count > params.len() || !options.default_params {
        return None;
    }

    let mut to_omit = params.len() - count;
    let mut keep = vec![true; params.len()];
    for (idx, param) in params.iter().enumerate().rev() {
        if to_omit == 0 {
            break;
        }
        if param.has_default {
            keep[idx] = false;
            to_omit -= 1;
        }
    }
    if to_omit != 0 {
        return None;
    }
    Some(
        params
            .iter()
            .zip(keep)
            .filter(|(_, keep)| *keep)
            .map(|(param, _)| param.ty.clone())
            .collect(),
    )
}

/// Parameter types for a variable-arity call with `count` arguments: the trailing array
/// parameter is expanded to its element type.
fn variable_arity_params(candidate: &ConstructorCandidate, count: usize) -> Option<Vec<Type>> {
    let (last, fixed) = candidate.params.split_last()?;
    let Type::Array(elem) = &last.ty else {
        return None;
    };
    if count < fixed.len() {
        return None;
    }
    let mut out: Vec<Type> = fixed.iter().map(|p| p.ty.clone()).collect();
    out.extend(std::iter::repeat((**elem).clone()).take(count - fixed.len()));
    Some(out)
}
