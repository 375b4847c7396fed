use std::collections::{HashSet, VecDeque};

use crate::{
    canonicalize_named, substitute, ClassId, ClassKind, ClassType, MapLiteralType, PrimitiveType,
    Substitution, Type, TypeEnv, TypeVarId, WildcardBound,
};

/// Type relations consumed by constructor resolution.
///
/// Resolution only ever asks these three questions, so alternative type
/// systems (tests, other language front ends) can plug in here instead of
/// providing a full [`TypeEnv`].
pub trait TypeSystem {
    /// Whether a value of type `from` can be passed where `to` is expected.
    fn is_assignable(&self, from: &Type, to: &Type) -> bool;

    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool;

    /// Whether `ty` is `java.util.Map` or one of its subtypes.
    fn is_map_like(&self, ty: &Type) -> bool;
}

/// Java/Groovy rules over a [`TypeEnv`].
#[derive(Clone, Copy)]
pub struct JavaTypeSystem<'env> {
    env: &'env dyn TypeEnv,
}

impl<'env> JavaTypeSystem<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }
}

impl TypeSystem for JavaTypeSystem<'_> {
    fn is_assignable(&self, from: &Type, to: &Type) -> bool {
        is_assignable(self.env, from, to)
    }

    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        is_subtype(self.env, sub, sup)
    }

    fn is_map_like(&self, ty: &Type) -> bool {
        is_map_like(self.env, ty)
    }
}

/// Return `ty` viewed as `target` by walking the supertype graph and applying type argument
/// substitution along the way.
///
/// Missing class metadata simply returns `None`.
///
/// Example: `LinkedHashMap<String, Integer>` instantiated as `Map` returns `Map<String, Integer>`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<Type> {
        match ty {
            Type::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(Type::class(target, vec![]));
                }
                return None;
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let found = env.type_param(*id).and_then(|tp| {
                    tp.upper_bounds
                        .iter()
                        .find_map(|bound| inner(env, bound, target, seen_type_vars))
                });
                seen_type_vars.remove(id);
                return found;
            }
            Type::MapLiteral(lit) => {
                return inner(env, &map_literal_view(env, lit), target, seen_type_vars);
            }
            _ => {}
        }

        let ty = canonicalize_named(env, ty);
        let Type::Class(ClassType { def, args }) = ty else {
            return None;
        };

        let mut queue: VecDeque<Type> = VecDeque::new();
        let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
        queue.push_back(Type::class(def, args));

        while let Some(current) = queue.pop_front() {
            let Type::Class(ClassType { def, args }) = current.clone() else {
                continue;
            };
            if !seen.insert((def, args.clone())) {
                continue;
            }

            if def == target {
                return Some(current);
            }

            let Some(class_def) = env.class(def) else {
                continue;
            };

            // A raw instantiation has no type arguments to push into its supertypes.
            let raw = args.is_empty() && !class_def.type_params.is_empty();
            let subst: Substitution = if raw {
                Substitution::new()
            } else {
                class_def
                    .type_params
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(idx, formal)| (formal, args.get(idx).cloned().unwrap_or(Type::Unknown)))
                    .collect()
            };
            let lift = |super_ty: &Type| -> Option<Type> {
                let super_ty = canonicalize_named(env, &substitute(super_ty, &subst));
                let def = super_ty.class_id()?;
                if raw {
                    Some(Type::class(def, vec![]))
                } else {
                    Some(super_ty)
                }
            };

            if let Some(sc) = class_def.super_class.as_ref().and_then(|sc| lift(sc)) {
                queue.push_back(sc);
            }
            for iface in class_def.interfaces.iter().filter_map(|iface| lift(iface)) {
                queue.push_back(iface);
            }

            // Every interface implicitly has `Object` as a supertype (JLS 4.10.2).
            if class_def.kind == ClassKind::Interface {
                queue.push_back(Type::class(env.well_known().object, vec![]));
            }
        }

        None
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

/// Nominal view of a named-argument map: `LinkedHashMap<String, V>` where `V` is the
/// common value type, or `Object` when the values disagree.
pub fn map_literal_view(env: &dyn TypeEnv, lit: &MapLiteralType) -> Type {
    let wk = env.well_known();
    let object = Type::class(wk.object, vec![]);
    let mut values = lit.entries.iter().map(|(_, ty)| boxed_type(env, ty));
    let value = match values.next() {
        Some(first) if values.all(|ty| ty == first) && !first.is_errorish() => first,
        _ => object,
    };
    Type::class(
        wk.linked_hash_map,
        vec![Type::class(wk.string, vec![]), value],
    )
}

/// Box primitives; every other type is returned unchanged.
pub fn boxed_type(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Primitive(prim) => Type::class(env.well_known().boxed(*prim), vec![]),
        other => other.clone(),
    }
}

/// The primitive a wrapper class unboxes to (JLS 5.1.8).
pub fn unboxed_primitive(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    match canonicalize_named(env, ty) {
        Type::Primitive(prim) => Some(prim),
        Type::Class(ClassType { def, .. }) => env.well_known().unboxed(def),
        _ => None,
    }
}

pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    is_subtype_inner(env, sub, sup, 0)
}

const MAX_SUBTYPE_DEPTH: usize = 32;

fn is_subtype_inner(env: &dyn TypeEnv, sub: &Type, sup: &Type, depth: usize) -> bool {
    if sub == sup {
        return true;
    }
    if depth > MAX_SUBTYPE_DEPTH {
        return false;
    }
    let depth = depth + 1;

    match (sub, sup) {
        (Type::Unknown | Type::Error, _) | (_, Type::Unknown | Type::Error) => true,
        (Type::Void, _) | (_, Type::Void) => false,
        (Type::Null, other) => other.is_reference(),
        (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(*b),
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
        (Type::Named(_), _) | (_, Type::Named(_)) => {
            let sub_c = canonicalize_named(env, sub);
            let sup_c = canonicalize_named(env, sup);
            if matches!(sub_c, Type::Named(_)) || matches!(sup_c, Type::Named(_)) {
                // Unresolved names only relate to themselves.
                return false;
            }
            is_subtype_inner(env, &sub_c, &sup_c, depth)
        }
        (Type::TypeVar(id), _) => {
            let bounds = env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.as_slice())
                .unwrap_or_default();
            if bounds.is_empty() {
                let object = Type::class(env.well_known().object, vec![]);
                return is_subtype_inner(env, &object, sup, depth);
            }
            bounds
                .iter()
                .any(|bound| is_subtype_inner(env, bound, sup, depth))
        }
        (_, Type::TypeVar(_)) => false,
        (Type::MapLiteral(lit), _) => {
            is_subtype_inner(env, &map_literal_view(env, lit), sup, depth)
                || map_literal_fits(env, lit, sup, depth)
        }
        (Type::Wildcard(bound), _) => match bound {
            WildcardBound::Extends(upper) => is_subtype_inner(env, upper, sup, depth),
            _ => {
                let object = Type::class(env.well_known().object, vec![]);
                is_subtype_inner(env, &object, sup, depth)
            }
        },
        (_, Type::Wildcard(_)) => type_arg_contains(env, sup, sub, depth),
        (Type::Array(a), Type::Array(b)) => match (a.as_ref(), b.as_ref()) {
            (Type::Primitive(x), Type::Primitive(y)) => x == y,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (a, b) => is_subtype_inner(env, a, b, depth),
        },
        (Type::Array(_), Type::Class(ClassType { def, .. })) => {
            let wk = env.well_known();
            *def == wk.object || *def == wk.cloneable || *def == wk.serializable
        }
        (Type::Class(_), Type::Class(ClassType { def, args })) => {
            let Some(view) = instantiate_as_supertype(env, sub, *def) else {
                return false;
            };
            if args.is_empty() {
                return true;
            }
            let Type::Class(ClassType {
                args: view_args, ..
            }) = view
            else {
                return false;
            };
            // Raw-to-parameterized is an unchecked conversion; accept it.
            if view_args.is_empty() {
                return true;
            }
            view_args.len() == args.len()
                && args
                    .iter()
                    .zip(&view_args)
                    .all(|(formal, actual)| type_arg_contains(env, formal, actual, depth))
        }
        _ => false,
    }
}

/// A literal map can target any `Map<K, V>` supertype of `LinkedHashMap` whose `K`
/// accepts `String` and whose `V` accepts every entry value.
fn map_literal_fits(env: &dyn TypeEnv, lit: &MapLiteralType, sup: &Type, depth: usize) -> bool {
    let Type::Class(ClassType { def, args }) = sup else {
        return false;
    };
    let wk = env.well_known();
    if args.len() != 2
        || instantiate_as_supertype(env, &Type::class(wk.linked_hash_map, vec![]), *def).is_none()
    {
        return false;
    }
    let accepts = |formal: &Type, actual: &Type| match formal {
        Type::Wildcard(_) => type_arg_contains(env, formal, actual, depth),
        _ => is_subtype_inner(env, actual, formal, depth),
    };
    accepts(&args[0], &Type::class(wk.string, vec![]))
        && lit
            .entries
            .iter()
            .all(|(_, value)| accepts(&args[1], &boxed_type(env, value)))
}

/// Type argument containment (JLS 4.5.1): does `outer` contain `inner`?
fn type_arg_contains(env: &dyn TypeEnv, outer: &Type, inner: &Type, depth: usize) -> bool {
    if outer == inner || outer.is_errorish() || inner.is_errorish() {
        return true;
    }
    let is_object = |ty: &Type| {
        matches!(canonicalize_named(env, ty), Type::Class(ClassType { def, .. }) if def == env.well_known().object)
    };

    match outer {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => match inner {
            Type::Wildcard(WildcardBound::Extends(i)) => is_subtype_inner(env, i, upper, depth),
            Type::Wildcard(_) => is_object(upper),
            t => is_subtype_inner(env, t, upper, depth),
        },
        Type::Wildcard(WildcardBound::Super(lower)) => match inner {
            Type::Wildcard(WildcardBound::Super(i)) => is_subtype_inner(env, lower, i, depth),
            Type::Wildcard(_) => false,
            t => is_subtype_inner(env, lower, t, depth),
        },
        _ => canonicalize_named(env, outer) == canonicalize_named(env, inner),
    }
}

/// Loose invocation context (JLS 5.3): subtyping, primitive widening, and boxing or
/// unboxing followed by widening.
pub fn is_assignable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if is_subtype(env, from, to) {
        return true;
    }
    match (from, to) {
        (Type::Primitive(_), _) => is_subtype(env, &boxed_type(env, from), to),
        (_, Type::Primitive(target)) => {
            unboxed_primitive(env, from).is_some_and(|prim| prim.widens_to(*target))
        }
        _ => false,
    }
}

/// Whether `ty` is `java.util.Map` or inherits from it.
pub fn is_map_like(env: &dyn TypeEnv, ty: &Type) -> bool {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen_type_vars: &mut HashSet<TypeVarId>) -> bool {
        let map = env.well_known().map;
        match canonicalize_named(env, ty) {
            Type::MapLiteral(_) => true,
            Type::Class(ClassType { def, .. }) => {
                instantiate_as_supertype(env, &Type::class(def, vec![]), map).is_some()
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(id) {
                    return false;
                }
                env.type_param(id).is_some_and(|tp| {
                    tp.upper_bounds
                        .iter()
                        .any(|bound| inner(env, bound, seen_type_vars))
                })
            }
            _ => false,
        }
    }

    inner(env, ty, &mut HashSet::new())
}
