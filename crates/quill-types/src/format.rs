//! Groovy-like, stable rendering of [`Type`]s for diagnostics and CLI output.

use crate::{simple_name, ClassType, Type, TypeEnv, WildcardBound};

/// Render `ty` using simple class names (`Map<String, Integer>`).
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, false, &mut out);
    out
}

/// Render `ty` using binary class names (`java.util.Map<java.lang.String, ...>`).
pub fn format_type_qualified(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, true, &mut out);
    out
}

fn write_type(env: &dyn TypeEnv, ty: &Type, qualified: bool, out: &mut String) {
    match ty {
        Type::Void => out.push_str("void"),
        Type::Primitive(prim) => out.push_str(prim.keyword()),
        Type::Class(ClassType { def, args }) => {
            match env.class(*def) {
                Some(class) if qualified => out.push_str(&class.name),
                Some(class) => out.push_str(class.simple_name()),
                None => out.push_str(&format!("<class#{}>", def.to_raw())),
            }
            write_args(env, args, qualified, out);
        }
        Type::Array(elem) => {
            write_type(env, elem, qualified, out);
            out.push_str("[]");
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(tp) => out.push_str(&tp.name),
            None => out.push_str(&format!("<T#{}>", id.to_raw())),
        },
        Type::Wildcard(WildcardBound::Unbounded) => out.push('?'),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            out.push_str("? extends ");
            write_type(env, upper, qualified, out);
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            out.push_str("? super ");
            write_type(env, lower, qualified, out);
        }
        Type::Null => out.push_str("null"),
        Type::Named(name) if qualified => out.push_str(name),
        Type::Named(name) => out.push_str(simple_name(name)),
        Type::MapLiteral(lit) => {
            if lit.is_empty() {
                out.push_str("[:]");
                return;
            }
            out.push('[');
            for (idx, (key, value)) in lit.entries.iter().enumerate() {
                if idx != 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_type(env, value, qualified, out);
            }
            out.push(']');
        }
        Type::Unknown => out.push_str("<unknown>"),
        Type::Error => out.push_str("<error>"),
    }
}

fn write_args(env: &dyn TypeEnv, args: &[Type], qualified: bool, out: &mut String) {
    if args.is_empty() {
        return;
    }
    out.push('<');
    for (idx, arg) in args.iter().enumerate() {
        if idx != 0 {
            out.push_str(", ");
        }
        write_type(env, arg, qualified, out);
    }
    out.push('>');
}
